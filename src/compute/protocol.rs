// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! JSON structures and protocol bits for the Compute API.

#![allow(non_snake_case)]
#![allow(missing_docs)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Address of a server.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerAddress {
    pub addr: String,
    #[serde(default)]
    pub version: Option<u8>,
    #[serde(rename = "OS-EXT-IPS:type", default)]
    pub addr_type: Option<String>,
}

/// Fault information of a failed server.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerFault {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// A server.
#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(rename = "OS-EXT-STS:task_state", default)]
    pub task_state: Option<String>,
    #[serde(rename = "OS-EXT-STS:vm_state", default)]
    pub vm_state: Option<String>,
    #[serde(rename = "OS-EXT-STS:power_state", default)]
    pub power_state: Option<u8>,
    #[serde(default)]
    pub addresses: HashMap<String, Vec<ServerAddress>>,
    #[serde(default)]
    pub accessIPv4: Option<String>,
    #[serde(default)]
    pub accessIPv6: Option<String>,
    #[serde(default)]
    pub fault: Option<ServerFault>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerRoot {
    pub server: Server,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServersRoot {
    pub servers: Vec<Server>,
}

/// A network to attach a new server to.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ServerNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ip: Option<String>,
}

/// Networks argument of a server create request.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ServerNetworks {
    /// Explicit list of networks.
    Explicit(Vec<ServerNetwork>),
    /// `auto` or `none` (microversion 2.37 and newer).
    Policy(String),
}

/// Server arguments for a create request.
#[derive(Clone, Debug, Serialize)]
pub struct ServerCreate {
    pub name: String,
    #[serde(rename = "imageRef")]
    pub image_id: String,
    #[serde(rename = "flavorRef")]
    pub flavor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<ServerNetworks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServerCreateRoot {
    pub server: ServerCreate,
}

/// What the API returns when a server is requested.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerCreated {
    pub id: String,
    #[serde(default)]
    pub adminPass: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerCreatedRoot {
    pub server: ServerCreated,
}

/// Arguments of the `createImage` action.
#[derive(Clone, Debug, Serialize)]
pub struct CreateImage {
    pub name: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateImageRoot {
    pub createImage: CreateImage,
}

/// Response to `createImage` on microversion 2.45 and newer.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateImageResponse {
    pub image_id: String,
}

/// An image as seen by the Compute API.
#[derive(Clone, Debug, Deserialize)]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub minDisk: Option<u64>,
    #[serde(default)]
    pub minRam: Option<u64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImageRoot {
    pub image: Image,
}

#[cfg(test)]
pub mod test {
    #![allow(missing_docs)]

    use std::collections::HashMap;

    use super::{ServerCreate, ServerCreateRoot, ServerNetworks, ServerRoot};

    #[test]
    fn test_server_create_auto_network() {
        let body = ServerCreateRoot {
            server: ServerCreate {
                name: "test".into(),
                image_id: "img".into(),
                flavor_id: "1".into(),
                networks: Some(ServerNetworks::Policy("auto".into())),
                key_name: None,
                availability_zone: None,
                metadata: HashMap::new(),
            },
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({"server": {
                "name": "test", "imageRef": "img", "flavorRef": "1", "networks": "auto"
            }})
        );
    }

    #[test]
    fn test_server_with_fault() {
        let root: ServerRoot = serde_json::from_value(serde_json::json!({"server": {
            "id": "srv-1",
            "name": "test",
            "status": "ERROR",
            "OS-EXT-STS:task_state": null,
            "fault": {"code": 500, "message": "No valid host was found."},
        }}))
        .unwrap();
        assert_eq!(root.server.status, "ERROR");
        assert_eq!(root.server.fault.unwrap().message, "No valid host was found.");
    }
}
