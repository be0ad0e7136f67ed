// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
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

//! JSON structures and protocol bits for the Network API.

#![allow(missing_docs)]

use std::net;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

/// Treat empty strings as missing values.
pub fn empty_as_none<'de, D>(des: D) -> ::std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Deserialize::deserialize(des)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// A network.
#[derive(Debug, Clone, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(deserialize_with = "empty_as_none", default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(rename = "router:external", default)]
    pub external: Option<bool>,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<FixedOffset>>,
}

/// A subnet. Subnets have no status.
#[derive(Debug, Clone, Deserialize)]
pub struct Subnet {
    pub id: String,
    #[serde(deserialize_with = "empty_as_none", default)]
    pub name: Option<String>,
    pub network_id: String,
    pub cidr: String,
    pub ip_version: u8,
    #[serde(default)]
    pub gateway_ip: Option<net::IpAddr>,
    #[serde(default)]
    pub enable_dhcp: bool,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// A port's IP address.
#[derive(Debug, Clone, Deserialize)]
pub struct PortIpAddress {
    pub ip_address: net::IpAddr,
    pub subnet_id: String,
}

/// A port.
#[derive(Debug, Clone, Deserialize)]
pub struct Port {
    pub id: String,
    #[serde(deserialize_with = "empty_as_none", default)]
    pub name: Option<String>,
    pub network_id: String,
    pub status: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub fixed_ips: Vec<PortIpAddress>,
    #[serde(deserialize_with = "empty_as_none", default)]
    pub device_id: Option<String>,
    #[serde(deserialize_with = "empty_as_none", default)]
    pub device_owner: Option<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
}

/// External gateway of a router.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalGatewayInfo {
    pub network_id: String,
    #[serde(default)]
    pub enable_snat: Option<bool>,
}

/// A router.
#[derive(Debug, Clone, Deserialize)]
pub struct Router {
    pub id: String,
    #[serde(deserialize_with = "empty_as_none", default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default)]
    pub external_gateway_info: Option<ExternalGatewayInfo>,
}

/// A floating IP.
#[derive(Debug, Clone, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    pub status: String,
    pub floating_ip_address: Option<net::IpAddr>,
    pub floating_network_id: String,
    #[serde(default)]
    pub fixed_ip_address: Option<net::IpAddr>,
    #[serde(default)]
    pub port_id: Option<String>,
    #[serde(default)]
    pub router_id: Option<String>,
}
