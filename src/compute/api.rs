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

//! Foundation bits exposing the Compute API.

use std::fmt::Debug;

use reqwest::header::LOCATION;
use serde::Serialize;

use super::super::service::COMPUTE;
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::protocol::*;

/// Create a server, returns its ID.
pub fn create_server(session: &Session, request: ServerCreate) -> Result<String> {
    debug!("Creating a server with {:?}", request);
    let body = ServerCreateRoot { server: request };
    let root: ServerCreatedRoot = session
        .post(COMPUTE, &["servers"])?
        .json(&body)
        .expect_status(202)
        .fetch()?;
    debug!("Requested server {}", root.server.id);
    Ok(root.server.id)
}

/// Delete a server.
pub fn delete_server<S: AsRef<str>>(session: &Session, id: S) -> Result<()> {
    trace!("Deleting server {}", id.as_ref());
    let _ = session
        .delete(COMPUTE, &["servers", id.as_ref()])?
        .expect_status(204)
        .send()?;
    debug!("Successfully requested deletion of server {}", id.as_ref());
    Ok(())
}

/// Get a server by its ID.
pub fn get_server<S: AsRef<str>>(session: &Session, id: S) -> Result<Server> {
    trace!("Fetching server {}", id.as_ref());
    let root: ServerRoot = session.get(COMPUTE, &["servers", id.as_ref()])?.fetch()?;
    trace!("Received {:?}", root.server);
    Ok(root.server)
}

/// List servers with details.
pub fn list_servers<Q: Serialize + Debug>(session: &Session, query: &Q) -> Result<Vec<Server>> {
    trace!("Listing servers with {:?}", query);
    let root: ServersRoot = session
        .get(COMPUTE, &["servers", "detail"])?
        .query(query)
        .fetch()?;
    trace!("Received servers: {:?}", root.servers);
    Ok(root.servers)
}

/// Run an action on a server.
pub fn server_action<S, Q>(session: &Session, id: S, action: &Q) -> Result<()>
where
    S: AsRef<str>,
    Q: Serialize + Debug,
{
    trace!("Running {:?} on server {}", action, id.as_ref());
    let _ = session
        .post(COMPUTE, &["servers", id.as_ref(), "action"])?
        .json(action)
        .send()?;
    debug!("Successfully ran {:?} on server {}", action, id.as_ref());
    Ok(())
}

/// Snapshot a server into an image, returns the image ID.
pub fn create_image<S: AsRef<str>>(
    session: &Session,
    id: S,
    request: CreateImage,
) -> Result<String> {
    debug!("Creating an image of server {} with {:?}", id.as_ref(), request);
    let body = CreateImageRoot {
        createImage: request,
    };
    let response = session
        .post(COMPUTE, &["servers", id.as_ref(), "action"])?
        .json(&body)
        .expect_status(202)
        .send()?;

    // Microversion 2.45 returns the ID in the body, older ones only in Location.
    let image_id = if !response.body().is_empty() {
        response.json::<CreateImageResponse>()?.image_id
    } else {
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim_end_matches('/').rsplit('/').next())
            .filter(|value| !value.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidResponse,
                    "createImage response contains neither an image ID nor a Location",
                )
            })?
    };
    debug!("Server {} is being snapshotted into image {}", id.as_ref(), image_id);
    Ok(image_id)
}

/// Get an image by its ID.
pub fn get_image<S: AsRef<str>>(session: &Session, id: S) -> Result<Image> {
    trace!("Fetching image {}", id.as_ref());
    let root: ImageRoot = session.get(COMPUTE, &["images", id.as_ref()])?.fetch()?;
    trace!("Received {:?}", root.image);
    Ok(root.image)
}

/// Delete an image.
pub fn delete_image<S: AsRef<str>>(session: &Session, id: S) -> Result<()> {
    trace!("Deleting image {}", id.as_ref());
    let _ = session
        .delete(COMPUTE, &["images", id.as_ref()])?
        .expect_status(204)
        .send()?;
    debug!("Successfully requested deletion of image {}", id.as_ref());
    Ok(())
}
