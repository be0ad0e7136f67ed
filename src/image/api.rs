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

//! Foundation bits exposing the Image API.

use std::fmt::Debug;

use serde::Serialize;

use super::super::service::IMAGE;
use super::super::session::Session;
use super::super::utils;
use super::super::{ErrorKind, Result};
use super::protocol::*;

/// Create an image record (without data).
pub fn create_image(session: &Session, request: ImageCreate) -> Result<Image> {
    debug!("Creating an image with {:?}", request);
    let image: Image = session
        .post(IMAGE, &["images"])?
        .json(&request)
        .expect_status(201)
        .fetch()?;
    debug!("Created image {:?}", image);
    Ok(image)
}

/// Upload image data.
pub fn upload_image_data<S: AsRef<str>>(session: &Session, id: S, data: Vec<u8>) -> Result<()> {
    debug!("Uploading {} bytes into image {}", data.len(), id.as_ref());
    let _ = session
        .put(IMAGE, &["images", id.as_ref(), "file"])?
        .header("Content-Type", "application/octet-stream")
        .body(data)
        .expect_status(204)
        .send()?;
    Ok(())
}

/// Run an action (`deactivate` or `reactivate`) on an image.
pub fn image_action<S: AsRef<str>>(session: &Session, id: S, action: &str) -> Result<()> {
    trace!("Running {} on image {}", action, id.as_ref());
    let _ = session
        .post(IMAGE, &["images", id.as_ref(), "actions", action])?
        .expect_status(204)
        .send()?;
    debug!("Successfully ran {} on image {}", action, id.as_ref());
    Ok(())
}

/// Delete an image.
pub fn delete_image<S: AsRef<str>>(session: &Session, id: S) -> Result<()> {
    trace!("Deleting image {}", id.as_ref());
    let _ = session
        .delete(IMAGE, &["images", id.as_ref()])?
        .expect_status(204)
        .send()?;
    debug!("Successfully requested deletion of image {}", id.as_ref());
    Ok(())
}

/// Get an image.
pub fn get_image<S: AsRef<str>>(session: &Session, id_or_name: S) -> Result<Image> {
    let s = id_or_name.as_ref();
    match get_image_by_id(session, s) {
        Ok(value) => Ok(value),
        Err(err) if err.kind() == ErrorKind::ResourceNotFound => get_image_by_name(session, s),
        Err(err) => Err(err),
    }
}

/// Get an image by its ID.
pub fn get_image_by_id<S: AsRef<str>>(session: &Session, id: S) -> Result<Image> {
    trace!("Fetching image {}", id.as_ref());
    let image: Image = session.get(IMAGE, &["images", id.as_ref()])?.fetch()?;
    trace!("Received {:?}", image);
    Ok(image)
}

/// Get an image by its name.
pub fn get_image_by_name<S: AsRef<str>>(session: &Session, name: S) -> Result<Image> {
    trace!("Get image by name {}", name.as_ref());
    let root: ImagesRoot = session
        .get(IMAGE, &["images"])?
        .query(&[("name", name.as_ref())])
        .fetch()?;
    let result = utils::one(
        root.images,
        "Image with given name or ID not found",
        "Too many images found with given name",
    )?;
    trace!("Received {:?}", result);
    Ok(result)
}

/// List images.
pub fn list_images<Q: Serialize + Debug>(session: &Session, query: &Q) -> Result<Vec<Image>> {
    trace!("Listing images with {:?}", query);
    let root: ImagesRoot = session.get(IMAGE, &["images"])?.query(query).fetch()?;
    trace!("Received images: {:?}", root.images);
    Ok(root.images)
}
