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

//! Image management via Image API.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, FixedOffset};

use super::super::service::IMAGE;
use super::super::session::Session;
use super::super::utils::IntoId;
use super::super::waiter::{self, DeletionWaiter, StatusRequest, StatusWaiter};
use super::super::Result;
use super::{api, protocol};

/// Image statuses that fail a wait immediately.
pub const IMAGE_FAILURE_STATUSES: [&str; 1] = ["killed"];

/// Structure representing a single image.
#[derive(Clone, Debug)]
pub struct Image {
    session: Session,
    inner: protocol::Image,
}

/// A request to create an image.
#[derive(Clone, Debug)]
pub struct NewImage {
    session: Session,
    inner: protocol::ImageCreate,
}

impl Display for Image {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "image {} ({})", self.inner.id, self.inner.status)
    }
}

impl Image {
    /// Load an image by its ID or name.
    pub fn new<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Image> {
        let inner = api::get_image(session, id)?;
        Ok(Image {
            session: session.clone(),
            inner,
        })
    }

    transparent_property! {
        #[doc = "Unique ID."]
        id: ref String
    }

    transparent_property! {
        #[doc = "Image name."]
        name: ref Option<String>
    }

    transparent_property! {
        #[doc = "Image status as of the last refresh."]
        status: ref String
    }

    transparent_property! {
        #[doc = "Image size in bytes (if known)."]
        size: Option<u64>
    }

    transparent_property! {
        #[doc = "Image checksum (if the data was uploaded)."]
        checksum: ref Option<String>
    }

    transparent_property! {
        #[doc = "Image visibility."]
        visibility: ref Option<String>
    }

    transparent_property! {
        #[doc = "Creation date and time."]
        created_at: Option<DateTime<FixedOffset>>
    }

    /// Upload image data.
    ///
    /// The image goes through `saving` to `active` afterwards.
    pub fn upload(&self, data: Vec<u8>) -> Result<()> {
        api::upload_image_data(&self.session, &self.inner.id, data)
    }

    /// Deactivate the image.
    pub fn deactivate(&self) -> Result<()> {
        api::image_action(&self.session, &self.inner.id, "deactivate")
    }

    /// Reactivate a deactivated image.
    pub fn reactivate(&self) -> Result<()> {
        api::image_action(&self.session, &self.inner.id, "reactivate")
    }

    /// Wait for the image to reach the status.
    ///
    /// Fails immediately if the image is `killed`.
    pub fn wait_for_status(
        &mut self,
        target: &str,
    ) -> StatusWaiter<impl FnMut() -> Result<String> + '_> {
        let policy = self.session.wait_policy(IMAGE);
        waiter::resource_waiter(self, target, &IMAGE_FAILURE_STATUSES, policy)
    }

    /// Delete the image.
    pub fn delete(self) -> Result<DeletionWaiter<Image>> {
        api::delete_image(&self.session, &self.inner.id)?;
        let policy = self.session.wait_policy(IMAGE);
        Ok(DeletionWaiter::new(self, policy))
    }
}

status_resource!(Image, "image", api::get_image_by_id);

impl NewImage {
    /// Start creating an image.
    pub fn new<S: Into<String>>(session: &Session, name: S) -> NewImage {
        NewImage {
            session: session.clone(),
            inner: protocol::ImageCreate {
                name: Some(name.into()),
                ..Default::default()
            },
        }
    }

    /// Request creation of the image record.
    pub fn create(self) -> Result<Image> {
        let inner = api::create_image(&self.session, self.inner)?;
        Ok(Image {
            session: self.session,
            inner,
        })
    }

    /// Add a tag.
    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.inner.tags.push(tag.into());
        self
    }

    creation_inner_field! {
        #[doc = "Set the container format (e.g. `bare`)."]
        set_container_format, with_container_format -> container_format: optional String
    }

    creation_inner_field! {
        #[doc = "Set the disk format (e.g. `qcow2`)."]
        set_disk_format, with_disk_format -> disk_format: optional String
    }

    creation_inner_field! {
        #[doc = "Set the visibility."]
        set_visibility, with_visibility -> visibility: optional String
    }

    creation_inner_field! {
        #[doc = "Set the minimum disk size in GiB."]
        set_min_disk, with_min_disk -> min_disk: optional u64
    }

    creation_inner_field! {
        #[doc = "Set the minimum RAM in MiB."]
        set_min_ram, with_min_ram -> min_ram: optional u64
    }

    creation_inner_field! {
        #[doc = "Set whether the image is protected from deletion."]
        set_protected, with_protected -> protected: optional bool
    }
}

/// Wait for an image to reach the status.
pub fn wait_for_image_status<Id: IntoId>(
    session: &Session,
    id: Id,
    target: &str,
) -> Result<String> {
    let id = id.into_id();
    let request = StatusRequest::new("image", id.as_str(), target)
        .with_failure_statuses(IMAGE_FAILURE_STATUSES)
        .with_policy(session.wait_policy(IMAGE));
    waiter::wait_for_status(request, || {
        api::get_image_by_id(session, &id).map(|i| i.status)
    })
}
