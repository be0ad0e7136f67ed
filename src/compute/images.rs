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

//! Images as exposed by the Compute API (server snapshots).

use super::super::service::COMPUTE;
use super::super::session::Session;
use super::super::utils::IntoId;
use super::super::waiter::{self, DeletionWaiter, StatusRequest, StatusWaiter};
use super::super::Result;
use super::{api, protocol};

/// Image statuses that fail a wait immediately.
pub const IMAGE_FAILURE_STATUSES: [&str; 1] = ["ERROR"];

/// An image, usually a server snapshot.
#[derive(Clone, Debug)]
pub struct Image {
    session: Session,
    inner: protocol::Image,
}

impl Image {
    /// Fetch an image by its ID.
    pub fn new<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Image> {
        let inner = api::get_image(session, id)?;
        Ok(Image {
            session: session.clone(),
            inner,
        })
    }

    transparent_property! {
        #[doc = "Image ID."]
        id: ref String
    }

    transparent_property! {
        #[doc = "Image name."]
        name: ref Option<String>
    }

    transparent_property! {
        #[doc = "Status as of the last refresh: SAVING, ACTIVE, ERROR or DELETED."]
        status: ref String
    }

    transparent_property! {
        #[doc = "Upload progress in percents."]
        progress: Option<u8>
    }

    /// Wait for the image to reach the status.
    pub fn wait_for_status(
        &mut self,
        target: &str,
    ) -> StatusWaiter<impl FnMut() -> Result<String> + '_> {
        let policy = self.session.wait_policy(COMPUTE);
        waiter::resource_waiter(self, target, &IMAGE_FAILURE_STATUSES, policy)
    }

    /// Delete the image.
    pub fn delete(self) -> Result<DeletionWaiter<Image>> {
        api::delete_image(&self.session, &self.inner.id)?;
        let policy = self.session.wait_policy(COMPUTE);
        Ok(DeletionWaiter::new(self, policy))
    }
}

status_resource!(Image, "image", api::get_image);

/// Wait for an image to reach the status.
pub fn wait_for_image_status<Id: IntoId>(
    session: &Session,
    id: Id,
    target: &str,
) -> Result<String> {
    let id = id.into_id();
    let request = StatusRequest::new("image", id.as_str(), target)
        .with_failure_statuses(IMAGE_FAILURE_STATUSES)
        .with_policy(session.wait_policy(COMPUTE));
    waiter::wait_for_status(request, || api::get_image(session, &id).map(|i| i.status))
}
