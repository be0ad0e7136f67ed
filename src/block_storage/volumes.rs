// Copyright 2023 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Volume management via Block Storage API.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use super::super::service::BLOCK_STORAGE;
use super::super::session::Session;
use super::super::utils::IntoId;
use super::super::waiter::{self, DeletionWaiter, StatusRequest, StatusWaiter};
use super::super::Result;
use super::{api, protocol};

/// Volume statuses that fail a wait immediately.
pub const VOLUME_FAILURE_STATUSES: [&str; 2] = ["error", "error_restoring"];

/// Volume statuses that fail waiting for deletion.
pub const VOLUME_DELETION_FAILURE_STATUSES: [&str; 1] = ["error_deleting"];

/// Structure representing a single volume.
#[derive(Clone, Debug)]
pub struct Volume {
    session: Session,
    inner: protocol::Volume,
}

/// A request to create a volume.
#[derive(Clone, Debug)]
pub struct NewVolume {
    session: Session,
    inner: protocol::VolumeCreate,
}

impl Display for Volume {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "volume {} ({})", self.inner.id, self.inner.status)
    }
}

impl Volume {
    /// Fetch a volume by its ID or name.
    pub fn new<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Volume> {
        let inner = api::get_volume(session, id)?;
        Ok(Volume {
            session: session.clone(),
            inner,
        })
    }

    transparent_property! {
        #[doc = "UUID of the volume."]
        id: ref String
    }

    transparent_property! {
        #[doc = "Name of the volume."]
        name: ref Option<String>
    }

    transparent_property! {
        #[doc = "Status of the volume as of the last refresh."]
        status: ref String
    }

    transparent_property! {
        #[doc = "Size of the volume in GiB."]
        size: u64
    }

    transparent_property! {
        #[doc = "Description of the volume."]
        description: ref Option<String>
    }

    transparent_property! {
        #[doc = "Volume attachments."]
        attachments: ref Vec<protocol::VolumeAttachment>
    }

    transparent_property! {
        #[doc = "Name of the availability zone."]
        availability_zone: ref Option<String>
    }

    transparent_property! {
        #[doc = "Metadata of the volume."]
        metadata: ref HashMap<String, String>
    }

    transparent_property! {
        #[doc = "UUID of the snapshot the volume originated from."]
        snapshot_id: ref Option<String>
    }

    transparent_property! {
        #[doc = "Name of the volume type."]
        volume_type: ref Option<String>
    }

    /// Wait for the volume to reach the status.
    ///
    /// Fails immediately on `error` and `error_restoring`.
    pub fn wait_for_status(
        &mut self,
        target: &str,
    ) -> StatusWaiter<impl FnMut() -> Result<String> + '_> {
        let policy = self.session.wait_policy(BLOCK_STORAGE);
        waiter::resource_waiter(self, target, &VOLUME_FAILURE_STATUSES, policy)
    }

    /// Delete the volume.
    pub fn delete(self) -> Result<DeletionWaiter<Volume>> {
        api::delete_volume(&self.session, &self.inner.id)?;
        let policy = self.session.wait_policy(BLOCK_STORAGE);
        Ok(DeletionWaiter::new(self, policy)
            .with_failure_statuses(VOLUME_DELETION_FAILURE_STATUSES))
    }
}

status_resource!(Volume, "volume", api::get_volume_by_id);

impl NewVolume {
    /// Start creating a volume of the given size in GiB.
    pub fn new(session: &Session, size: u64) -> NewVolume {
        NewVolume {
            session: session.clone(),
            inner: protocol::VolumeCreate::new(size),
        }
    }

    /// Request creation of the volume.
    ///
    /// Use `wait_for_status` on the result to wait for it to become available.
    pub fn create(self) -> Result<Volume> {
        let inner = api::create_volume(&self.session, self.inner)?;
        Ok(Volume {
            session: self.session,
            inner,
        })
    }

    creation_inner_field! {
        #[doc = "Set the name."]
        set_name, with_name -> name: optional String
    }

    creation_inner_field! {
        #[doc = "Set the description."]
        set_description, with_description -> description: optional String
    }

    creation_inner_field! {
        #[doc = "Set the availability zone."]
        set_availability_zone, with_availability_zone -> availability_zone: optional String
    }

    creation_inner_field! {
        #[doc = "Create from another volume."]
        set_source_volume_id, with_source_volume_id -> source_volume_id: optional String
    }

    creation_inner_field! {
        #[doc = "Create from a snapshot."]
        set_snapshot_id, with_snapshot_id -> snapshot_id: optional String
    }

    creation_inner_field! {
        #[doc = "Create from a backup."]
        set_backup_id, with_backup_id -> backup_id: optional String
    }

    creation_inner_field! {
        #[doc = "Create from an image."]
        set_image_id, with_image_id -> image_id: optional String
    }

    creation_inner_field! {
        #[doc = "Set the volume type."]
        set_volume_type, with_volume_type -> volume_type: optional String
    }

    creation_inner_field! {
        #[doc = "Set the metadata."]
        set_metadata, with_metadata -> metadata: optional HashMap<String, String>
    }
}

/// Wait for a volume to reach the status.
pub fn wait_for_volume_status<Id: IntoId>(
    session: &Session,
    id: Id,
    target: &str,
) -> Result<String> {
    let id = id.into_id();
    let request = StatusRequest::new("volume", id.as_str(), target)
        .with_failure_statuses(VOLUME_FAILURE_STATUSES)
        .with_policy(session.wait_policy(BLOCK_STORAGE));
    waiter::wait_for_status(request, || api::get_volume_by_id(session, &id).map(|v| v.status))
}
