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

//! Volume snapshots.

use std::collections::HashMap;

use super::super::service::BLOCK_STORAGE;
use super::super::session::Session;
use super::super::utils::IntoId;
use super::super::waiter::{self, DeletionWaiter, StatusRequest, StatusWaiter};
use super::super::Result;
use super::{api, protocol};

/// Snapshot statuses that fail a wait immediately.
pub const SNAPSHOT_FAILURE_STATUSES: [&str; 1] = ["error"];

/// A volume snapshot.
#[derive(Clone, Debug)]
pub struct Snapshot {
    session: Session,
    inner: protocol::Snapshot,
}

/// A request to create a snapshot.
#[derive(Clone, Debug)]
pub struct NewSnapshot {
    session: Session,
    inner: protocol::SnapshotCreate,
}

impl Snapshot {
    /// Fetch a snapshot by its ID.
    pub fn new<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Snapshot> {
        let inner = api::get_snapshot(session, id)?;
        Ok(Snapshot {
            session: session.clone(),
            inner,
        })
    }

    transparent_property! {
        #[doc = "UUID of the snapshot."]
        id: ref String
    }

    transparent_property! {
        #[doc = "Name of the snapshot."]
        name: ref Option<String>
    }

    transparent_property! {
        #[doc = "Status as of the last refresh."]
        status: ref String
    }

    transparent_property! {
        #[doc = "UUID of the source volume."]
        volume_id: ref String
    }

    transparent_property! {
        #[doc = "Size in GiB."]
        size: Option<u64>
    }

    transparent_property! {
        #[doc = "Progress reported by the backend, e.g. `50%`."]
        progress: ref Option<String>
    }

    /// Wait for the snapshot to reach the status.
    pub fn wait_for_status(
        &mut self,
        target: &str,
    ) -> StatusWaiter<impl FnMut() -> Result<String> + '_> {
        let policy = self.session.wait_policy(BLOCK_STORAGE);
        waiter::resource_waiter(self, target, &SNAPSHOT_FAILURE_STATUSES, policy)
    }

    /// Delete the snapshot.
    pub fn delete(self) -> Result<DeletionWaiter<Snapshot>> {
        api::delete_snapshot(&self.session, &self.inner.id)?;
        let policy = self.session.wait_policy(BLOCK_STORAGE);
        Ok(DeletionWaiter::new(self, policy).with_failure_statuses(["error_deleting"]))
    }
}

status_resource!(Snapshot, "snapshot", api::get_snapshot);

impl NewSnapshot {
    /// Start creating a snapshot of the volume.
    pub fn new<Id: IntoId>(session: &Session, volume_id: Id) -> NewSnapshot {
        NewSnapshot {
            session: session.clone(),
            inner: protocol::SnapshotCreate::new(volume_id.into_id()),
        }
    }

    /// Request creation of the snapshot.
    pub fn create(self) -> Result<Snapshot> {
        let inner = api::create_snapshot(&self.session, self.inner)?;
        Ok(Snapshot {
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
        #[doc = "Allow snapshotting an attached volume."]
        set_force, with_force -> force: optional bool
    }

    creation_inner_field! {
        #[doc = "Set the metadata."]
        set_metadata, with_metadata -> metadata: optional HashMap<String, String>
    }
}

/// Wait for a snapshot to reach the status.
///
/// Status transitions are logged at info level.
pub fn wait_for_snapshot_status<Id: IntoId>(
    session: &Session,
    id: Id,
    target: &str,
) -> Result<String> {
    let id = id.into_id();
    let request = StatusRequest::new("snapshot", id.as_str(), target)
        .with_failure_statuses(SNAPSHOT_FAILURE_STATUSES)
        .with_policy(session.wait_policy(BLOCK_STORAGE));
    waiter::wait_for_status(request, || api::get_snapshot(session, &id).map(|s| s.status))
}
