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

//! Volume backups.

use super::super::service::BLOCK_STORAGE;
use super::super::session::Session;
use super::super::utils::IntoId;
use super::super::waiter::{self, DeletionWaiter, StatusRequest, StatusWaiter, Waiter};
use super::super::{ErrorKind, Result};
use super::volumes::Volume;
use super::{api, protocol};

/// Backup statuses that fail a wait immediately.
pub const BACKUP_FAILURE_STATUSES: [&str; 1] = ["error"];

/// A volume backup.
#[derive(Clone, Debug)]
pub struct Backup {
    session: Session,
    inner: protocol::Backup,
}

/// A request to create a backup.
#[derive(Clone, Debug)]
pub struct NewBackup {
    session: Session,
    inner: protocol::BackupCreate,
}

impl Backup {
    /// Fetch a backup by its ID.
    pub fn new<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Backup> {
        let inner = api::get_backup(session, id)?;
        Ok(Backup {
            session: session.clone(),
            inner,
        })
    }

    transparent_property! {
        #[doc = "UUID of the backup."]
        id: ref String
    }

    transparent_property! {
        #[doc = "Name of the backup."]
        name: ref Option<String>
    }

    transparent_property! {
        #[doc = "Status as of the last refresh."]
        status: ref String
    }

    transparent_property! {
        #[doc = "UUID of the source volume."]
        volume_id: ref Option<String>
    }

    transparent_property! {
        #[doc = "Size in GiB."]
        size: Option<u64>
    }

    transparent_property! {
        #[doc = "Reason of the failure (if the backup failed)."]
        fail_reason: ref Option<String>
    }

    transparent_property! {
        #[doc = "Whether the backup is incremental."]
        is_incremental: Option<bool>
    }

    /// Wait for the backup to reach the status.
    pub fn wait_for_status(
        &mut self,
        target: &str,
    ) -> StatusWaiter<impl FnMut() -> Result<String> + '_> {
        let policy = self.session.wait_policy(BLOCK_STORAGE);
        waiter::resource_waiter(self, target, &BACKUP_FAILURE_STATUSES, policy)
    }

    /// Restore the backup into a new volume.
    pub fn restore(&self) -> Result<Volume> {
        self.do_restore(protocol::BackupRestore::default())
    }

    /// Restore the backup into an existing volume.
    pub fn restore_to<Id: IntoId>(&self, volume_id: Id) -> Result<Volume> {
        self.do_restore(protocol::BackupRestore {
            volume_id: Some(volume_id.into_id()),
            name: None,
        })
    }

    /// Delete the backup.
    pub fn delete(self) -> Result<DeletionWaiter<Backup>> {
        api::delete_backup(&self.session, &self.inner.id)?;
        let policy = self.session.wait_policy(BLOCK_STORAGE);
        Ok(DeletionWaiter::new(self, policy).with_failure_statuses(["error_deleting"]))
    }

    fn do_restore(&self, request: protocol::BackupRestore) -> Result<Volume> {
        let restored = api::restore_backup(&self.session, &self.inner.id, request)?;
        Volume::new(&self.session, restored.volume_id)
    }
}

status_resource!(Backup, "backup", api::get_backup);

impl NewBackup {
    /// Start creating a backup of the volume.
    pub fn new<Id: IntoId>(session: &Session, volume_id: Id) -> NewBackup {
        NewBackup {
            session: session.clone(),
            inner: protocol::BackupCreate::new(volume_id.into_id()),
        }
    }

    /// Request the backup.
    ///
    /// The API only returns the ID, so the backup is fetched afterwards.
    pub fn create(self) -> Result<Backup> {
        let id = api::create_backup(&self.session, self.inner)?;
        Backup::new(&self.session, id)
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
        #[doc = "Set the container to store the backup in."]
        set_container, with_container -> container: optional String
    }

    creation_inner_field! {
        #[doc = "Request an incremental backup."]
        set_incremental, with_incremental -> incremental: optional bool
    }

    creation_inner_field! {
        #[doc = "Allow backing up an attached volume."]
        set_force, with_force -> force: optional bool
    }

    creation_inner_field! {
        #[doc = "Back up the given snapshot of the volume."]
        set_snapshot_id, with_snapshot_id -> snapshot_id: optional String
    }
}

/// Wait for a backup to reach the status.
pub fn wait_for_backup_status<Id: IntoId>(
    session: &Session,
    id: Id,
    target: &str,
) -> Result<String> {
    let id = id.into_id();
    let request = StatusRequest::new("backup", id.as_str(), target)
        .with_failure_statuses(BACKUP_FAILURE_STATUSES)
        .with_policy(session.wait_policy(BLOCK_STORAGE));
    waiter::wait_for_status(request, || {
        let backup = api::get_backup(session, &id)?;
        if let Some(ref reason) = backup.fail_reason {
            debug!("Backup {} reports failure reason: {}", id, reason);
        }
        Ok(backup.status)
    })
}

/// Wait for a backup to be deleted.
pub fn wait_for_backup_deletion<Id: AsRef<str>>(session: &Session, id: Id) -> Result<()> {
    match Backup::new(session, id) {
        Ok(backup) => {
            let policy = session.wait_policy(BLOCK_STORAGE);
            DeletionWaiter::new(backup, policy).wait()
        }
        Err(err) if err.kind() == ErrorKind::ResourceNotFound => Ok(()),
        Err(err) => Err(err),
    }
}
