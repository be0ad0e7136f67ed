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

//! Foundation bits exposing the Block Storage API.

use std::fmt::Debug;

use serde::Serialize;

use super::super::service::BLOCK_STORAGE;
use super::super::session::Session;
use super::super::utils;
use super::super::{ErrorKind, Result};
use super::protocol::*;

/// Create a volume.
pub fn create_volume(session: &Session, request: VolumeCreate) -> Result<Volume> {
    debug!("Creating a volume with {:?}", request);
    let body = VolumeCreateRoot { volume: request };
    let root: VolumeRoot = session
        .post(BLOCK_STORAGE, &["volumes"])?
        .json(&body)
        .expect_status(202)
        .fetch()?;
    debug!("Created volume {:?}", root.volume);
    Ok(root.volume)
}

/// Delete a volume.
pub fn delete_volume<S: AsRef<str>>(session: &Session, id: S) -> Result<()> {
    trace!("Deleting volume {}", id.as_ref());
    let _ = session
        .delete(BLOCK_STORAGE, &["volumes", id.as_ref()])?
        .expect_status(202)
        .send()?;
    debug!("Successfully requested deletion of volume {}", id.as_ref());
    Ok(())
}

/// Get a volume.
pub fn get_volume<S: AsRef<str>>(session: &Session, id_or_name: S) -> Result<Volume> {
    let s = id_or_name.as_ref();
    match get_volume_by_id(session, s) {
        Ok(value) => Ok(value),
        Err(err) if err.kind() == ErrorKind::ResourceNotFound => get_volume_by_name(session, s),
        Err(err) => Err(err),
    }
}

/// Get a volume by its ID.
pub fn get_volume_by_id<S: AsRef<str>>(session: &Session, id: S) -> Result<Volume> {
    trace!("Fetching volume {}", id.as_ref());
    let root: VolumeRoot = session
        .get(BLOCK_STORAGE, &["volumes", id.as_ref()])?
        .fetch()?;
    trace!("Received {:?}", root.volume);
    Ok(root.volume)
}

/// Get a volume by its name.
pub fn get_volume_by_name<S: AsRef<str>>(session: &Session, name: S) -> Result<Volume> {
    trace!("Get volume by name {}", name.as_ref());
    let root: VolumesRoot = session
        .get(BLOCK_STORAGE, &["volumes", "detail"])?
        .query(&[("name", name.as_ref())])
        .fetch()?;
    let result = utils::one(
        root.volumes,
        "Volume with given name or ID not found",
        "Too many volumes found with given name",
    )?;
    trace!("Received {:?}", result);
    Ok(result)
}

/// List volumes.
pub fn list_volumes<Q: Serialize + Debug>(session: &Session, query: &Q) -> Result<Vec<Volume>> {
    trace!("Listing volumes with {:?}", query);
    let root: VolumesRoot = session
        .get(BLOCK_STORAGE, &["volumes", "detail"])?
        .query(query)
        .fetch()?;
    trace!("Received volumes: {:?}", root.volumes);
    Ok(root.volumes)
}

/// Create a snapshot.
pub fn create_snapshot(session: &Session, request: SnapshotCreate) -> Result<Snapshot> {
    debug!("Creating a snapshot with {:?}", request);
    let body = SnapshotCreateRoot { snapshot: request };
    let root: SnapshotRoot = session
        .post(BLOCK_STORAGE, &["snapshots"])?
        .json(&body)
        .expect_status(202)
        .fetch()?;
    debug!("Created snapshot {:?}", root.snapshot);
    Ok(root.snapshot)
}

/// Get a snapshot by its ID.
pub fn get_snapshot<S: AsRef<str>>(session: &Session, id: S) -> Result<Snapshot> {
    trace!("Fetching snapshot {}", id.as_ref());
    let root: SnapshotRoot = session
        .get(BLOCK_STORAGE, &["snapshots", id.as_ref()])?
        .fetch()?;
    trace!("Received {:?}", root.snapshot);
    Ok(root.snapshot)
}

/// List snapshots.
pub fn list_snapshots<Q: Serialize + Debug>(session: &Session, query: &Q) -> Result<Vec<Snapshot>> {
    trace!("Listing snapshots with {:?}", query);
    let root: SnapshotsRoot = session
        .get(BLOCK_STORAGE, &["snapshots", "detail"])?
        .query(query)
        .fetch()?;
    trace!("Received snapshots: {:?}", root.snapshots);
    Ok(root.snapshots)
}

/// Delete a snapshot.
pub fn delete_snapshot<S: AsRef<str>>(session: &Session, id: S) -> Result<()> {
    trace!("Deleting snapshot {}", id.as_ref());
    let _ = session
        .delete(BLOCK_STORAGE, &["snapshots", id.as_ref()])?
        .expect_status(202)
        .send()?;
    debug!("Successfully requested deletion of snapshot {}", id.as_ref());
    Ok(())
}

/// Request a backup, returns its ID.
pub fn create_backup(session: &Session, request: BackupCreate) -> Result<String> {
    debug!("Creating a backup with {:?}", request);
    let body = BackupCreateRoot { backup: request };
    let root: BackupCreatedRoot = session
        .post(BLOCK_STORAGE, &["backups"])?
        .json(&body)
        .expect_status(202)
        .fetch()?;
    debug!("Requested backup {}", root.backup.id);
    Ok(root.backup.id)
}

/// Get a backup by its ID.
pub fn get_backup<S: AsRef<str>>(session: &Session, id: S) -> Result<Backup> {
    trace!("Fetching backup {}", id.as_ref());
    let root: BackupRoot = session
        .get(BLOCK_STORAGE, &["backups", id.as_ref()])?
        .fetch()?;
    trace!("Received {:?}", root.backup);
    Ok(root.backup)
}

/// List backups.
pub fn list_backups<Q: Serialize + Debug>(session: &Session, query: &Q) -> Result<Vec<Backup>> {
    trace!("Listing backups with {:?}", query);
    let root: BackupsRoot = session
        .get(BLOCK_STORAGE, &["backups", "detail"])?
        .query(query)
        .fetch()?;
    trace!("Received backups: {:?}", root.backups);
    Ok(root.backups)
}

/// Delete a backup.
pub fn delete_backup<S: AsRef<str>>(session: &Session, id: S) -> Result<()> {
    trace!("Deleting backup {}", id.as_ref());
    let _ = session
        .delete(BLOCK_STORAGE, &["backups", id.as_ref()])?
        .expect_status(202)
        .send()?;
    debug!("Successfully requested deletion of backup {}", id.as_ref());
    Ok(())
}

/// Restore a backup.
pub fn restore_backup<S: AsRef<str>>(
    session: &Session,
    id: S,
    request: BackupRestore,
) -> Result<BackupRestored> {
    debug!("Restoring backup {} with {:?}", id.as_ref(), request);
    let body = BackupRestoreRoot { restore: request };
    let root: BackupRestoredRoot = session
        .post(BLOCK_STORAGE, &["backups", id.as_ref(), "restore"])?
        .json(&body)
        .expect_status(202)
        .fetch()?;
    debug!(
        "Restoring backup {} into volume {}",
        root.restore.backup_id, root.restore.volume_id
    );
    Ok(root.restore)
}
