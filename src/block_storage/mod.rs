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

//! Block Storage API implementation bits.
//!
//! Volumes, snapshots and backups are all created asynchronously, so every
//! handle has a `wait_for_status` call, and deletion returns a
//! [DeletionWaiter](../waiter/struct.DeletionWaiter.html).

pub mod api;
mod backups;
pub mod protocol;
mod snapshots;
mod volumes;

pub use self::backups::{
    wait_for_backup_deletion, wait_for_backup_status, Backup, NewBackup, BACKUP_FAILURE_STATUSES,
};
pub use self::snapshots::{
    wait_for_snapshot_status, NewSnapshot, Snapshot, SNAPSHOT_FAILURE_STATUSES,
};
pub use self::volumes::{
    wait_for_volume_status, NewVolume, Volume, VOLUME_DELETION_FAILURE_STATUSES,
    VOLUME_FAILURE_STATUSES,
};
