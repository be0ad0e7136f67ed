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

//! JSON structures and protocol bits for the Block Storage API.

#![allow(missing_docs)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A volume attachment.
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeAttachment {
    pub server_id: String,
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub attached_at: Option<String>,
    #[serde(default)]
    pub host_name: Option<String>,
    pub volume_id: String,
    #[serde(default)]
    pub device: Option<String>,
    pub id: String,
}

/// A volume.
#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    pub size: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub attachments: Vec<VolumeAttachment>,
    #[serde(default)]
    pub bootable: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default, rename = "source_volid")]
    pub source_volume_id: Option<String>,
    #[serde(default)]
    pub volume_type: Option<String>,
    #[serde(default)]
    pub multiattach: bool,
    #[serde(default)]
    pub migration_status: Option<String>,
}

/// A volume root.
#[derive(Clone, Debug, Deserialize)]
pub struct VolumeRoot {
    pub volume: Volume,
}

/// A list of volumes.
#[derive(Debug, Clone, Deserialize)]
pub struct VolumesRoot {
    pub volumes: Vec<Volume>,
}

/// Volume arguments for a create request.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeCreate {
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "source_volid")]
    pub source_volume_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "imageRef")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

/// A volume create request.
#[derive(Clone, Debug, Serialize)]
pub struct VolumeCreateRoot {
    pub volume: VolumeCreate,
}

impl VolumeCreate {
    pub fn new(size: u64) -> VolumeCreate {
        VolumeCreate {
            size,
            availability_zone: None,
            source_volume_id: None,
            description: None,
            snapshot_id: None,
            backup_id: None,
            name: None,
            image_id: None,
            volume_type: None,
            metadata: None,
        }
    }
}

/// A volume snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    pub volume_id: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SnapshotRoot {
    pub snapshot: Snapshot,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SnapshotsRoot {
    pub snapshots: Vec<Snapshot>,
}

/// Snapshot arguments for a create request.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotCreate {
    pub volume_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SnapshotCreateRoot {
    pub snapshot: SnapshotCreate,
}

impl SnapshotCreate {
    pub fn new(volume_id: String) -> SnapshotCreate {
        SnapshotCreate {
            volume_id,
            name: None,
            description: None,
            force: None,
            metadata: None,
        }
    }
}

/// A volume backup.
#[derive(Debug, Clone, Deserialize)]
pub struct Backup {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub volume_id: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub fail_reason: Option<String>,
    #[serde(default)]
    pub is_incremental: Option<bool>,
    #[serde(default)]
    pub has_dependent_backups: Option<bool>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackupRoot {
    pub backup: Backup,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackupsRoot {
    pub backups: Vec<Backup>,
}

/// What the API returns when a backup is requested.
#[derive(Clone, Debug, Deserialize)]
pub struct BackupCreated {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackupCreatedRoot {
    pub backup: BackupCreated,
}

/// Backup arguments for a create request.
#[derive(Debug, Clone, Serialize)]
pub struct BackupCreate {
    pub volume_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incremental: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BackupCreateRoot {
    pub backup: BackupCreate,
}

impl BackupCreate {
    pub fn new(volume_id: String) -> BackupCreate {
        BackupCreate {
            volume_id,
            name: None,
            description: None,
            container: None,
            incremental: None,
            force: None,
            snapshot_id: None,
        }
    }
}

/// Restore arguments. Without a volume ID a new volume is created.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupRestore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BackupRestoreRoot {
    pub restore: BackupRestore,
}

/// Result of a restore request.
#[derive(Clone, Debug, Deserialize)]
pub struct BackupRestored {
    pub backup_id: String,
    pub volume_id: String,
    #[serde(default)]
    pub volume_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackupRestoredRoot {
    pub restore: BackupRestored,
}

#[cfg(test)]
pub mod test {
    #![allow(missing_docs)]

    use super::{BackupRestore, BackupRestoreRoot, VolumeCreate, VolumeCreateRoot, VolumeRoot};

    #[test]
    fn test_volume_create_skips_unset() {
        let mut volume = VolumeCreate::new(1);
        volume.image_id = Some("img".into());
        let body = serde_json::to_value(VolumeCreateRoot { volume }).unwrap();
        assert_eq!(body, serde_json::json!({"volume": {"size": 1, "imageRef": "img"}}));
    }

    #[test]
    fn test_volume_minimal() {
        let root: VolumeRoot = serde_json::from_value(serde_json::json!({
            "volume": {"id": "v1", "status": "creating", "size": 2, "name": null}
        }))
        .unwrap();
        assert_eq!(root.volume.status, "creating");
        assert!(root.volume.name.is_none());
        assert!(root.volume.attachments.is_empty());
    }

    #[test]
    fn test_restore_to_new_volume() {
        let body = serde_json::to_value(BackupRestoreRoot {
            restore: BackupRestore::default(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"restore": {}}));
    }
}
