//! # Storage selection and persisted configuration
//!
//! One [`StorageConfig`] record exists per store: which backend is active
//! plus advisory flags (auto-backup scheduling) that the core persists but
//! never acts on. It lives in a single well-known JSON file under the
//! storage root, created lazily with defaults on first read and only ever
//! overwritten through read-modify-write [`ConfigStore::update`].
//!
//! The migration engine is the only writer of the `type` field; settings
//! surfaces write the advisory flags.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NoteError, Result};

/// The closed set of storage backends a user can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    /// Durable indexed database file. The default.
    #[serde(rename = "indexed")]
    Indexed,
    /// Single JSON document holding every note.
    #[serde(rename = "keyValue")]
    KeyValue,
    /// One file per note in a user-granted directory.
    #[serde(rename = "directory")]
    Directory,
}

impl StorageType {
    pub const ALL: [StorageType; 3] = [
        StorageType::Indexed,
        StorageType::KeyValue,
        StorageType::Directory,
    ];
}

impl Default for StorageType {
    fn default() -> Self {
        StorageType::Indexed
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageType::Indexed => "indexed",
            StorageType::KeyValue => "keyValue",
            StorageType::Directory => "directory",
        };
        f.write_str(name)
    }
}

impl FromStr for StorageType {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "indexed" | "db" | "database" => Ok(StorageType::Indexed),
            "keyValue" | "keyvalue" | "kv" => Ok(StorageType::KeyValue),
            "directory" | "dir" => Ok(StorageType::Directory),
            other => Err(NoteError::Validation(format!(
                "Unknown storage type: {}",
                other
            ))),
        }
    }
}

/// Persisted configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Reserved; no cipher exists yet and the core never reads this.
    pub encryption_enabled: bool,
    /// Advisory: an external scheduler may use these two, the core does not.
    pub auto_backup_enabled: bool,
    /// Auto-backup interval in milliseconds.
    pub backup_interval: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Indexed,
            encryption_enabled: false,
            auto_backup_enabled: true,
            backup_interval: 5 * 60 * 1000,
        }
    }
}

/// Partial overlay for [`ConfigStore::update`].
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub storage_type: Option<StorageType>,
    pub encryption_enabled: Option<bool>,
    pub auto_backup_enabled: Option<bool>,
    pub backup_interval: Option<u64>,
}

impl ConfigUpdate {
    fn apply_to(&self, config: &mut StorageConfig) {
        if let Some(storage_type) = self.storage_type {
            config.storage_type = storage_type;
        }
        if let Some(encryption_enabled) = self.encryption_enabled {
            config.encryption_enabled = encryption_enabled;
        }
        if let Some(auto_backup_enabled) = self.auto_backup_enabled {
            config.auto_backup_enabled = auto_backup_enabled;
        }
        if let Some(backup_interval) = self.backup_interval {
            config.backup_interval = backup_interval;
        }
    }
}

/// Persists the configuration record as JSON at a fixed path.
///
/// Single-writer by assumption; writes are atomic (tmp then rename) so a
/// crash never leaves a torn file behind.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current configuration, or defaults when none was ever saved.
    /// Absence is not an error; a file that exists but cannot be parsed is.
    pub fn get(&self) -> Result<StorageConfig> {
        if !self.path.exists() {
            return Ok(StorageConfig::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw)
            .map_err(|e| NoteError::Storage(format!("Corrupt storage config: {}", e)))
    }

    /// Merge `updates` over the current configuration, persist, and return
    /// the merged result.
    pub fn update(&self, updates: &ConfigUpdate) -> Result<StorageConfig> {
        let mut config = self.get()?;
        updates.apply_to(&mut config);
        self.save(&config)?;
        Ok(config)
    }

    fn save(&self, config: &StorageConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(config)?;
        let tmp = self.path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
