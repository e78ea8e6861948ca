//! # Backup export and import
//!
//! A backup is a versioned JSON envelope holding every note, independent of
//! which backend is active. The core produces and consumes the document;
//! writing it to disk (or wherever it goes) is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NoteError, Result};
use crate::model::Note;
use crate::service::StorageService;
use crate::store::BackendFactory;

/// Envelope format tag written by [`export`].
pub const BACKUP_VERSION: &str = "1.0";

/// Portable serialization of the entire note set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Vec<Note>,
}

impl BackupDocument {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome counts for a bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
}

/// Snapshot every note into a backup envelope.
pub fn export<F: BackendFactory>(service: &StorageService<F>) -> Result<BackupDocument> {
    let notes = service.list()?;
    Ok(BackupDocument {
        version: BACKUP_VERSION.to_string(),
        timestamp: Utc::now(),
        notes,
    })
}

/// The documented download name for a backup taken at `now`.
pub fn backup_filename(now: DateTime<Utc>) -> String {
    format!("localnote-backup-{}.json", now.format("%Y-%m-%d"))
}

/// Restore notes from a serialized backup document.
///
/// The envelope must carry a `version` and a `notes` array; anything else is
/// rejected before a single record is written. Records are then imported
/// independently as upserts by id: one bad record costs one `failed` count,
/// never the batch.
pub fn import<F: BackendFactory>(
    service: &StorageService<F>,
    raw: &str,
) -> Result<ImportReport> {
    let document: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| NoteError::Format(format!("not valid JSON: {}", e)))?;

    if document.get("version").map_or(true, |v| v.is_null()) {
        return Err(NoteError::Format("missing version tag".to_string()));
    }
    let Some(notes) = document.get("notes").and_then(|n| n.as_array()) else {
        return Err(NoteError::Format("notes must be an array".to_string()));
    };

    let mut report = ImportReport::default();
    for value in notes {
        let outcome = serde_json::from_value::<Note>(value.clone())
            .map_err(NoteError::from)
            .and_then(|note| service.save(&note));
        match outcome {
            Ok(()) => report.imported += 1,
            Err(err) => {
                debug!(error = %err, "skipping backup record");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}
