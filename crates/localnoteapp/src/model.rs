//! # Domain model
//!
//! A [`Note`] is the unit everything else moves around: backends persist it,
//! the migration engine copies it, backups serialize it. Identity is a v4
//! UUID fixed at creation; `created_at` never changes and `updated_at` moves
//! forward on every successful write, which is also the ordering key for
//! listings.
//!
//! The serde layout is camelCase so a serialized note matches the backup
//! interchange format (`createdAt`, `updatedAt`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NoteError, Result};

/// A single note record.
///
/// The `iv` slot is reserved for a future cipher; no code interprets it, it
/// is simply carried through storage, migration, and backup untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub iv: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Build a fresh note with a new id and matching timestamps.
    ///
    /// The title is trimmed; a title that trims to nothing is rejected so an
    /// empty title is never persisted.
    pub fn new(title: &str, content: &str) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NoteError::Validation(
                "Note title cannot be empty".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            iv: String::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Caller-mutable fields for an update. Ids and timestamps are managed by
/// the store and cannot be supplied here.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteUpdate {
    /// Merge into an existing record, refreshing `updated_at`.
    ///
    /// Fails without touching `note` when a supplied title trims to empty.
    pub fn apply_to(&self, note: &mut Note) -> Result<()> {
        let title = match &self.title {
            Some(title) => {
                let trimmed = title.trim();
                if trimmed.is_empty() {
                    return Err(NoteError::Validation(
                        "Note title cannot be empty".to_string(),
                    ));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };

        if let Some(title) = title {
            note.title = title;
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        note.updated_at = Utc::now();
        Ok(())
    }
}

/// Parse a user-supplied id string at the presentation boundary.
///
/// The empty string gets the required-field message rather than a uuid parse
/// error; inside the core, ids are already typed and this check cannot fail.
pub fn parse_note_id(raw: &str) -> Result<Uuid> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(NoteError::Validation("Note ID is required".to_string()));
    }
    Uuid::parse_str(raw).map_err(|e| NoteError::Validation(format!("Invalid note ID: {}", e)))
}
