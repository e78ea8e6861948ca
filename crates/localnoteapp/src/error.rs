use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, NoteError>;

/// Error type shared by every layer of the crate.
///
/// The retry policy in the storage service only re-attempts operations whose
/// failure may be transient (see [`NoteError::is_transient`]); contract
/// violations surface to the caller immediately.
#[derive(Error, Debug)]
pub enum NoteError {
    /// Missing or malformed required input (id, title).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation targeted a record that does not exist.
    #[error("Note with id {0} not found")]
    NotFound(Uuid),

    /// Backend-level failure: connection, quota, permissions.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Post-migration verification found a count or content divergence.
    #[error("Migration verification failed: {0}")]
    Migration(String),

    /// Malformed backup document.
    #[error("Invalid backup format: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NoteError {
    /// Whether the retry policy should attempt the operation again.
    pub fn is_transient(&self) -> bool {
        matches!(self, NoteError::Storage(_) | NoteError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let id = Uuid::nil();
        let err = NoteError::NotFound(id);
        assert_eq!(
            err.to_string(),
            format!("Note with id {} not found", id)
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(NoteError::Storage("disk full".into()).is_transient());
        assert!(!NoteError::Validation("empty title".into()).is_transient());
        assert!(!NoteError::NotFound(Uuid::nil()).is_transient());
        assert!(!NoteError::Migration("count mismatch".into()).is_transient());
    }
}
