//! # Storage service
//!
//! The façade everything else talks to. It owns the configuration handle
//! and at most one backend handle, opened lazily from the configured
//! [`StorageType`](crate::config::StorageType) on first use.
//!
//! ## Retry policy
//!
//! Backend handles can go stale (another process superseded the connection,
//! a directory disappeared mid-session). Every operation therefore runs up
//! to [`MAX_RETRIES`] attempts with [`RETRY_DELAY`] between them, and the
//! cached handle is dropped before each non-final retry so the next attempt
//! reacquires a fresh one. Only transient errors are retried; validation
//! and not-found failures surface immediately. After the ceiling, the last
//! observed error surfaces.
//!
//! [`StorageService::invalidate`] exposes the same drop-the-handle recovery
//! to the migration engine, whose configuration flip must redirect the very
//! next operation.

use std::cell::RefCell;
use std::thread;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use crate::config::{ConfigStore, StorageType};
use crate::error::{NoteError, Result};
use crate::model::{Note, NoteUpdate};
use crate::store::{BackendFactory, NoteBackend};

/// Attempt ceiling for backend operations.
pub const MAX_RETRIES: u32 = 3;
/// Pause between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Facade over the active backend.
pub struct StorageService<F: BackendFactory> {
    config: ConfigStore,
    factory: F,
    // Single-threaded by design; RefCell keeps the public API on &self.
    backend: RefCell<Option<Box<dyn NoteBackend>>>,
    retry_delay: Duration,
}

impl<F: BackendFactory> StorageService<F> {
    pub fn new(config: ConfigStore, factory: F) -> Self {
        Self {
            config,
            factory,
            backend: RefCell::new(None),
            retry_delay: RETRY_DELAY,
        }
    }

    /// Shorten the pause between retry attempts; tests use zero.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Whether `storage_type` can be offered on this host.
    pub fn is_available(&self, storage_type: StorageType) -> bool {
        self.factory.is_available(storage_type)
    }

    /// Drop the cached backend handle; the next operation reopens from the
    /// current configuration.
    pub fn invalidate(&self) {
        *self.backend.borrow_mut() = None;
    }

    fn run_once<T>(&self, op: &dyn Fn(&mut dyn NoteBackend) -> Result<T>) -> Result<T> {
        let mut slot = self.backend.borrow_mut();
        if slot.is_none() {
            let storage_type = self.config.get()?.storage_type;
            *slot = Some(self.factory.open(storage_type)?);
        }
        let Some(backend) = slot.as_mut() else {
            return Err(NoteError::Storage("No active backend".to_string()));
        };
        op(backend.as_mut())
    }

    fn with_retry<T>(&self, op: impl Fn(&mut dyn NoteBackend) -> Result<T>) -> Result<T> {
        let mut last_error = None;
        for attempt in 1..=MAX_RETRIES {
            match self.run_once(&op) {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    debug!(attempt, error = %err, "storage operation failed");
                    last_error = Some(err);
                    if attempt < MAX_RETRIES {
                        // The cached handle may be the culprit; reopen on
                        // the next attempt.
                        self.invalidate();
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| NoteError::Storage("Operation failed after retries".to_string())))
    }

    /// Create a note from user input; `created_at == updated_at` on the
    /// stored record.
    pub fn create(&self, title: &str, content: &str) -> Result<Note> {
        // Validation happens before the retry loop.
        let note = Note::new(title, content)?;
        self.with_retry(|backend| backend.put(&note))?;
        Ok(note)
    }

    /// Upsert a full record (backup import, migration). Id and timestamps
    /// are stored exactly as given; the title is normalized and must not be
    /// empty.
    pub fn save(&self, note: &Note) -> Result<()> {
        let mut note = note.clone();
        note.title = note.title.trim().to_string();
        if note.title.is_empty() {
            return Err(NoteError::Validation(
                "Note title cannot be empty".to_string(),
            ));
        }
        self.with_retry(|backend| backend.put(&note))
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<Note>> {
        self.with_retry(|backend| backend.get(id))
    }

    pub fn list(&self) -> Result<Vec<Note>> {
        self.with_retry(|backend| backend.list())
    }

    pub fn update(&self, id: &Uuid, changes: &NoteUpdate) -> Result<Note> {
        self.with_retry(|backend| backend.update(id, changes))
    }

    pub fn delete(&self, id: &Uuid) -> Result<()> {
        self.with_retry(|backend| backend.delete(id))
    }

    /// Titles matching `query`, case-insensitive; an empty query is the
    /// full listing.
    pub fn search(&self, query: &str) -> Result<Vec<Note>> {
        if query.is_empty() {
            return self.list();
        }
        self.with_retry(|backend| backend.search(query))
    }
}
