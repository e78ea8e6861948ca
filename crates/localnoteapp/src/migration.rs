//! # Backend-to-backend migration
//!
//! Moves the entire note set from the active backend to a newly selected
//! one. Data flows source → memory → target:
//!
//! 1. capture every record from the active backend,
//! 2. point the configuration at the target and invalidate the service's
//!    cached handle (from here every operation addresses the target),
//! 3. upsert the captured records into the target,
//! 4. verify by identity that every captured record arrived intact,
//! 5. only then delete target records outside the captured set (migration
//!    is a full replace, not a merge) and confirm the final count.
//!
//! Verification is keyed on id, not position: backends do not promise the
//! same tie-breaking order after a bulk write, and a position-sensitive
//! comparison would fail migrations that actually succeeded.
//!
//! Nothing destructive happens before verification passes, so a failed
//! migration never loses data: the source backend is untouched and the
//! target still holds a superset. Recovery restores the configuration
//! pointer (best-effort) and re-surfaces the original error. The protocol
//! is not transactional across its steps: a crash between the
//! configuration flip and the copy leaves the config pointing at a backend
//! whose data has not arrived yet; rerunning the migration from the old
//! type, or editing the config, recovers.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ConfigUpdate, StorageType};
use crate::error::{NoteError, Result};
use crate::model::Note;
use crate::service::StorageService;
use crate::store::BackendFactory;

/// Best-effort health snapshot of the active storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageHealth {
    pub is_valid: bool,
    pub note_count: usize,
    pub storage_type: StorageType,
}

/// Orchestrates a single migration. Borrows the service for the duration of
/// the call and never outlives it.
pub struct MigrationEngine<'a, F: BackendFactory> {
    service: &'a StorageService<F>,
}

impl<'a, F: BackendFactory> MigrationEngine<'a, F> {
    pub fn new(service: &'a StorageService<F>) -> Self {
        Self { service }
    }

    /// Switch the active backend to `target`, carrying every record across.
    ///
    /// Migrating to the already-active type succeeds immediately without
    /// touching data or configuration.
    pub fn migrate_to(&self, target: StorageType) -> Result<()> {
        let original = self.service.config().get()?.storage_type;
        if original == target {
            debug!(to = %target, "storage already active, nothing to migrate");
            return Ok(());
        }

        let source_notes = self.service.list()?;
        info!(
            from = %original,
            to = %target,
            count = source_notes.len(),
            "migrating notes"
        );

        self.service.config().update(&ConfigUpdate {
            storage_type: Some(target),
            ..ConfigUpdate::default()
        })?;
        self.service.invalidate();

        if let Err(err) = self.copy_and_verify(&source_notes) {
            self.roll_back(original);
            return Err(err);
        }

        info!(to = %target, "migration complete");
        Ok(())
    }

    /// Runs against the now-active target backend.
    fn copy_and_verify(&self, source_notes: &[Note]) -> Result<()> {
        for note in source_notes {
            self.service.save(note)?;
        }

        let migrated = self.service.list()?;
        let by_id: HashMap<Uuid, &Note> = migrated.iter().map(|n| (n.id, n)).collect();
        for note in source_notes {
            match by_id.get(&note.id) {
                None => {
                    return Err(NoteError::Migration(format!(
                        "note {} missing from target",
                        note.id
                    )))
                }
                Some(copy) if copy.title != note.title || copy.content != note.content => {
                    return Err(NoteError::Migration(format!(
                        "data mismatch for note {}",
                        note.id
                    )))
                }
                Some(_) => {}
            }
        }

        // Full replace: the copy verified, so records the target held that
        // are not part of the source set go now.
        let keep: HashSet<Uuid> = source_notes.iter().map(|n| n.id).collect();
        for stale in migrated.iter().filter(|n| !keep.contains(&n.id)) {
            debug!(id = %stale.id, "removing record not part of the migrated set");
            self.service.delete(&stale.id)?;
        }

        let final_count = self.service.list()?.len();
        if final_count != source_notes.len() {
            return Err(NoteError::Migration(format!(
                "note count mismatch ({} stored, {} expected)",
                final_count,
                source_notes.len()
            )));
        }
        Ok(())
    }

    /// Point the configuration back at the pre-migration backend. Its own
    /// failure is logged and swallowed; the caller still sees the original
    /// migration error.
    fn roll_back(&self, original: StorageType) {
        match self.service.config().get() {
            Ok(config) if config.storage_type != original => {
                warn!(restore = %original, "migration failed, restoring previous storage type");
                if let Err(err) = self.service.config().update(&ConfigUpdate {
                    storage_type: Some(original),
                    ..ConfigUpdate::default()
                }) {
                    warn!(error = %err, "could not restore storage configuration");
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "could not read storage configuration during rollback")
            }
        }
        self.service.invalidate();
    }

    /// Read-only health check; never fails.
    pub fn validate(&self) -> StorageHealth {
        let result = self.service.config().get().and_then(|config| {
            let notes = self.service.list()?;
            Ok(StorageHealth {
                is_valid: true,
                note_count: notes.len(),
                storage_type: config.storage_type,
            })
        });
        result.unwrap_or_else(|err| {
            warn!(error = %err, "storage validation failed");
            StorageHealth {
                is_valid: false,
                note_count: 0,
                storage_type: StorageType::default(),
            }
        })
    }
}
