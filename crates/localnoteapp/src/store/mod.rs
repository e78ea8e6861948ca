//! # Storage layer
//!
//! Every backend satisfies the same [`NoteBackend`] contract, so the rest of
//! the crate never cares where a note physically lives. Backends only have
//! to provide the four primitive operations (`put`/`get`/`list`/`delete`);
//! `create`, `update`, and `search` are shared default implementations so
//! their semantics cannot drift between backends. A backend with stronger
//! native atomicity overrides `update` (SQLite wraps it in a transaction).
//!
//! ## Implementations
//!
//! - [`sqlite::SqliteBackend`]: durable indexed database file (default).
//! - [`kv::KvBackend`]: the whole note set in one JSON document.
//! - [`dir::DirBackend`]: one JSON file per note in a granted directory.
//! - [`mem::MemBackend`]: in-memory, with failure injection for tests.
//!
//! Backends are selected at runtime through a [`BackendFactory`] keyed on
//! [`StorageType`]; [`FsBackendFactory`] is the production factory rooted at
//! a [`StoragePaths`]. The service re-opens through the factory whenever its
//! cached handle is dropped, which is what makes migration's configuration
//! flip take effect.
//!
//! ## Storage layout
//!
//! ```text
//! <root>/
//! ├── config.json         # persisted StorageConfig
//! ├── notes.db            # Indexed backend
//! ├── notes.json          # KeyValue backend
//! └── notes/
//!     └── note-{uuid}.json  # Directory backend
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::StorageType;
use crate::error::{NoteError, Result};
use crate::model::{Note, NoteUpdate};

pub mod dir;
pub mod kv;
pub mod mem;
pub mod sqlite;

/// Abstract interface for note storage.
pub trait NoteBackend {
    /// Upsert a record by id, persisted exactly as given (timestamps and the
    /// reserved `iv` slot included).
    fn put(&mut self, note: &Note) -> Result<()>;

    /// Fetch by id. A missing record is `Ok(None)`, never an error.
    fn get(&self, id: &Uuid) -> Result<Option<Note>>;

    /// All records, most recently updated first. Records with equal
    /// `updated_at` keep the backend's natural scan order.
    fn list(&self) -> Result<Vec<Note>>;

    /// Remove by id. Deleting an id that does not exist is a no-op.
    fn delete(&mut self, id: &Uuid) -> Result<()>;

    /// Create and persist a fresh record with `created_at == updated_at`.
    fn create(&mut self, title: &str, content: &str) -> Result<Note> {
        let note = Note::new(title, content)?;
        self.put(&note)?;
        Ok(note)
    }

    /// Merge `changes` into an existing record.
    ///
    /// `id` and `created_at` are preserved and `updated_at` refreshed. Fails
    /// without touching storage when the record is missing or a supplied
    /// title trims to empty.
    fn update(&mut self, id: &Uuid, changes: &NoteUpdate) -> Result<Note> {
        let mut note = self.get(id)?.ok_or(NoteError::NotFound(*id))?;
        changes.apply_to(&mut note)?;
        self.put(&note)?;
        Ok(note)
    }

    /// Case-insensitive substring match on titles. An empty query returns
    /// the full list; ordering matches [`NoteBackend::list`].
    fn search(&self, query: &str) -> Result<Vec<Note>> {
        let notes = self.list()?;
        if query.is_empty() {
            return Ok(notes);
        }
        let needle = query.to_lowercase();
        Ok(notes
            .into_iter()
            .filter(|note| note.title.to_lowercase().contains(&needle))
            .collect())
    }
}

/// Sort for the `list` contract. Stable, so ties keep scan order.
pub(crate) fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Opens backends by type.
///
/// The service goes through this whenever its cached handle is missing;
/// tests substitute [`mem::MemBackendFactory`] to run the full stack without
/// touching the filesystem.
pub trait BackendFactory {
    fn open(&self, storage_type: StorageType) -> Result<Box<dyn NoteBackend>>;

    /// Whether the backend can be offered on this host.
    fn is_available(&self, storage_type: StorageType) -> bool;
}

/// On-disk layout for the production backends. Everything lives under one
/// root so the whole store can be pointed somewhere else.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_file(&self) -> PathBuf {
        self.root.join("notes.db")
    }

    pub fn kv_file(&self) -> PathBuf {
        self.root.join("notes.json")
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.root.join("notes")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }
}

/// Production factory: filesystem backends rooted at [`StoragePaths`].
pub struct FsBackendFactory {
    paths: StoragePaths,
}

impl FsBackendFactory {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }
}

impl BackendFactory for FsBackendFactory {
    fn open(&self, storage_type: StorageType) -> Result<Box<dyn NoteBackend>> {
        match storage_type {
            StorageType::Indexed => Ok(Box::new(sqlite::SqliteBackend::open(
                &self.paths.database_file(),
            )?)),
            StorageType::KeyValue => Ok(Box::new(kv::KvBackend::new(self.paths.kv_file()))),
            StorageType::Directory => Ok(Box::new(dir::DirBackend::new(self.paths.notes_dir()))),
        }
    }

    fn is_available(&self, storage_type: StorageType) -> bool {
        match storage_type {
            StorageType::Indexed | StorageType::KeyValue => true,
            // Directory storage needs a root we can actually materialize.
            StorageType::Directory => fs::create_dir_all(self.paths.notes_dir()).is_ok(),
        }
    }
}

/// A selectable backend as shown in settings surfaces.
#[derive(Debug, Clone)]
pub struct StorageProvider {
    pub storage_type: StorageType,
    pub name: &'static str,
    pub description: &'static str,
    pub available: bool,
}

/// The selectable backends, availability probed through `factory`.
pub fn providers<F: BackendFactory>(factory: &F) -> Vec<StorageProvider> {
    [
        (
            StorageType::Indexed,
            "Database",
            "Durable indexed database file (recommended)",
        ),
        (
            StorageType::KeyValue,
            "Key-value file",
            "Single JSON document (limited space)",
        ),
        (
            StorageType::Directory,
            "Directory",
            "One file per note in a folder you choose",
        ),
    ]
    .into_iter()
    .map(|(storage_type, name, description)| StorageProvider {
        storage_type,
        name,
        description,
        available: factory.is_available(storage_type),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::mem::MemBackendFactory;
    use super::*;
    use chrono::{Duration, Utc};

    fn backend() -> Box<dyn NoteBackend> {
        MemBackendFactory::new().open(StorageType::Indexed).unwrap()
    }

    /// A note whose timestamps lie `minutes_ago` in the past, for
    /// deterministic ordering tests without sleeping.
    fn note_from(title: &str, minutes_ago: i64) -> Note {
        let mut note = Note::new(title, "body").unwrap();
        let at = Utc::now() - Duration::minutes(minutes_ago);
        note.created_at = at;
        note.updated_at = at;
        note
    }

    // --- Default contract tests (shared by every backend) ---

    #[test]
    fn test_create_then_get_round_trips() {
        let mut backend = backend();
        let note = backend.create("  Title  ", "content").unwrap();

        let fetched = backend.get(&note.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Title");
        assert_eq!(fetched.content, "content");
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[test]
    fn test_update_missing_record_is_not_found() {
        let mut backend = backend();
        let id = Uuid::new_v4();
        let result = backend.update(&id, &NoteUpdate::default());
        match result {
            Err(NoteError::NotFound(missing)) => assert_eq!(missing, id),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_update_blank_title_leaves_record_untouched() {
        let mut backend = backend();
        let note = backend.create("Kept", "body").unwrap();

        let result = backend.update(
            &note.id,
            &NoteUpdate {
                title: Some("   ".to_string()),
                content: Some("never stored".to_string()),
            },
        );
        assert!(matches!(result, Err(NoteError::Validation(_))));

        let stored = backend.get(&note.id).unwrap().unwrap();
        assert_eq!(stored, note);
    }

    #[test]
    fn test_update_merges_and_refreshes_updated_at() {
        let mut backend = backend();
        let note = backend.create("Old", "body").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));

        let updated = backend
            .update(
                &note.id,
                &NoteUpdate {
                    title: Some("  New  ".to_string()),
                    content: None,
                },
            )
            .unwrap();

        assert_eq!(updated.id, note.id);
        assert_eq!(updated.title, "New");
        assert_eq!(updated.content, "body");
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at > note.created_at);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut backend = backend();
        let note = backend.create("Bye", "").unwrap();

        backend.delete(&note.id).unwrap();
        assert!(backend.get(&note.id).unwrap().is_none());

        // Deleting again succeeds silently.
        backend.delete(&note.id).unwrap();
    }

    #[test]
    fn test_list_orders_by_updated_at_descending() {
        let mut backend = backend();
        backend.put(&note_from("A", 30)).unwrap();
        backend.put(&note_from("B", 10)).unwrap();
        backend.put(&note_from("C", 20)).unwrap();

        let titles: Vec<String> = backend
            .list()
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_search_matches_title_case_insensitively() {
        let mut backend = backend();
        backend.put(&note_from("Shopping List", 10)).unwrap();
        backend.put(&note_from("Meeting notes", 20)).unwrap();
        backend.put(&note_from("list of ideas", 30)).unwrap();

        let titles: Vec<String> = backend
            .search("LIST")
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["Shopping List", "list of ideas"]);
    }

    #[test]
    fn test_search_does_not_match_content() {
        let mut backend = backend();
        let mut note = note_from("Title only", 5);
        note.content = "needle".to_string();
        backend.put(&note).unwrap();

        assert!(backend.search("needle").unwrap().is_empty());
    }

    #[test]
    fn test_search_empty_query_returns_full_list() {
        let mut backend = backend();
        backend.put(&note_from("A", 10)).unwrap();
        backend.put(&note_from("B", 5)).unwrap();

        let all = backend.search("").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "B");
    }

    #[test]
    fn test_put_preserves_record_exactly() {
        let mut backend = backend();
        let mut note = note_from("Carried", 60);
        note.iv = "reserved".to_string();
        backend.put(&note).unwrap();

        let fetched = backend.get(&note.id).unwrap().unwrap();
        assert_eq!(fetched, note);
    }
}
