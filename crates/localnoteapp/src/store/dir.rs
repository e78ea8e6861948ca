//! Directory backend: one JSON file per note in a user-granted folder.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{sort_newest_first, NoteBackend};
use crate::error::Result;
use crate::model::Note;

/// File-per-note storage. Note files are named `note-<uuid>.json`; anything
/// else in the directory is left alone, so users can keep the folder under
/// their own sync tooling.
pub struct DirBackend {
    root: PathBuf,
}

impl DirBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn note_path(&self, id: &Uuid) -> PathBuf {
        self.root.join(format!("note-{}.json", id))
    }

    fn read_note(path: &Path) -> Result<Note> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl NoteBackend for DirBackend {
    fn put(&mut self, note: &Note) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let raw = serde_json::to_string_pretty(note)?;

        // Atomic write: tmp then rename.
        let tmp = self.root.join(format!(".note-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, self.note_path(&note.id))?;
        Ok(())
    }

    fn get(&self, id: &Uuid) -> Result<Option<Note>> {
        let path = self.note_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::read_note(&path)?))
    }

    fn list(&self) -> Result<Vec<Note>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut notes = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if !name.starts_with("note-") || !name.ends_with(".json") {
                continue;
            }
            notes.push(Self::read_note(&path)?);
        }
        sort_newest_first(&mut notes);
        Ok(notes)
    }

    fn delete(&mut self, id: &Uuid) -> Result<()> {
        let path = self.note_path(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_in(dir: &tempfile::TempDir) -> DirBackend {
        DirBackend::new(dir.path().join("notes"))
    }

    #[test]
    fn test_put_creates_root_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_in(&dir);

        assert!(backend.list().unwrap().is_empty());

        let note = Note::new("First", "body").unwrap();
        backend.put(&note).unwrap();
        assert!(dir.path().join("notes").join(format!("note-{}.json", note.id)).exists());
    }

    #[test]
    fn test_round_trip_and_idempotent_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_in(&dir);

        let note = Note::new("Dir note", "body").unwrap();
        backend.put(&note).unwrap();
        assert_eq!(backend.get(&note.id).unwrap().unwrap(), note);

        backend.delete(&note.id).unwrap();
        backend.delete(&note.id).unwrap();
        assert!(backend.get(&note.id).unwrap().is_none());
    }

    #[test]
    fn test_list_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_in(&dir);

        let note = Note::new("Mine", "body").unwrap();
        backend.put(&note).unwrap();

        let root = dir.path().join("notes");
        fs::write(root.join("README.txt"), "not a note").unwrap();
        fs::write(root.join("other.json"), "{}").unwrap();

        let notes = backend.list().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, note.id);
    }

    #[test]
    fn test_put_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_in(&dir);

        let mut note = Note::new("Version 1", "body").unwrap();
        backend.put(&note).unwrap();

        note.title = "Version 2".to_string();
        backend.put(&note).unwrap();

        let stored = backend.get(&note.id).unwrap().unwrap();
        assert_eq!(stored.title, "Version 2");
        assert_eq!(backend.list().unwrap().len(), 1);
    }
}
