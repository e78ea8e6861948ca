//! Key-value backend: the entire note set lives in one JSON document.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use uuid::Uuid;

use super::{sort_newest_first, NoteBackend};
use crate::error::Result;
use crate::model::Note;

/// Simple always-available backend holding an id → note map in a single
/// file. Every mutation is a whole-map read-modify-write; the replace is
/// atomic (tmp then rename) so a crash never leaves a torn file.
pub struct KvBackend {
    path: PathBuf,
}

impl KvBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<HashMap<Uuid, Note>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn store(&self, map: &HashMap<Uuid, Note>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl NoteBackend for KvBackend {
    fn put(&mut self, note: &Note) -> Result<()> {
        let mut map = self.load()?;
        map.insert(note.id, note.clone());
        self.store(&map)
    }

    fn get(&self, id: &Uuid) -> Result<Option<Note>> {
        let mut map = self.load()?;
        Ok(map.remove(id))
    }

    fn list(&self) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self.load()?.into_values().collect();
        sort_newest_first(&mut notes);
        Ok(notes)
    }

    fn delete(&mut self, id: &Uuid) -> Result<()> {
        let mut map = self.load()?;
        if map.remove(id).is_some() {
            self.store(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_in(dir: &tempfile::TempDir) -> KvBackend {
        KvBackend::new(dir.path().join("notes.json"))
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir);
        assert!(backend.list().unwrap().is_empty());
        assert!(backend.get(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_put_get_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_in(&dir);

        let note = Note::new("KV note", "body").unwrap();
        backend.put(&note).unwrap();
        assert_eq!(backend.get(&note.id).unwrap().unwrap(), note);

        backend.delete(&note.id).unwrap();
        assert!(backend.get(&note.id).unwrap().is_none());
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let note = Note::new("Persistent", "body").unwrap();

        backend_in(&dir).put(&note).unwrap();

        let reopened = backend_in(&dir);
        assert_eq!(reopened.list().unwrap(), vec![note]);
    }

    #[test]
    fn test_delete_missing_id_does_not_touch_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_in(&dir);
        backend.delete(&Uuid::new_v4()).unwrap();
        assert!(!dir.path().join("notes.json").exists());
    }
}
