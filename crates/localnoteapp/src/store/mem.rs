//! In-memory backend for testing logic without filesystem I/O.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use uuid::Uuid;

use super::{sort_newest_first, BackendFactory, NoteBackend};
use crate::config::StorageType;
use crate::error::{NoteError, Result};
use crate::model::Note;

/// State shared by every handle a [`MemBackendFactory`] gives out, so a
/// reopened backend sees what the previous handle wrote, the same way the
/// filesystem backends behave across reopen.
#[derive(Default)]
struct MemState {
    notes: HashMap<StorageType, HashMap<Uuid, Note>>,
    /// Backends whose every operation fails.
    broken: HashSet<StorageType>,
    /// Fail the next N operations on any backend, then recover.
    fail_count: u32,
    /// Operations attempted so far, for asserting retry counts.
    ops: u32,
}

/// In-memory backend.
///
/// Uses `RefCell` for interior mutability since the crate is single-threaded;
/// handles never cross threads.
pub struct MemBackend {
    state: Rc<RefCell<MemState>>,
    storage_type: StorageType,
}

impl MemBackend {
    fn check_failure(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.ops += 1;
        if state.fail_count > 0 {
            state.fail_count -= 1;
            return Err(NoteError::Storage("Simulated storage error".to_string()));
        }
        if state.broken.contains(&self.storage_type) {
            return Err(NoteError::Storage("Simulated storage error".to_string()));
        }
        Ok(())
    }
}

impl NoteBackend for MemBackend {
    fn put(&mut self, note: &Note) -> Result<()> {
        self.check_failure()?;
        self.state
            .borrow_mut()
            .notes
            .entry(self.storage_type)
            .or_default()
            .insert(note.id, note.clone());
        Ok(())
    }

    fn get(&self, id: &Uuid) -> Result<Option<Note>> {
        self.check_failure()?;
        let state = self.state.borrow();
        Ok(state
            .notes
            .get(&self.storage_type)
            .and_then(|map| map.get(id))
            .cloned())
    }

    fn list(&self) -> Result<Vec<Note>> {
        self.check_failure()?;
        let state = self.state.borrow();
        let mut notes: Vec<Note> = state
            .notes
            .get(&self.storage_type)
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        sort_newest_first(&mut notes);
        Ok(notes)
    }

    fn delete(&mut self, id: &Uuid) -> Result<()> {
        self.check_failure()?;
        if let Some(map) = self.state.borrow_mut().notes.get_mut(&self.storage_type) {
            map.remove(id);
        }
        Ok(())
    }
}

/// Factory handing out [`MemBackend`] handles over shared state.
#[derive(Default)]
pub struct MemBackendFactory {
    state: Rc<RefCell<MemState>>,
}

impl MemBackendFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `storage_type` fail until cleared.
    pub fn set_broken(&self, storage_type: StorageType, broken: bool) {
        let mut state = self.state.borrow_mut();
        if broken {
            state.broken.insert(storage_type);
        } else {
            state.broken.remove(&storage_type);
        }
    }

    /// Fail the next `count` operations on any backend, then recover.
    pub fn set_fail_count(&self, count: u32) {
        self.state.borrow_mut().fail_count = count;
    }

    /// Operations attempted so far across all handles.
    pub fn op_count(&self) -> u32 {
        self.state.borrow().ops
    }

    /// Direct peek at a backend's contents for assertions, bypassing
    /// failure injection.
    pub fn notes_in(&self, storage_type: StorageType) -> Vec<Note> {
        let state = self.state.borrow();
        let mut notes: Vec<Note> = state
            .notes
            .get(&storage_type)
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        sort_newest_first(&mut notes);
        notes
    }
}

impl BackendFactory for MemBackendFactory {
    fn open(&self, storage_type: StorageType) -> Result<Box<dyn NoteBackend>> {
        Ok(Box::new(MemBackend {
            state: Rc::clone(&self.state),
            storage_type,
        }))
    }

    fn is_available(&self, _storage_type: StorageType) -> bool {
        true
    }
}
