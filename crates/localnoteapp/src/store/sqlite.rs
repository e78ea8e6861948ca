//! Durable indexed backend on SQLite.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::NoteBackend;
use crate::error::{NoteError, Result};
use crate::model::{Note, NoteUpdate};

const SELECT_COLUMNS: &str = "id, title, content, iv, created_at, updated_at";

type RawRow = (String, String, String, String, i64, i64);

/// SQLite-backed store, the default backend.
///
/// Timestamps are stored as microseconds since the epoch so the index on
/// `updated_at` orders chronologically without string parsing.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(Self::sqlite_error)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Private database that lives and dies with the handle; for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Self::sqlite_error)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                iv TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_by_updated ON notes(updated_at);
            "#,
        )
        .map_err(Self::sqlite_error)
    }

    fn sqlite_error(err: rusqlite::Error) -> NoteError {
        NoteError::Storage(format!("SQLite error: {}", err))
    }

    fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn decode_row(raw: RawRow) -> Result<Note> {
        let (id, title, content, iv, created_at, updated_at) = raw;
        Ok(Note {
            id: Uuid::parse_str(&id)
                .map_err(|e| NoteError::Storage(format!("Invalid UUID in database: {}", e)))?,
            title,
            content,
            iv,
            created_at: Self::decode_timestamp(created_at)?,
            updated_at: Self::decode_timestamp(updated_at)?,
        })
    }

    fn decode_timestamp(micros: i64) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_micros(micros).ok_or_else(|| {
            NoteError::Storage(format!("Invalid timestamp in database: {}", micros))
        })
    }

    fn get_with(conn: &Connection, id: &Uuid) -> Result<Option<Note>> {
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM notes WHERE id = ?1", SELECT_COLUMNS),
                [id.to_string()],
                Self::raw_row,
            )
            .optional()
            .map_err(Self::sqlite_error)?;
        raw.map(Self::decode_row).transpose()
    }

    fn put_with(conn: &Connection, note: &Note) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO notes (id, title, content, iv, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                iv = excluded.iv,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
            params![
                note.id.to_string(),
                note.title,
                note.content,
                note.iv,
                note.created_at.timestamp_micros(),
                note.updated_at.timestamp_micros(),
            ],
        )
        .map_err(Self::sqlite_error)?;
        Ok(())
    }
}

impl NoteBackend for SqliteBackend {
    fn put(&mut self, note: &Note) -> Result<()> {
        Self::put_with(&self.conn, note)
    }

    fn get(&self, id: &Uuid) -> Result<Option<Note>> {
        Self::get_with(&self.conn, id)
    }

    fn list(&self) -> Result<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM notes ORDER BY updated_at DESC",
                SELECT_COLUMNS
            ))
            .map_err(Self::sqlite_error)?;
        let rows = stmt
            .query_map([], Self::raw_row)
            .map_err(Self::sqlite_error)?;

        let mut notes = Vec::new();
        for raw in rows {
            notes.push(Self::decode_row(raw.map_err(Self::sqlite_error)?)?);
        }
        Ok(notes)
    }

    fn delete(&mut self, id: &Uuid) -> Result<()> {
        self.conn
            .execute("DELETE FROM notes WHERE id = ?1", [id.to_string()])
            .map_err(Self::sqlite_error)?;
        Ok(())
    }

    // Overrides the default read-merge-write with a transaction so a
    // concurrent reader never observes a partially merged record.
    fn update(&mut self, id: &Uuid, changes: &NoteUpdate) -> Result<Note> {
        let tx = self.conn.transaction().map_err(Self::sqlite_error)?;

        let mut note = Self::get_with(&tx, id)?.ok_or(NoteError::NotFound(*id))?;
        changes.apply_to(&mut note)?;
        Self::put_with(&tx, &note)?;

        tx.commit().map_err(Self::sqlite_error)?;
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_round_trip_preserves_timestamps_and_iv() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();

        let mut note = Note::new("Exact", "body").unwrap();
        note.iv = "reserved".to_string();
        note.created_at = Utc::now() - Duration::days(3);
        note.updated_at = Utc::now() - Duration::days(1);
        backend.put(&note).unwrap();

        let fetched = backend.get(&note.id).unwrap().unwrap();
        // Micro precision survives the integer encoding.
        assert_eq!(
            fetched.created_at.timestamp_micros(),
            note.created_at.timestamp_micros()
        );
        assert_eq!(fetched.iv, "reserved");
        assert_eq!(fetched.title, note.title);
    }

    #[test]
    fn test_list_uses_updated_at_index_order() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();

        for (title, minutes_ago) in [("A", 30), ("B", 10), ("C", 20)] {
            let mut note = Note::new(title, "").unwrap();
            let at = Utc::now() - Duration::minutes(minutes_ago);
            note.created_at = at;
            note.updated_at = at;
            backend.put(&note).unwrap();
        }

        let titles: Vec<String> = backend
            .list()
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_update_is_transactional_on_validation_failure() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        let note = backend.create("Kept", "body").unwrap();

        let result = backend.update(
            &note.id,
            &NoteUpdate {
                title: Some("  ".to_string()),
                content: Some("never stored".to_string()),
            },
        );
        assert!(matches!(result, Err(NoteError::Validation(_))));

        let stored = backend.get(&note.id).unwrap().unwrap();
        assert_eq!(stored.content, "body");
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        assert!(matches!(
            backend.update(&id, &NoteUpdate::default()),
            Err(NoteError::NotFound(_))
        ));
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");

        let note = Note::new("Durable", "body").unwrap();
        SqliteBackend::open(&path).unwrap().put(&note).unwrap();

        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.get(&note.id).unwrap().unwrap().title, "Durable");
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        backend.delete(&Uuid::new_v4()).unwrap();
    }
}
