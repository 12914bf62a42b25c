//! Note store implementation

use crate::error::Result;
use crate::models::{LabelId, Note, NoteId, NoteStatus};
use rusqlite::{params, Connection, OptionalExtension};

const NOTE_COLUMNS: &str = "n.id, n.status, n.title, n.content, n.pinned, n.created_at, n.modified_at";

/// Trait for note storage operations
pub trait NoteStore {
    /// Insert a note; the store assigns and returns its id
    fn insert(&self, note: &Note) -> Result<NoteId>;

    /// Replace every column of an existing note. A missing id is a no-op.
    fn update(&self, note: &Note) -> Result<()>;

    /// Hard delete a note by id. A missing id is a no-op.
    fn delete(&self, note: &Note) -> Result<()>;

    /// Get a note by id
    fn get_by_id(&self, id: NoteId) -> Result<Option<Note>>;

    /// Notes with exactly this status, most recently modified first
    fn get_by_status(&self, status: NoteStatus) -> Result<Vec<Note>>;

    /// Full-text search over title and content, most recently modified first
    fn search(&self, query: &str) -> Result<Vec<Note>>;

    /// The note with the latest modification time, highest id on ties
    fn get_last_modified(&self) -> Result<Option<Note>>;

    /// Non-deleted notes carrying the label
    fn get_by_label(&self, label_id: LabelId) -> Result<Vec<Note>>;

    /// Notes in one list carrying the label, trash included
    fn get_by_label_and_status(&self, label_id: LabelId, status: NoteStatus) -> Result<Vec<Note>>;

    /// Move notes to another list, returning how many rows changed
    fn set_status(&self, ids: &[NoteId], status: NoteStatus) -> Result<usize>;

    /// Hard delete every note in a list
    fn delete_by_status(&self, status: NoteStatus) -> Result<usize>;

    /// Every note regardless of status, ordered by id
    fn get_all(&self) -> Result<Vec<Note>>;
}

/// `SQLite` implementation of `NoteStore`
pub struct SqliteNoteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a note from a database row
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        Ok(Note {
            id: row.get(0)?,
            status: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            pinned: row.get::<_, i32>(4)? != 0,
            created_at: row.get(5)?,
            modified_at: row.get(6)?,
        })
    }

    fn query_notes(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let notes = stmt
            .query_map(params, Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }
}

/// Turn free text into an FTS5 expression of quoted prefix terms.
///
/// Returns `None` when nothing searchable remains.
fn fts_query(raw: &str) -> Option<String> {
    let terms = raw
        .split_whitespace()
        .map(|term| term.replace('"', ""))
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{term}\"*"))
        .collect::<Vec<_>>();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn insert(&self, note: &Note) -> Result<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (status, title, content, pinned, created_at, modified_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                note.status,
                note.title,
                note.content,
                i32::from(note.pinned),
                note.created_at,
                note.modified_at
            ],
        )?;

        let id = NoteId(self.conn.last_insert_rowid());
        tracing::debug!("Inserted note {id}");
        Ok(id)
    }

    fn update(&self, note: &Note) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE notes
             SET status = ?, title = ?, content = ?, pinned = ?, created_at = ?, modified_at = ?
             WHERE id = ?",
            params![
                note.status,
                note.title,
                note.content,
                i32::from(note.pinned),
                note.created_at,
                note.modified_at,
                note.id
            ],
        )?;

        if rows == 0 {
            tracing::debug!("Update skipped, note {} does not exist", note.id);
        }
        Ok(())
    }

    fn delete(&self, note: &Note) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?", params![note.id])?;

        if rows == 0 {
            tracing::debug!("Delete skipped, note {} does not exist", note.id);
        }
        Ok(())
    }

    fn get_by_id(&self, id: NoteId) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes n WHERE n.id = ?"),
                params![id],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn get_by_status(&self, status: NoteStatus) -> Result<Vec<Note>> {
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS}
                 FROM notes n
                 WHERE n.status = ?
                 ORDER BY n.modified_at DESC, n.id DESC"
            ),
            params![status],
        )
    }

    fn search(&self, query: &str) -> Result<Vec<Note>> {
        let Some(expression) = fts_query(query) else {
            return Ok(Vec::new());
        };

        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS}
                 FROM notes n
                 JOIN notes_fts fts ON n.id = fts.rowid
                 WHERE notes_fts MATCH ?
                 ORDER BY n.modified_at DESC, n.id DESC"
            ),
            params![expression],
        )
    }

    fn get_last_modified(&self) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!(
                    "SELECT {NOTE_COLUMNS}
                     FROM notes n
                     ORDER BY n.modified_at DESC, n.id DESC
                     LIMIT 1"
                ),
                [],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn get_by_label(&self, label_id: LabelId) -> Result<Vec<Note>> {
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS}
                 FROM notes n
                 JOIN label_refs r ON n.id = r.note_id
                 WHERE r.label_id = ? AND n.status != 'deleted'
                 ORDER BY n.modified_at DESC, n.id DESC"
            ),
            params![label_id],
        )
    }

    fn get_by_label_and_status(&self, label_id: LabelId, status: NoteStatus) -> Result<Vec<Note>> {
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS}
                 FROM notes n
                 JOIN label_refs r ON n.id = r.note_id
                 WHERE r.label_id = ? AND n.status = ?
                 ORDER BY n.modified_at DESC, n.id DESC"
            ),
            params![label_id, status],
        )
    }

    fn set_status(&self, ids: &[NoteId], status: NoteStatus) -> Result<usize> {
        let now = chrono::Utc::now().timestamp_millis();
        let tx = self.conn.unchecked_transaction()?;
        let mut changed = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE notes SET status = ?, modified_at = MAX(modified_at, ?)
                 WHERE id = ? AND status != ?",
            )?;
            for id in ids {
                changed += stmt.execute(params![status, now, id, status])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Moved {changed} note(s) to {status}");
        Ok(changed)
    }

    fn delete_by_status(&self, status: NoteStatus) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM notes WHERE status = ?", params![status])?;
        tracing::info!("Deleted {removed} {status} note(s)");
        Ok(removed)
    }

    fn get_all(&self) -> Result<Vec<Note>> {
        self.query_notes(
            &format!("SELECT {NOTE_COLUMNS} FROM notes n ORDER BY n.id"),
            [],
        )
    }
}
