//! Label and note/label association store

use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::{normalize_label_name, Label, LabelId, LabelRef, NoteId};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

/// Trait for label storage operations
pub trait LabelStore {
    /// Create a label with the given (trimmed, non-empty) name
    fn insert(&self, name: &str) -> Result<Label>;

    /// Rename a label. A missing id is a no-op.
    fn rename(&self, id: LabelId, name: &str) -> Result<()>;

    /// Delete labels and every association pointing at them
    fn delete(&self, ids: &[LabelId]) -> Result<usize>;

    /// Get a label by id
    fn get_by_id(&self, id: LabelId) -> Result<Option<Label>>;

    /// All labels ordered by name
    fn get_all(&self) -> Result<Vec<Label>>;

    /// Attach labels to notes; existing pairs are left alone. One transaction per call.
    fn insert_label_refs(&self, refs: &[LabelRef]) -> Result<usize>;

    /// Detach labels from notes. One transaction per call.
    fn delete_label_refs(&self, refs: &[LabelRef]) -> Result<usize>;

    /// Ids of the labels a note carries
    fn get_label_ids_for_note(&self, note_id: NoteId) -> Result<BTreeSet<LabelId>>;

    /// Labels a note carries, ordered by name
    fn get_labels_for_note(&self, note_id: NoteId) -> Result<Vec<Label>>;

    /// Number of associations pointing at any of the given labels.
    ///
    /// A note carrying two of them counts twice.
    fn count_label_refs(&self, label_ids: &[LabelId]) -> Result<usize>;

    /// All labels, most used first
    fn get_all_by_usage(&self) -> Result<Vec<Label>>;

    /// Every association row
    fn get_all_label_refs(&self) -> Result<Vec<LabelRef>>;
}

/// `SQLite` implementation of `LabelStore`
pub struct SqliteLabelStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteLabelStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_label(row: &rusqlite::Row<'_>) -> rusqlite::Result<Label> {
        Ok(Label {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn query_labels(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Label>> {
        let mut stmt = self.conn.prepare(sql)?;
        let labels = stmt
            .query_map(params, Self::parse_label)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(labels)
    }

    /// Run one statement per association inside a single transaction.
    ///
    /// Joins the caller's transaction when one is already open.
    fn apply_refs(&self, sql: &str, refs: &[LabelRef]) -> Result<usize> {
        if refs.is_empty() {
            return Ok(0);
        }

        let tx = if self.conn.is_autocommit() {
            Some(self.conn.unchecked_transaction()?)
        } else {
            None
        };
        let mut changed = 0;
        {
            let mut stmt = self.conn.prepare(sql)?;
            for label_ref in refs {
                changed += stmt.execute(params![label_ref.note_id, label_ref.label_id])?;
            }
        }
        if let Some(tx) = tx {
            tx.commit()?;
        }
        Ok(changed)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl LabelStore for SqliteLabelStore<'_> {
    fn insert(&self, name: &str) -> Result<Label> {
        let name = normalize_label_name(name)?;
        self.conn
            .execute("INSERT INTO labels (name) VALUES (?)", params![name])?;

        let label = Label {
            id: LabelId(self.conn.last_insert_rowid()),
            name,
        };
        tracing::debug!("Inserted label {} ({})", label.id, label.name);
        Ok(label)
    }

    fn rename(&self, id: LabelId, name: &str) -> Result<()> {
        let name = normalize_label_name(name)?;
        let rows = self.conn.execute(
            "UPDATE labels SET name = ? WHERE id = ?",
            params![name, id],
        )?;

        if rows == 0 {
            tracing::debug!("Rename skipped, label {id} does not exist");
        }
        Ok(())
    }

    fn delete(&self, ids: &[LabelId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let removed = self.conn.execute(
            &format!("DELETE FROM labels WHERE id IN ({})", placeholders(ids.len())),
            params_from_iter(ids),
        )?;
        tracing::debug!("Deleted {removed} label(s)");
        Ok(removed)
    }

    fn get_by_id(&self, id: LabelId) -> Result<Option<Label>> {
        let label = self
            .conn
            .query_row(
                "SELECT id, name FROM labels WHERE id = ?",
                params![id],
                Self::parse_label,
            )
            .optional()?;
        Ok(label)
    }

    fn get_all(&self) -> Result<Vec<Label>> {
        self.query_labels(
            "SELECT id, name FROM labels ORDER BY name COLLATE NOCASE, id",
            [],
        )
    }

    fn insert_label_refs(&self, refs: &[LabelRef]) -> Result<usize> {
        self.apply_refs(
            "INSERT OR IGNORE INTO label_refs (note_id, label_id) VALUES (?, ?)",
            refs,
        )
    }

    fn delete_label_refs(&self, refs: &[LabelRef]) -> Result<usize> {
        self.apply_refs(
            "DELETE FROM label_refs WHERE note_id = ? AND label_id = ?",
            refs,
        )
    }

    fn get_label_ids_for_note(&self, note_id: NoteId) -> Result<BTreeSet<LabelId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT label_id FROM label_refs WHERE note_id = ?")?;
        let ids = stmt
            .query_map(params![note_id], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<LabelId>>>()?;
        Ok(ids)
    }

    fn get_labels_for_note(&self, note_id: NoteId) -> Result<Vec<Label>> {
        self.query_labels(
            "SELECT l.id, l.name
             FROM labels l
             JOIN label_refs r ON l.id = r.label_id
             WHERE r.note_id = ?
             ORDER BY l.name COLLATE NOCASE, l.id",
            params![note_id],
        )
    }

    fn count_label_refs(&self, label_ids: &[LabelId]) -> Result<usize> {
        if label_ids.is_empty() {
            return Ok(0);
        }

        let count = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM label_refs WHERE label_id IN ({})",
                placeholders(label_ids.len())
            ),
            params_from_iter(label_ids),
            |row| row.get::<_, usize>(0),
        )?;
        Ok(count)
    }

    fn get_all_by_usage(&self) -> Result<Vec<Label>> {
        self.query_labels(
            "SELECT l.id, l.name
             FROM labels l
             LEFT JOIN label_refs r ON l.id = r.label_id
             GROUP BY l.id
             ORDER BY COUNT(r.note_id) DESC, l.name COLLATE NOCASE, l.id",
            [],
        )
    }

    fn get_all_label_refs(&self) -> Result<Vec<LabelRef>> {
        let mut stmt = self
            .conn
            .prepare("SELECT note_id, label_id FROM label_refs ORDER BY note_id, label_id")?;
        let refs = stmt
            .query_map([], |row| Ok(LabelRef::new(row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NoteStore, SqliteNoteStore};
    use crate::models::Note;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn insert_note(db: &Database, title: &str) -> NoteId {
        SqliteNoteStore::new(db.connection())
            .insert(&Note::new(title, ""))
            .unwrap()
    }

    fn names(labels: &[Label]) -> Vec<&str> {
        labels.iter().map(|label| label.name.as_str()).collect()
    }

    #[test]
    fn test_insert_rename_get() {
        let db = setup();
        let store = SqliteLabelStore::new(db.connection());

        let label = store.insert("  Work ").unwrap();
        assert_eq!(label.name, "Work");
        assert_eq!(store.get_by_id(label.id).unwrap(), Some(label.clone()));

        store.rename(label.id, "Office").unwrap();
        assert_eq!(store.get_by_id(label.id).unwrap().unwrap().name, "Office");

        // Missing id is silently ignored
        store.rename(LabelId(999), "Nope").unwrap();
        assert!(store.get_by_id(LabelId(999)).unwrap().is_none());
    }

    #[test]
    fn test_blank_names_rejected() {
        let db = setup();
        let store = SqliteLabelStore::new(db.connection());

        assert!(store.insert("   ").is_err());
        let label = store.insert("ok").unwrap();
        assert!(store.rename(label.id, "").is_err());
        assert_eq!(store.get_by_id(label.id).unwrap().unwrap().name, "ok");
    }

    #[test]
    fn test_label_refs_are_unique_per_pair() {
        let db = setup();
        let store = SqliteLabelStore::new(db.connection());
        let note = insert_note(&db, "n");
        let label = store.insert("home").unwrap();

        let pair = LabelRef::new(note, label.id);
        assert_eq!(store.insert_label_refs(&[pair, pair]).unwrap(), 1);
        assert_eq!(store.insert_label_refs(&[pair]).unwrap(), 0);
        assert_eq!(store.count_label_refs(&[label.id]).unwrap(), 1);

        assert_eq!(store.delete_label_refs(&[pair]).unwrap(), 1);
        assert_eq!(store.delete_label_refs(&[pair]).unwrap(), 0);
        assert_eq!(store.count_label_refs(&[label.id]).unwrap(), 0);
    }

    #[test]
    fn test_label_refs_batch_is_atomic() {
        let db = setup();
        let store = SqliteLabelStore::new(db.connection());
        let note = insert_note(&db, "n");
        let label = store.insert("home").unwrap();

        // Second pair violates the foreign key, so the whole batch rolls back
        let result = store.insert_label_refs(&[
            LabelRef::new(note, label.id),
            LabelRef::new(NoteId(4242), label.id),
        ]);
        assert!(result.is_err());
        assert!(store.get_label_ids_for_note(note).unwrap().is_empty());
    }

    #[test]
    fn test_label_ids_and_labels_for_note() {
        let db = setup();
        let store = SqliteLabelStore::new(db.connection());
        let note = insert_note(&db, "n");
        let other = insert_note(&db, "o");
        let b = store.insert("beta").unwrap();
        let a = store.insert("Alpha").unwrap();
        let c = store.insert("gamma").unwrap();

        store
            .insert_label_refs(&[
                LabelRef::new(note, b.id),
                LabelRef::new(note, a.id),
                LabelRef::new(other, c.id),
            ])
            .unwrap();

        assert_eq!(
            store.get_label_ids_for_note(note).unwrap(),
            BTreeSet::from([a.id, b.id])
        );
        assert_eq!(
            names(&store.get_labels_for_note(note).unwrap()),
            vec!["Alpha", "beta"]
        );
    }

    #[test]
    fn test_delete_cascades_to_refs() {
        let db = setup();
        let store = SqliteLabelStore::new(db.connection());
        let note = insert_note(&db, "n");
        let keep = store.insert("keep").unwrap();
        let dropped = store.insert("drop").unwrap();
        store
            .insert_label_refs(&[LabelRef::new(note, keep.id), LabelRef::new(note, dropped.id)])
            .unwrap();

        assert_eq!(store.delete(&[dropped.id]).unwrap(), 1);

        assert_eq!(
            store.get_label_ids_for_note(note).unwrap(),
            BTreeSet::from([keep.id])
        );
        assert_eq!(store.get_all_label_refs().unwrap().len(), 1);
    }

    #[test]
    fn test_note_delete_cascades_to_refs() {
        let db = setup();
        let store = SqliteLabelStore::new(db.connection());
        let notes = SqliteNoteStore::new(db.connection());
        let note_id = insert_note(&db, "n");
        let label = store.insert("x").unwrap();
        store
            .insert_label_refs(&[LabelRef::new(note_id, label.id)])
            .unwrap();

        let note = notes.get_by_id(note_id).unwrap().unwrap();
        notes.delete(&note).unwrap();

        assert_eq!(store.count_label_refs(&[label.id]).unwrap(), 0);
        assert!(store.get_by_id(label.id).unwrap().is_some());
    }

    #[test]
    fn test_count_label_refs_sums_over_labels() {
        let db = setup();
        let store = SqliteLabelStore::new(db.connection());
        let n1 = insert_note(&db, "1");
        let n2 = insert_note(&db, "2");
        let used = store.insert("used").unwrap();
        let also = store.insert("also").unwrap();
        let unused = store.insert("unused").unwrap();
        store
            .insert_label_refs(&[
                LabelRef::new(n1, used.id),
                LabelRef::new(n2, used.id),
                LabelRef::new(n1, also.id),
            ])
            .unwrap();

        assert_eq!(store.count_label_refs(&[used.id, also.id]).unwrap(), 3);
        assert_eq!(store.count_label_refs(&[unused.id]).unwrap(), 0);
        assert_eq!(store.count_label_refs(&[]).unwrap(), 0);
    }

    #[test]
    fn test_get_all_by_usage_orders_by_count_then_name() {
        let db = setup();
        let store = SqliteLabelStore::new(db.connection());
        let n1 = insert_note(&db, "1");
        let n2 = insert_note(&db, "2");
        let rare = store.insert("rare").unwrap();
        let popular = store.insert("popular").unwrap();
        store.insert("zzz-unused").unwrap();
        store.insert("aaa-unused").unwrap();
        store
            .insert_label_refs(&[
                LabelRef::new(n1, popular.id),
                LabelRef::new(n2, popular.id),
                LabelRef::new(n1, rare.id),
            ])
            .unwrap();

        assert_eq!(
            names(&store.get_all_by_usage().unwrap()),
            vec!["popular", "rare", "aaa-unused", "zzz-unused"]
        );
        assert_eq!(
            names(&store.get_all().unwrap()),
            vec!["aaa-unused", "popular", "rare", "zzz-unused"]
        );
    }

    #[test]
    fn test_notes_by_label_skips_trash() {
        let db = setup();
        let labels = SqliteLabelStore::new(db.connection());
        let notes = SqliteNoteStore::new(db.connection());
        let kept = insert_note(&db, "kept");
        let trashed = insert_note(&db, "trashed");
        let label = labels.insert("x").unwrap();
        labels
            .insert_label_refs(&[LabelRef::new(kept, label.id), LabelRef::new(trashed, label.id)])
            .unwrap();
        notes
            .set_status(&[trashed], crate::models::NoteStatus::Deleted)
            .unwrap();

        let found = notes.get_by_label(label.id).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, kept);
    }
}
