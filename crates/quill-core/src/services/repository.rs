//! Repository service mediating between the stores and view state.
//!
//! All store access goes through one `Database` behind an async mutex. Label
//! list observers subscribe to a `watch` channel that receives a fresh,
//! versioned snapshot after every write that can change it.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::db::{
    Database, LabelStore, NoteStore, SqliteLabelStore, SqliteNoteStore, SqliteViewStateStore,
    ViewStateStore,
};
use crate::models::{Label, LabelId, LabelRef, Note, NoteId, NoteStatus};
use crate::Result;

/// Full label list ordered by usage, tagged with a monotonically increasing version.
///
/// Version 0 is never published; observers use it to mean "nothing seen yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSnapshot {
    pub version: u64,
    pub labels: Vec<Label>,
}

/// Thread-safe repository over the local database.
#[derive(Clone)]
pub struct Repository {
    db: Arc<Mutex<Database>>,
    labels: Arc<watch::Sender<LabelSnapshot>>,
    db_path: Option<PathBuf>,
}

impl Repository {
    /// Open a repository backed by a database file.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let db = Database::open(&db_path)?;
        Self::from_database(db, Some(db_path))
    }

    /// Open an in-memory repository (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_database(Database::open_in_memory()?, None)
    }

    fn from_database(db: Database, db_path: Option<PathBuf>) -> Result<Self> {
        let labels = SqliteLabelStore::new(db.connection()).get_all_by_usage()?;
        let (sender, _) = watch::channel(LabelSnapshot { version: 1, labels });

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            labels: Arc::new(sender),
            db_path,
        })
    }

    /// Path of the backing database file, `None` when in memory.
    pub fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Re-query the label list and publish it as the next snapshot version.
    ///
    /// Runs after a committed write, so a failed re-query is logged and the
    /// write still succeeds. Returns the latest published version.
    fn publish_labels(&self, db: &Database) -> u64 {
        let labels = match SqliteLabelStore::new(db.connection()).get_all_by_usage() {
            Ok(labels) => labels,
            Err(error) => {
                tracing::warn!("Failed to refresh label snapshot: {error}");
                return self.labels.borrow().version;
            }
        };

        let mut version = 0;
        self.labels.send_modify(|snapshot| {
            snapshot.version += 1;
            snapshot.labels = labels;
            version = snapshot.version;
        });
        tracing::debug!("Published label snapshot v{version}");
        version
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Subscribe to label list snapshots, ordered by usage.
    ///
    /// The current snapshot is immediately available through the receiver.
    pub fn subscribe_labels(&self) -> watch::Receiver<LabelSnapshot> {
        self.labels.subscribe()
    }

    /// Latest published label snapshot.
    pub fn current_labels(&self) -> LabelSnapshot {
        self.labels.borrow().clone()
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    /// Insert a note, returning it with its assigned id.
    pub async fn create_note(&self, note: &Note) -> Result<Note> {
        let db = self.db.lock().await;
        let id = SqliteNoteStore::new(db.connection()).insert(note)?;
        Ok(Note { id, ..note.clone() })
    }

    /// Replace a note's stored row. Missing notes are ignored.
    pub async fn update_note(&self, note: &Note) -> Result<()> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).update(note)
    }

    /// Hard delete a note and its label associations.
    pub async fn delete_note(&self, note: &Note) -> Result<()> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).delete(note)?;
        self.publish_labels(&db);
        Ok(())
    }

    /// Fetch a note by id.
    pub async fn note(&self, id: NoteId) -> Result<Option<Note>> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).get_by_id(id)
    }

    /// Notes in one list, most recently modified first.
    pub async fn notes_by_status(&self, status: NoteStatus) -> Result<Vec<Note>> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).get_by_status(status)
    }

    /// Full-text search across every list.
    pub async fn search_notes(&self, query: &str) -> Result<Vec<Note>> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).search(query)
    }

    /// The most recently modified note.
    pub async fn last_modified_note(&self) -> Result<Option<Note>> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).get_last_modified()
    }

    /// Non-deleted notes carrying a label.
    pub async fn notes_by_label(&self, label_id: LabelId) -> Result<Vec<Note>> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).get_by_label(label_id)
    }

    /// Notes in one list carrying a label, trash included.
    pub async fn notes_by_label_and_status(
        &self,
        label_id: LabelId,
        status: NoteStatus,
    ) -> Result<Vec<Note>> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).get_by_label_and_status(label_id, status)
    }

    /// Every stored note, ordered by id.
    pub async fn all_notes(&self) -> Result<Vec<Note>> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).get_all()
    }

    /// Move notes to the archive.
    pub async fn archive_notes(&self, ids: &[NoteId]) -> Result<usize> {
        self.move_notes(ids, NoteStatus::Archived).await
    }

    /// Move notes to the trash.
    pub async fn trash_notes(&self, ids: &[NoteId]) -> Result<usize> {
        self.move_notes(ids, NoteStatus::Deleted).await
    }

    /// Move notes back to the active list.
    pub async fn restore_notes(&self, ids: &[NoteId]) -> Result<usize> {
        self.move_notes(ids, NoteStatus::Active).await
    }

    async fn move_notes(&self, ids: &[NoteId], status: NoteStatus) -> Result<usize> {
        let db = self.db.lock().await;
        SqliteNoteStore::new(db.connection()).set_status(ids, status)
    }

    /// Hard delete every trashed note.
    pub async fn empty_trash(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let removed = SqliteNoteStore::new(db.connection()).delete_by_status(NoteStatus::Deleted)?;
        if removed > 0 {
            self.publish_labels(&db);
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    /// Create a label.
    pub async fn create_label(&self, name: &str) -> Result<Label> {
        let db = self.db.lock().await;
        let label = SqliteLabelStore::new(db.connection()).insert(name)?;
        self.publish_labels(&db);
        Ok(label)
    }

    /// Rename a label, returning the version of the snapshot carrying the change.
    pub async fn rename_label(&self, id: LabelId, name: &str) -> Result<u64> {
        let db = self.db.lock().await;
        SqliteLabelStore::new(db.connection()).rename(id, name)?;
        Ok(self.publish_labels(&db))
    }

    /// Delete labels and their associations.
    pub async fn delete_labels(&self, ids: &[LabelId]) -> Result<usize> {
        let db = self.db.lock().await;
        let removed = SqliteLabelStore::new(db.connection()).delete(ids)?;
        self.publish_labels(&db);
        tracing::info!("Deleted {removed} label(s)");
        Ok(removed)
    }

    /// Association count across the labels. A note carrying two of them counts twice.
    pub async fn count_label_refs(&self, ids: &[LabelId]) -> Result<usize> {
        let db = self.db.lock().await;
        SqliteLabelStore::new(db.connection()).count_label_refs(ids)
    }

    /// Labels carried by one note, ordered by name.
    pub async fn labels_for_note(&self, note_id: NoteId) -> Result<Vec<Label>> {
        let db = self.db.lock().await;
        SqliteLabelStore::new(db.connection()).get_labels_for_note(note_id)
    }

    /// All labels ordered by name.
    pub async fn all_labels(&self) -> Result<Vec<Label>> {
        let db = self.db.lock().await;
        SqliteLabelStore::new(db.connection()).get_all()
    }

    /// All labels, most used first.
    pub async fn labels_by_usage(&self) -> Result<Vec<Label>> {
        let db = self.db.lock().await;
        SqliteLabelStore::new(db.connection()).get_all_by_usage()
    }

    /// Every note/label association.
    pub async fn all_label_refs(&self) -> Result<Vec<LabelRef>> {
        let db = self.db.lock().await;
        SqliteLabelStore::new(db.connection()).get_all_label_refs()
    }

    /// Attach labels to notes in one batch.
    pub async fn add_label_refs(&self, refs: &[LabelRef]) -> Result<usize> {
        let db = self.db.lock().await;
        let added = SqliteLabelStore::new(db.connection()).insert_label_refs(refs)?;
        if added > 0 {
            self.publish_labels(&db);
        }
        Ok(added)
    }

    /// Labels shared by every one of the notes.
    pub async fn common_label_ids(&self, note_ids: &[NoteId]) -> Result<BTreeSet<LabelId>> {
        let db = self.db.lock().await;
        let store = SqliteLabelStore::new(db.connection());

        let mut common: Option<BTreeSet<LabelId>> = None;
        for note_id in note_ids {
            let ids = store.get_label_ids_for_note(*note_id)?;
            common = Some(match common {
                Some(acc) => acc.intersection(&ids).copied().collect(),
                None => ids,
            });
        }
        Ok(common.unwrap_or_default())
    }

    /// Make each note carry exactly `desired`.
    ///
    /// The difference is computed per note against that note's own labels, so
    /// only missing pairs are inserted and only surplus pairs are removed.
    /// Each note is its own transaction: if a later note fails, earlier notes
    /// keep their new labels and the error is returned. Returns the number of
    /// notes whose labels changed.
    pub async fn set_notes_labels(
        &self,
        note_ids: &[NoteId],
        desired: &BTreeSet<LabelId>,
    ) -> Result<usize> {
        let db = self.db.lock().await;
        let mut changed = 0;
        let result = Self::apply_label_diff(&db, note_ids, desired, &mut changed);

        if changed > 0 {
            self.publish_labels(&db);
        }
        tracing::info!("Updated labels on {changed} of {} note(s)", note_ids.len());
        result.map(|()| changed)
    }

    fn apply_label_diff(
        db: &Database,
        note_ids: &[NoteId],
        desired: &BTreeSet<LabelId>,
        changed: &mut usize,
    ) -> Result<()> {
        let store = SqliteLabelStore::new(db.connection());

        for &note_id in note_ids {
            let current = store.get_label_ids_for_note(note_id)?;
            let to_add = desired
                .difference(&current)
                .map(|&label_id| LabelRef::new(note_id, label_id))
                .collect::<Vec<_>>();
            let to_remove = current
                .difference(desired)
                .map(|&label_id| LabelRef::new(note_id, label_id))
                .collect::<Vec<_>>();

            if to_add.is_empty() && to_remove.is_empty() {
                continue;
            }

            let tx = db.connection().unchecked_transaction()?;
            store.insert_label_refs(&to_add)?;
            store.delete_label_refs(&to_remove)?;
            tx.commit()?;

            tracing::debug!(
                "Note {note_id}: +{} -{} label(s)",
                to_add.len(),
                to_remove.len()
            );
            *changed += 1;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    /// Load a restart-survivable view state slot.
    pub async fn load_view_state<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let db = self.db.lock().await;
        SqliteViewStateStore::new(db.connection()).load(key)
    }

    /// Persist a view state slot.
    pub async fn save_view_state<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let db = self.db.lock().await;
        SqliteViewStateStore::new(db.connection()).save(key, value)
    }

    /// Drop a view state slot.
    pub async fn clear_view_state(&self, key: &str) -> Result<()> {
        let db = self.db.lock().await;
        SqliteViewStateStore::new(db.connection()).clear(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn note(repo: &Repository, title: &str) -> NoteId {
        repo.create_note(&Note::new(title, "")).await.unwrap().id
    }

    async fn label_ids(repo: &Repository, note_id: NoteId) -> BTreeSet<LabelId> {
        repo.labels_for_note(note_id)
            .await
            .unwrap()
            .into_iter()
            .map(|label| label.id)
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn initial_snapshot_is_version_one() {
        let repo = Repository::open_in_memory().unwrap();
        let receiver = repo.subscribe_labels();

        let snapshot = receiver.borrow().clone();
        assert_eq!(snapshot.version, 1);
        assert!(snapshot.labels.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn label_writes_publish_fresh_snapshots() {
        let repo = Repository::open_in_memory().unwrap();
        let mut receiver = repo.subscribe_labels();

        let work = repo.create_label("work").await.unwrap();
        receiver.changed().await.unwrap();
        {
            let snapshot = receiver.borrow_and_update();
            assert_eq!(snapshot.version, 2);
            assert_eq!(snapshot.labels, vec![work.clone()]);
        }

        let version = repo.rename_label(work.id, "office").await.unwrap();
        assert_eq!(version, 3);
        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow_and_update().labels[0].name, "office");

        repo.delete_labels(&[work.id]).await.unwrap();
        assert_eq!(repo.current_labels().version, 4);
        assert!(repo.current_labels().labels.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_notes_labels_converges_each_note() {
        let repo = Repository::open_in_memory().unwrap();
        let n1 = note(&repo, "one").await;
        let n2 = note(&repo, "two").await;
        let bystander = note(&repo, "other").await;
        let a = repo.create_label("a").await.unwrap().id;
        let b = repo.create_label("b").await.unwrap().id;
        let c = repo.create_label("c").await.unwrap().id;

        repo.add_label_refs(&[
            LabelRef::new(n1, a),
            LabelRef::new(n2, c),
            LabelRef::new(bystander, a),
            LabelRef::new(bystander, c),
        ])
        .await
        .unwrap();

        let desired = BTreeSet::from([a, b]);
        let changed = repo.set_notes_labels(&[n1, n2], &desired).await.unwrap();
        assert_eq!(changed, 2);

        assert_eq!(label_ids(&repo, n1).await, desired);
        assert_eq!(label_ids(&repo, n2).await, desired);
        assert_eq!(label_ids(&repo, bystander).await, BTreeSet::from([a, c]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_notes_labels_skips_notes_already_matching() {
        let repo = Repository::open_in_memory().unwrap();
        let n1 = note(&repo, "one").await;
        let a = repo.create_label("a").await.unwrap().id;
        repo.add_label_refs(&[LabelRef::new(n1, a)]).await.unwrap();
        let before = repo.current_labels().version;

        let changed = repo
            .set_notes_labels(&[n1], &BTreeSet::from([a]))
            .await
            .unwrap();

        assert_eq!(changed, 0);
        assert_eq!(repo.current_labels().version, before);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_notes_labels_keeps_earlier_notes_on_failure() {
        let repo = Repository::open_in_memory().unwrap();
        let n1 = note(&repo, "one").await;
        let a = repo.create_label("a").await.unwrap().id;
        let before = repo.current_labels().version;

        let result = repo
            .set_notes_labels(&[n1, NoteId(9_999)], &BTreeSet::from([a]))
            .await;

        assert!(result.is_err());
        assert_eq!(label_ids(&repo, n1).await, BTreeSet::from([a]));
        assert_eq!(repo.current_labels().version, before + 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn common_label_ids_intersects() {
        let repo = Repository::open_in_memory().unwrap();
        let n1 = note(&repo, "one").await;
        let n2 = note(&repo, "two").await;
        let a = repo.create_label("a").await.unwrap().id;
        let b = repo.create_label("b").await.unwrap().id;
        repo.add_label_refs(&[
            LabelRef::new(n1, a),
            LabelRef::new(n1, b),
            LabelRef::new(n2, b),
        ])
        .await
        .unwrap();

        assert_eq!(
            repo.common_label_ids(&[n1, n2]).await.unwrap(),
            BTreeSet::from([b])
        );
        assert!(repo.common_label_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn note_lists_and_trash() {
        let repo = Repository::open_in_memory().unwrap();
        let keep = note(&repo, "keep").await;
        let archived = note(&repo, "archive me").await;
        let trashed = note(&repo, "trash me").await;

        repo.archive_notes(&[archived]).await.unwrap();
        repo.trash_notes(&[trashed]).await.unwrap();

        let active = repo.notes_by_status(NoteStatus::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep);

        repo.restore_notes(&[archived]).await.unwrap();
        assert_eq!(
            repo.notes_by_status(NoteStatus::Active).await.unwrap().len(),
            2
        );

        assert_eq!(repo.empty_trash().await.unwrap(), 1);
        assert!(repo.note(trashed).await.unwrap().is_none());
        assert_eq!(repo.all_notes().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deleting_a_note_republishes_usage_order() {
        let repo = Repository::open_in_memory().unwrap();
        let n1 = note(&repo, "one").await;
        let n2 = note(&repo, "two").await;
        let a = repo.create_label("a").await.unwrap();
        let b = repo.create_label("b").await.unwrap();
        repo.add_label_refs(&[LabelRef::new(n1, b.id), LabelRef::new(n2, b.id)])
            .await
            .unwrap();
        repo.add_label_refs(&[LabelRef::new(n1, a.id)]).await.unwrap();
        assert_eq!(repo.current_labels().labels, vec![b.clone(), a.clone()]);

        for id in [n1, n2] {
            let stored = repo.note(id).await.unwrap().unwrap();
            repo.delete_note(&stored).await.unwrap();
        }
        assert_eq!(repo.current_labels().labels, vec![a, b]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn view_state_roundtrip() {
        let repo = Repository::open_in_memory().unwrap();
        repo.save_view_state("slot", &vec![1_i64, 2]).await.unwrap();

        let loaded: Option<Vec<i64>> = repo.load_view_state("slot").await.unwrap();
        assert_eq!(loaded, Some(vec![1, 2]));

        repo.clear_view_state("slot").await.unwrap();
        let cleared: Option<Vec<i64>> = repo.load_view_state("slot").await.unwrap();
        assert!(cleared.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn committed_write_survives_failed_snapshot_refresh() {
        let repo = Repository::open_in_memory().unwrap();
        let id = note(&repo, "doomed").await;
        let stored = repo.note(id).await.unwrap().unwrap();
        let before = repo.current_labels().version;

        // The by-usage query joins label_refs, so the refresh fails after the delete commits
        repo.db
            .lock()
            .await
            .connection()
            .execute_batch("DROP TABLE label_refs")
            .unwrap();

        repo.delete_note(&stored).await.unwrap();
        assert!(repo.note(id).await.unwrap().is_none());
        assert_eq!(repo.current_labels().version, before);
    }
}
