//! Couples a [`LabelsReducer`] to the repository for one label screen.

use std::collections::BTreeSet;

use tokio::sync::watch;

use crate::labels::{
    DeleteDecision, LabelsCommand, LabelsMode, LabelsReducer, LabelsView, SavedLabelsState,
};
use crate::models::{Label, LabelId};
use crate::services::{LabelSnapshot, Repository};
use crate::{Error, Result};

/// Restart slot used while managing labels
pub const MANAGE_LABELS_STATE_KEY: &str = "labels.manage";
/// Prefix of the restart slots used while assigning labels to notes.
///
/// Each set of target notes gets its own slot, see [`labels_state_key`].
pub const ASSIGN_LABELS_STATE_KEY: &str = "labels.assign";

/// Restart slot for a label screen in `mode`.
///
/// Assign mode is keyed by the sorted target note ids, so an abandoned
/// selection is only restored for the same notes.
pub fn labels_state_key(mode: &LabelsMode) -> String {
    match mode {
        LabelsMode::Manage => MANAGE_LABELS_STATE_KEY.to_string(),
        LabelsMode::Assign { note_ids } => {
            let ids = note_ids
                .iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            format!("{ASSIGN_LABELS_STATE_KEY}.{ids}")
        }
    }
}

/// Screen controller for managing labels or assigning them to notes.
///
/// Store failures during user actions are not returned; they are queued as
/// [`LabelsCommand::ShowError`] for the screen to display.
pub struct LabelsController {
    repository: Repository,
    reducer: LabelsReducer,
    labels: watch::Receiver<LabelSnapshot>,
    view: watch::Sender<LabelsView>,
    state_key: String,
}

impl LabelsController {
    /// Restore the screen's saved state and apply the current label list.
    ///
    /// When assigning with nothing saved, the selection starts from the
    /// labels every target note already carries.
    pub async fn open(repository: Repository, mode: LabelsMode) -> Result<Self> {
        let state_key = labels_state_key(&mode);

        let saved = match repository
            .load_view_state::<SavedLabelsState>(&state_key)
            .await?
        {
            Some(state) if state.is_current() => Some(state),
            Some(state) => {
                tracing::warn!(
                    "Ignoring label screen state v{} (expected v{})",
                    state.version,
                    super::LABELS_STATE_VERSION
                );
                None
            }
            None => None,
        };

        let saved = match (&mode, saved) {
            (_, Some(state)) => Some(state),
            (LabelsMode::Assign { note_ids }, None) => Some(SavedLabelsState::new(
                repository.common_label_ids(note_ids).await?,
                false,
            )),
            (LabelsMode::Manage, None) => None,
        };

        let reducer = LabelsReducer::new(mode, saved);
        let labels = repository.subscribe_labels();
        let (view, _) = watch::channel(reducer.view());

        let mut controller = Self {
            repository,
            reducer,
            labels,
            view,
            state_key,
        };
        controller.refresh().await;
        Ok(controller)
    }

    /// Observe the rendered view
    pub fn subscribe_view(&self) -> watch::Receiver<LabelsView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> LabelsView {
        self.reducer.view()
    }

    pub const fn reducer(&self) -> &LabelsReducer {
        &self.reducer
    }

    pub fn selected_labels(&self) -> &[Label] {
        self.reducer.selected_labels()
    }

    /// Take the one-shot commands queued since the last call
    pub fn drain_commands(&mut self) -> Vec<LabelsCommand> {
        self.reducer.drain_commands()
    }

    /// Apply the newest label snapshot. Returns `false` if it was already applied.
    pub async fn refresh(&mut self) -> bool {
        let snapshot = self.labels.borrow_and_update().clone();
        let applied = self.reducer.on_labels(&snapshot);
        self.settle().await;
        applied
    }

    /// Wait for the repository to publish a new label list and apply it.
    ///
    /// Returns `false` once the repository is gone. Owners run this in the
    /// screen's task and drop the future on teardown.
    pub async fn next_labels(&mut self) -> bool {
        if self.labels.changed().await.is_err() {
            return false;
        }
        self.refresh().await;
        true
    }

    pub async fn click(&mut self, id: LabelId) -> bool {
        let changed = self.reducer.on_item_click(id);
        self.settle().await;
        changed
    }

    pub async fn long_click(&mut self, id: LabelId) -> bool {
        let changed = self.reducer.on_item_long_click(id);
        self.settle().await;
        changed
    }

    pub async fn icon_click(&mut self, id: LabelId) -> bool {
        let changed = self.reducer.on_item_icon_click(id);
        self.settle().await;
        changed
    }

    pub async fn select_all(&mut self) -> bool {
        let changed = self.reducer.select_all();
        self.settle().await;
        changed
    }

    pub async fn clear_selection(&mut self) -> bool {
        let changed = self.reducer.clear_selection();
        self.settle().await;
        changed
    }

    /// Ask to rename the single selected label
    pub async fn rename_selection(&mut self) -> bool {
        let changed = self.reducer.rename_selection();
        self.settle().await;
        changed
    }

    pub async fn cancel_rename(&mut self) {
        self.reducer.on_rename_cancelled();
        self.settle().await;
    }

    /// Store the new name from the rename dialog
    pub async fn commit_rename(&mut self, id: LabelId, name: &str) {
        match self.repository.rename_label(id, name).await {
            Ok(_) => {
                self.refresh().await;
            }
            Err(error) => {
                self.report(&error);
                self.settle().await;
            }
        }
    }

    pub async fn create_label(&mut self, name: &str) -> Option<Label> {
        match self.repository.create_label(name).await {
            Ok(label) => {
                self.refresh().await;
                Some(label)
            }
            Err(error) => {
                self.report(&error);
                self.settle().await;
                None
            }
        }
    }

    /// Delete the selection, asking first if any selected label is in use
    pub async fn request_delete(&mut self) {
        let ids = self.reducer.selected_ids();
        if ids.is_empty() {
            return;
        }

        let usage = match self.repository.count_label_refs(&ids).await {
            Ok(usage) => usage,
            Err(error) => {
                self.report(&error);
                self.settle().await;
                return;
            }
        };

        match self.reducer.delete_selection(usage) {
            DeleteDecision::Delete(ids) => self.delete_labels(&ids).await,
            DeleteDecision::NeedsConfirmation | DeleteDecision::Nothing => self.settle().await,
        }
    }

    /// The user confirmed deleting labels that are in use
    ///
    /// Ignored unless a `ConfirmDelete` is outstanding for the current selection.
    pub async fn confirm_delete(&mut self) {
        if let Some(ids) = self.reducer.confirm_delete() {
            self.delete_labels(&ids).await;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.reducer.on_delete_cancelled();
    }

    async fn delete_labels(&mut self, ids: &[LabelId]) {
        match self.repository.delete_labels(ids).await {
            Ok(_) => {
                self.reducer.on_deleted();
                self.refresh().await;
            }
            Err(error) => {
                self.report(&error);
                self.settle().await;
            }
        }
    }

    /// Write the selection to every target note and close the screen.
    ///
    /// Returns `false` when not assigning or when the write failed.
    pub async fn commit_assignment(&mut self) -> bool {
        let LabelsMode::Assign { note_ids } = self.reducer.mode().clone() else {
            return false;
        };

        let desired = self.reducer.selected_set().clone();
        let committed = match self.repository.set_notes_labels(&note_ids, &desired).await {
            Ok(_) => {
                if let Err(error) = self.repository.clear_view_state(&self.state_key).await {
                    tracing::warn!("Failed to clear label screen state: {error}");
                }
                self.reducer.on_assignment_committed();
                true
            }
            Err(error) => {
                self.report(&error);
                false
            }
        };
        self.settle().await;
        committed
    }

    fn report(&mut self, error: &Error) {
        tracing::warn!("Label screen operation failed: {error}");
        self.reducer.on_error(error.to_string());
    }

    /// Persist a pending restart slot write and publish the view.
    async fn settle(&mut self) {
        if let Some(state) = self.reducer.take_pending_save() {
            if let Err(error) = self
                .repository
                .save_view_state(&self.state_key, &state)
                .await
            {
                self.report(&error);
            }
        }
        self.view.send_replace(self.reducer.view());
    }
}
