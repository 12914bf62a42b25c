//! View-state reducer for the label screen.
//!
//! The reducer never talks to storage. Label lists arrive as
//! [`LabelSnapshot`]s, user events arrive as method calls, and everything the
//! screen must react to once (dialogs, closing) leaves through an outbound
//! command queue drained with [`LabelsReducer::drain_commands`].

use std::collections::{BTreeSet, VecDeque};

use crate::labels::{LabelListItem, SavedLabelsState};
use crate::models::{Label, LabelId, NoteId};
use crate::services::LabelSnapshot;

/// The two uses of the label screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelsMode {
    /// Editing the global label set
    Manage,
    /// Picking the labels a set of notes should carry
    Assign { note_ids: Vec<NoteId> },
}

impl LabelsMode {
    #[must_use]
    pub const fn is_manage(&self) -> bool {
        matches!(self, Self::Manage)
    }
}

/// One-shot signals for the owning screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelsCommand {
    /// Ask before deleting labels that `count` note associations still use
    ConfirmDelete { count: usize },
    /// Open the rename dialog for a label
    ShowRenameDialog { label_id: LabelId },
    /// Close the screen
    Exit,
    /// A store operation failed
    ShowError(String),
}

/// Outcome of a delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteDecision {
    /// Nothing is selected
    Nothing,
    /// A `ConfirmDelete` command was queued
    NeedsConfirmation,
    /// The selection is unused and can be deleted right away
    Delete(Vec<LabelId>),
}

/// What the screen renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelsView {
    pub items: Vec<LabelListItem>,
    pub placeholder_visible: bool,
    /// Selected label count, only tracked while managing labels
    pub selection_count: Option<usize>,
}

/// In-memory label list with selection state.
///
/// The item list and selection are views over the stores, reconciled against
/// every delivered snapshot and never treated as the source of truth.
#[derive(Debug)]
pub struct LabelsReducer {
    mode: LabelsMode,
    items: Vec<LabelListItem>,
    selected: BTreeSet<LabelId>,
    renaming: bool,
    seen_version: u64,
    commands: VecDeque<LabelsCommand>,
    /// Selection a `ConfirmDelete` was queued for
    awaiting_confirmation: Option<BTreeSet<LabelId>>,

    selected_labels: Vec<Label>,
    placeholder_visible: bool,
    selection_count: Option<usize>,

    saved_len: usize,
    saved_renaming: bool,
    pending_save: Option<SavedLabelsState>,
}

impl LabelsReducer {
    /// Build a reducer, restoring a saved selection if one is given.
    ///
    /// The list stays empty until the first snapshot arrives; restored ids
    /// that no longer exist are dropped at that point.
    #[must_use]
    pub fn new(mode: LabelsMode, saved: Option<SavedLabelsState>) -> Self {
        let (selected, renaming) = saved
            .filter(SavedLabelsState::is_current)
            .map(|state| (state.selected_ids.into_iter().collect(), state.renaming))
            .unwrap_or_default();

        let mut reducer = Self {
            mode,
            items: Vec::new(),
            saved_len: BTreeSet::len(&selected),
            saved_renaming: renaming,
            selected,
            renaming,
            seen_version: 0,
            commands: VecDeque::new(),
            awaiting_confirmation: None,
            selected_labels: Vec::new(),
            placeholder_visible: true,
            selection_count: None,
            pending_save: None,
        };
        reducer.recompute();
        reducer
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Apply a label list delivery. Returns `false` for stale or repeated snapshots.
    pub fn on_labels(&mut self, snapshot: &LabelSnapshot) -> bool {
        if snapshot.version <= self.seen_version {
            return false;
        }
        self.seen_version = snapshot.version;

        // Any delivery while a rename is armed is taken as that rename's
        // result. An unrelated label change in between clears the selection too.
        if self.renaming {
            self.selected.clear();
            self.renaming = false;
        }

        let present = snapshot
            .labels
            .iter()
            .map(|label| label.id)
            .collect::<BTreeSet<_>>();
        self.selected.retain(|id| present.contains(id));

        self.items = snapshot
            .labels
            .iter()
            .map(|label| LabelListItem::new(label.clone(), self.selected.contains(&label.id)))
            .collect();

        self.recompute();
        true
    }

    /// Tap on a row.
    ///
    /// Toggles while assigning, or while managing with something selected.
    /// Managing with nothing selected opens the rename dialog instead.
    pub fn on_item_click(&mut self, id: LabelId) -> bool {
        if !self.contains(id) {
            return false;
        }

        if !self.mode.is_manage() || !self.selected.is_empty() {
            return self.toggle(id);
        }

        self.commands
            .push_back(LabelsCommand::ShowRenameDialog { label_id: id });
        true
    }

    /// Long press on a row; only toggles while managing labels.
    pub fn on_item_long_click(&mut self, id: LabelId) -> bool {
        self.mode.is_manage() && self.toggle(id)
    }

    /// Tap on a row's icon; only toggles while managing labels.
    pub fn on_item_icon_click(&mut self, id: LabelId) -> bool {
        self.mode.is_manage() && self.toggle(id)
    }

    /// Check every item. No-op when everything is already checked.
    pub fn select_all(&mut self) -> bool {
        if self.items.iter().all(|item| item.checked) {
            return false;
        }
        self.set_all(true);
        true
    }

    /// Uncheck every item. No-op when nothing is checked.
    pub fn clear_selection(&mut self) -> bool {
        if self.selected.is_empty() {
            return false;
        }
        self.set_all(false);
        true
    }

    /// Request a rename of the single selected label.
    ///
    /// Arms the renaming flag so the next delivery clears the selection.
    /// Returns `false` and changes nothing unless exactly one label is selected.
    pub fn rename_selection(&mut self) -> bool {
        let selected = self.selected_ids();
        let &[label_id] = selected.as_slice() else {
            return false;
        };

        self.commands
            .push_back(LabelsCommand::ShowRenameDialog { label_id });
        self.renaming = true;
        self.recompute();
        true
    }

    /// The rename dialog was dismissed without renaming.
    pub fn on_rename_cancelled(&mut self) -> bool {
        if !self.renaming {
            return false;
        }
        self.renaming = false;
        self.recompute();
        true
    }

    /// Decide how to delete the selection given its usage count.
    pub fn delete_selection(&mut self, usage_count: usize) -> DeleteDecision {
        if self.selected.is_empty() {
            return DeleteDecision::Nothing;
        }

        if usage_count > 0 {
            self.commands
                .push_back(LabelsCommand::ConfirmDelete { count: usage_count });
            self.awaiting_confirmation = Some(self.selected.clone());
            DeleteDecision::NeedsConfirmation
        } else {
            self.awaiting_confirmation = None;
            DeleteDecision::Delete(self.selected_ids())
        }
    }

    /// The user accepted the delete confirmation.
    ///
    /// Returns the labels to delete only when a `ConfirmDelete` is
    /// outstanding for the current selection.
    pub fn confirm_delete(&mut self) -> Option<Vec<LabelId>> {
        let pending = self.awaiting_confirmation.take()?;
        (!pending.is_empty() && pending == self.selected).then(|| self.selected_ids())
    }

    /// The user dismissed the delete confirmation.
    pub fn on_delete_cancelled(&mut self) {
        self.awaiting_confirmation = None;
    }

    /// The selected labels were deleted.
    pub fn on_deleted(&mut self) {
        self.awaiting_confirmation = None;
        self.set_all(false);
    }

    /// Labels were written to the notes; the screen should close.
    pub fn on_assignment_committed(&mut self) {
        self.commands.push_back(LabelsCommand::Exit);
    }

    /// Surface a failed store operation.
    pub fn on_error(&mut self, message: impl Into<String>) {
        self.commands
            .push_back(LabelsCommand::ShowError(message.into()));
    }

    // ------------------------------------------------------------------
    // Outputs
    // ------------------------------------------------------------------

    pub const fn mode(&self) -> &LabelsMode {
        &self.mode
    }

    pub fn items(&self) -> &[LabelListItem] {
        &self.items
    }

    pub fn selected_ids(&self) -> Vec<LabelId> {
        self.selected.iter().copied().collect()
    }

    pub const fn selected_set(&self) -> &BTreeSet<LabelId> {
        &self.selected
    }

    pub fn selected_labels(&self) -> &[Label] {
        &self.selected_labels
    }

    pub const fn is_renaming(&self) -> bool {
        self.renaming
    }

    pub const fn placeholder_visible(&self) -> bool {
        self.placeholder_visible
    }

    pub const fn selection_count(&self) -> Option<usize> {
        self.selection_count
    }

    /// Version of the last applied snapshot, 0 before the first one
    pub const fn seen_version(&self) -> u64 {
        self.seen_version
    }

    pub fn view(&self) -> LabelsView {
        LabelsView {
            items: self.items.clone(),
            placeholder_visible: self.placeholder_visible,
            selection_count: self.selection_count,
        }
    }

    /// Current restart slot contents
    pub fn saved_state(&self) -> SavedLabelsState {
        SavedLabelsState::new(self.selected.iter().copied(), self.renaming)
    }

    /// State to persist, present only when the selection size or the
    /// renaming flag changed since the last write.
    pub fn take_pending_save(&mut self) -> Option<SavedLabelsState> {
        self.pending_save.take()
    }

    pub fn drain_commands(&mut self) -> Vec<LabelsCommand> {
        self.commands.drain(..).collect()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn contains(&self, id: LabelId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    fn toggle(&mut self, id: LabelId) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };

        item.checked = !item.checked;
        if item.checked {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
        self.recompute();
        true
    }

    fn set_all(&mut self, checked: bool) {
        for item in &mut self.items {
            item.checked = checked;
        }
        self.selected = if checked {
            self.items.iter().map(|item| item.id).collect()
        } else {
            BTreeSet::new()
        };
        self.recompute();
    }

    /// Refresh derived state and schedule a save when the selection size moved.
    fn recompute(&mut self) {
        self.selected_labels = self
            .items
            .iter()
            .filter(|item| item.checked)
            .map(|item| item.label.clone())
            .collect();
        self.placeholder_visible = self.items.is_empty();
        self.selection_count = self.mode.is_manage().then_some(self.selected.len());

        if self.selected.len() != self.saved_len || self.renaming != self.saved_renaming {
            self.saved_len = self.selected.len();
            self.saved_renaming = self.renaming;
            self.pending_save = Some(self.saved_state());
        }
    }
}
