//! Restart-survivable shape of the label screen state

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::LabelId;

/// Bump when the shape of [`SavedLabelsState`] changes
pub const LABELS_STATE_VERSION: u32 = 1;

/// Selection and rename flag persisted across process restarts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLabelsState {
    pub version: u32,
    pub selected_ids: Vec<LabelId>,
    pub renaming: bool,
}

impl SavedLabelsState {
    #[must_use]
    pub fn new(selected_ids: impl IntoIterator<Item = LabelId>, renaming: bool) -> Self {
        let selected_ids = selected_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self {
            version: LABELS_STATE_VERSION,
            selected_ids,
            renaming,
        }
    }

    /// Whether this state was written by the current shape
    #[must_use]
    pub const fn is_current(&self) -> bool {
        self.version == LABELS_STATE_VERSION
    }
}
