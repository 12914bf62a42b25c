//! Label list row

use serde::{Deserialize, Serialize};

use crate::models::{Label, LabelId};

/// A label as shown in the list, with its transient checked state.
///
/// Rebuilt from the label and the current selection on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelListItem {
    pub id: LabelId,
    pub label: Label,
    pub checked: bool,
}

impl LabelListItem {
    #[must_use]
    pub fn new(label: Label, checked: bool) -> Self {
        Self {
            id: label.id,
            label,
            checked,
        }
    }
}
