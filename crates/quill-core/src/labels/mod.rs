//! Label management screen state.
//!
//! [`LabelsReducer`] is the pure view-state machine; [`LabelsController`]
//! wires it to a [`crate::services::Repository`] for one screen.

mod controller;
mod item;
mod reducer;
mod state;

pub use controller::{
    labels_state_key, LabelsController, ASSIGN_LABELS_STATE_KEY, MANAGE_LABELS_STATE_KEY,
};
pub use item::LabelListItem;
pub use reducer::{DeleteDecision, LabelsCommand, LabelsMode, LabelsReducer, LabelsView};
pub use state::{SavedLabelsState, LABELS_STATE_VERSION};
