//! Data models for Quill

mod label;
mod note;

pub use label::{normalize_label_name, Label, LabelId, LabelRef};
pub use note::{Note, NoteId, NoteStatus};
