use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quill_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Invalid note ID: {0}")]
    InvalidNoteId(String),
    #[error("Note not found: {0}")]
    NoteNotFound(String),
    #[error("Label not found: {0}")]
    LabelNotFound(String),
    #[error("Label name '{0}' matches several labels; use the label id")]
    AmbiguousLabel(String),
    #[error("{count} note(s) still use these labels; pass --yes to delete anyway")]
    LabelsInUse { count: usize },
    #[error("{0}")]
    Operation(String),
}
