//! Database layer for Quill

mod connection;
mod label_store;
mod migrations;
mod note_store;
mod sql_types;
mod view_state_store;

pub use connection::Database;
pub use label_store::{LabelStore, SqliteLabelStore};
pub use note_store::{NoteStore, SqliteNoteStore};
pub use view_state_store::{SqliteViewStateStore, ViewStateStore};
