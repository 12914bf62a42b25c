//! quill-core - Core library for Quill
//!
//! This crate contains the models, `SQLite` stores, the repository service and
//! the label management view state shared by every Quill client.

pub mod backup;
pub mod config;
pub mod db;
pub mod error;
pub mod labels;
pub mod models;
pub mod services;

pub use error::{Error, Result};
pub use models::{Label, LabelId, LabelRef, Note, NoteId, NoteStatus};
