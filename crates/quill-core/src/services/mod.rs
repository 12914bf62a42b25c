//! Service layer shared by Quill clients

mod repository;

pub use repository::{LabelSnapshot, Repository};
