pub mod add;
pub mod assign;
pub mod backup;
pub mod common;
pub mod completions;
pub mod delete;
pub mod labels;
pub mod list;
pub mod search;
