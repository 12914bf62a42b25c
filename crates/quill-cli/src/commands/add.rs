use std::path::Path;

use quill_core::Note;

use crate::commands::common::{normalize_content, open_repository, resolve_note_content};
use crate::error::CliError;

pub async fn run_add(
    title: Option<&str>,
    content_parts: &[String],
    db_path: &Path,
) -> Result<(), CliError> {
    let title = title.and_then(normalize_content).unwrap_or_default();
    let content = resolve_note_content(content_parts)?.unwrap_or_default();
    let note = Note::new(title, content);
    if note.is_empty() {
        return Err(CliError::EmptyContent);
    }

    let repo = open_repository(db_path)?;
    let note = repo.create_note(&note).await?;

    println!("{}", note.id);
    Ok(())
}
