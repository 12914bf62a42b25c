use std::path::Path;

use quill_core::NoteStatus;

use crate::commands::common::{open_repository, parse_note_ids, require_note};
use crate::error::CliError;

/// Move notes between the active, archive and trash lists.
pub async fn run_move(ids: &[String], target: NoteStatus, db_path: &Path) -> Result<(), CliError> {
    let ids = parse_note_ids(ids)?;
    let repo = open_repository(db_path)?;
    let moved = match target {
        NoteStatus::Active => repo.restore_notes(&ids).await?,
        NoteStatus::Archived => repo.archive_notes(&ids).await?,
        NoteStatus::Deleted => repo.trash_notes(&ids).await?,
    };

    println!("{moved}");
    Ok(())
}

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    let note = require_note(&repo, id).await?;

    repo.delete_note(&note).await?;
    println!("{}", note.id);
    Ok(())
}

pub async fn run_empty_trash(db_path: &Path) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    let removed = repo.empty_trash().await?;

    println!("{removed}");
    Ok(())
}
