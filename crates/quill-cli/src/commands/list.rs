use std::path::Path;

use quill_core::services::Repository;
use quill_core::{Note, NoteStatus};

use crate::commands::common::{
    find_label, format_timestamp, note_items, open_repository, print_notes, require_note,
};
use crate::error::CliError;

pub async fn run_list(
    status: NoteStatus,
    label: Option<&str>,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    let mut notes = list_notes(&repo, status, label).await?;
    notes.truncate(limit);

    print_notes(&note_items(&repo, &notes).await?, as_json)
}

/// Notes in one list, optionally restricted to a label (id or name).
pub async fn list_notes(
    repo: &Repository,
    status: NoteStatus,
    label: Option<&str>,
) -> Result<Vec<Note>, CliError> {
    let Some(query) = label else {
        return Ok(repo.notes_by_status(status).await?);
    };
    let label = find_label(&repo.all_labels().await?, query)?;
    Ok(repo.notes_by_label_and_status(label.id, status).await?)
}

pub async fn run_show(id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    let note = require_note(&repo, id).await?;
    print_note(&repo, &note, as_json).await
}

pub async fn run_last(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    match repo.last_modified_note().await? {
        Some(note) => print_note(&repo, &note, as_json).await,
        None => {
            if as_json {
                println!("null");
            }
            Ok(())
        }
    }
}

async fn print_note(repo: &Repository, note: &Note, as_json: bool) -> Result<(), CliError> {
    let items = note_items(repo, std::slice::from_ref(note)).await?;
    let Some(item) = items.first() else {
        return Ok(());
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(item)?);
        return Ok(());
    }

    println!("id:       {}", item.id);
    println!("status:   {}", item.status);
    println!("pinned:   {}", item.pinned);
    println!("created:  {}", format_timestamp(item.created_at));
    println!("modified: {} ({})", format_timestamp(item.modified_at), item.relative_time);
    if !item.labels.is_empty() {
        println!("labels:   {}", item.labels.join(", "));
    }
    if !item.title.is_empty() {
        println!();
        println!("{}", item.title);
    }
    if !item.content.is_empty() {
        println!();
        println!("{}", item.content);
    }
    Ok(())
}
