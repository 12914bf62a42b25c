use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use chrono::Utc;
use quill_core::config::Config;
use quill_core::services::Repository;
use quill_core::{Label, LabelId, Note, NoteId};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: i64,
    pub status: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    pub pinned: bool,
    pub created_at: i64,
    pub modified_at: i64,
    pub relative_time: String,
    pub labels: Vec<String>,
}

pub fn open_repository(db_path: &Path) -> Result<Repository, CliError> {
    Ok(Repository::open_path(db_path)?)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &Config) -> PathBuf {
    cli_db_path.unwrap_or_else(|| config.db_path.clone())
}

pub fn parse_note_id(raw: &str) -> Result<NoteId, CliError> {
    raw.parse::<NoteId>()
        .ok()
        .filter(|id| id.is_saved())
        .ok_or_else(|| CliError::InvalidNoteId(raw.trim().to_string()))
}

pub fn parse_note_ids(raw: &[String]) -> Result<Vec<NoteId>, CliError> {
    let mut ids = raw
        .iter()
        .map(|id| parse_note_id(id))
        .collect::<Result<Vec<_>, _>>()?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

pub async fn require_note(repo: &Repository, raw_id: &str) -> Result<Note, CliError> {
    let id = parse_note_id(raw_id)?;
    repo.note(id)
        .await?
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))
}

/// Find a label by id, falling back to a case-insensitive name match.
pub fn find_label(labels: &[Label], query: &str) -> Result<Label, CliError> {
    let query = query.trim();
    if let Ok(id) = query.parse::<LabelId>() {
        if let Some(label) = labels.iter().find(|label| label.id == id) {
            return Ok(label.clone());
        }
    }

    let mut matches = labels
        .iter()
        .filter(|label| label.name.eq_ignore_ascii_case(query));
    match (matches.next(), matches.next()) {
        (Some(label), None) => Ok(label.clone()),
        (Some(_), Some(_)) => Err(CliError::AmbiguousLabel(query.to_string())),
        (None, _) => Err(CliError::LabelNotFound(query.to_string())),
    }
}

pub async fn resolve_labels(repo: &Repository, queries: &[String]) -> Result<Vec<Label>, CliError> {
    let labels = repo.all_labels().await?;
    let mut resolved = queries
        .iter()
        .map(|query| find_label(&labels, query))
        .collect::<Result<Vec<_>, _>>()?;
    resolved.sort_by_key(|label| label.id);
    resolved.dedup_by_key(|label| label.id);
    Ok(resolved)
}

pub async fn note_items(repo: &Repository, notes: &[Note]) -> Result<Vec<NoteListItem>, CliError> {
    let mut items = Vec::with_capacity(notes.len());
    for note in notes {
        let labels = repo.labels_for_note(note.id).await?;
        items.push(note_to_list_item(note, &labels));
    }
    Ok(items)
}

pub fn note_to_list_item(note: &Note, labels: &[Label]) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();

    NoteListItem {
        id: note.id.0,
        status: note.status.to_string(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        pinned: note.pinned,
        created_at: note.created_at,
        modified_at: note.modified_at,
        relative_time: format_relative_time(note.modified_at, now_ms),
        labels: labels.iter().map(|label| label.name.clone()).collect(),
    }
}

pub fn format_note_lines(items: &[NoteListItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let pin = if item.pinned { "*" } else { " " };
            let line = format!(
                "{:>6}{pin} {:<40}  {}",
                item.id, item.preview, item.relative_time
            );
            if item.labels.is_empty() {
                line
            } else {
                let labels = item
                    .labels
                    .iter()
                    .map(|name| format!("[{name}]"))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{line:<62}  {labels}")
            }
        })
        .collect()
}

pub fn print_notes(items: &[NoteListItem], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        for line in format_note_lines(items) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.title_preview(usize::MAX);
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Content from the arguments, or from piped stdin when none were given.
pub fn resolve_note_content(content_parts: &[String]) -> Result<Option<String>, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(Some(content));
    }
    read_piped_stdin()
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}
