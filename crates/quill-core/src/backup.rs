//! JSON backup export and import shared by all clients.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Label, LabelId, LabelRef, Note, NoteId};
use crate::services::Repository;
use crate::{Error, Result};

/// Backup layout written by this version
pub const BACKUP_FORMAT_VERSION: u32 = 1;

/// Everything needed to rebuild a note database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub format_version: u32,
    /// Unix ms
    pub exported_at: i64,
    pub notes: Vec<Note>,
    pub labels: Vec<Label>,
    pub label_refs: Vec<LabelRef>,
}

impl Backup {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Counts of rows written by [`import_backup`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub notes: usize,
    /// Labels created; labels matched by name to an existing one are not counted
    pub labels: usize,
    pub label_refs: usize,
}

/// Snapshot every note in every list, every label and every association.
pub async fn export_backup(repository: &Repository) -> Result<Backup> {
    let backup = Backup {
        format_version: BACKUP_FORMAT_VERSION,
        exported_at: chrono::Utc::now().timestamp_millis(),
        notes: repository.all_notes().await?,
        labels: repository.all_labels().await?,
        label_refs: repository.all_label_refs().await?,
    };
    tracing::info!(
        "Exported {} note(s), {} label(s)",
        backup.notes.len(),
        backup.labels.len()
    );
    Ok(backup)
}

/// Add a backup's contents to the repository.
///
/// Notes always get fresh ids. A label whose name already exists is reused.
/// References to notes or labels missing from the backup are skipped.
pub async fn import_backup(repository: &Repository, backup: &Backup) -> Result<ImportSummary> {
    if backup.format_version != BACKUP_FORMAT_VERSION {
        return Err(Error::InvalidInput(format!(
            "unsupported backup format version {}",
            backup.format_version
        )));
    }

    let mut summary = ImportSummary::default();

    let mut existing: HashMap<String, LabelId> = repository
        .all_labels()
        .await?
        .into_iter()
        .map(|label| (label.name, label.id))
        .collect();
    let mut label_ids = HashMap::with_capacity(backup.labels.len());
    for label in &backup.labels {
        let name = label.name.trim();
        let id = if let Some(&id) = existing.get(name) {
            id
        } else {
            let created = repository.create_label(name).await?;
            summary.labels += 1;
            existing.insert(created.name.clone(), created.id);
            created.id
        };
        label_ids.insert(label.id, id);
    }

    let mut note_ids: HashMap<NoteId, NoteId> = HashMap::with_capacity(backup.notes.len());
    for note in &backup.notes {
        let created = repository.create_note(note).await?;
        note_ids.insert(note.id, created.id);
        summary.notes += 1;
    }

    let refs = backup
        .label_refs
        .iter()
        .filter_map(|r| {
            Some(LabelRef::new(
                *note_ids.get(&r.note_id)?,
                *label_ids.get(&r.label_id)?,
            ))
        })
        .collect::<Vec<_>>();
    summary.label_refs = repository.add_label_refs(&refs).await?;

    tracing::info!(
        "Imported {} note(s), {} new label(s), {} reference(s)",
        summary.notes,
        summary.labels,
        summary.label_refs
    );
    Ok(summary)
}

/// Build a deterministic default file name for backup flows.
#[must_use]
pub fn suggested_backup_file_name(timestamp_ms: i64) -> String {
    format!("quill-backup-{timestamp_ms}.json")
}
