use std::path::Path;

use quill_core::labels::{LabelsController, LabelsMode};
use quill_core::services::Repository;
use quill_core::{Label, NoteId};

use crate::commands::common::{open_repository, parse_note_ids, resolve_labels};
use crate::commands::labels::finish;
use crate::error::CliError;

pub async fn run_assign(
    notes: &[String],
    labels: &[String],
    db_path: &Path,
) -> Result<(), CliError> {
    let note_ids = parse_note_ids(notes)?;
    let repo = open_repository(db_path)?;
    for id in &note_ids {
        if repo.note(*id).await?.is_none() {
            return Err(CliError::NoteNotFound(id.to_string()));
        }
    }
    let labels = resolve_labels(&repo, labels).await?;

    assign_labels(repo, note_ids, &labels).await?;
    for label in &labels {
        println!("{}", label.name);
    }
    Ok(())
}

/// Make every note carry exactly `labels`, through an assignment screen.
pub async fn assign_labels(
    repo: Repository,
    note_ids: Vec<NoteId>,
    labels: &[Label],
) -> Result<(), CliError> {
    let mut controller = LabelsController::open(repo, LabelsMode::Assign { note_ids }).await?;
    controller.clear_selection().await;
    for label in labels {
        controller.click(label.id).await;
    }

    let committed = controller.commit_assignment().await;
    finish(&mut controller)?;
    if committed {
        Ok(())
    } else {
        Err(CliError::Operation("label assignment was not saved".to_string()))
    }
}
