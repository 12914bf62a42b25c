use std::path::Path;

use quill_core::labels::{LabelsCommand, LabelsController, LabelsMode};
use quill_core::services::Repository;
use quill_core::Label;
use serde::Serialize;

use crate::commands::common::{find_label, open_repository, resolve_labels};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct LabelListItem {
    pub id: i64,
    pub name: String,
    pub notes: usize,
}

pub async fn run_label_list(by_usage: bool, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    let labels = if by_usage {
        repo.labels_by_usage().await?
    } else {
        repo.all_labels().await?
    };

    let mut items = Vec::with_capacity(labels.len());
    for label in labels {
        let notes = repo.count_label_refs(&[label.id]).await?;
        items.push(LabelListItem {
            id: label.id.0,
            name: label.name,
            notes,
        });
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for line in format_label_lines(&items) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_label_lines(items: &[LabelListItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| format!("{:>6}  {:<30}  {} note(s)", item.id, item.name, item.notes))
        .collect()
}

pub async fn run_label_add(name: &str, db_path: &Path) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    let label = repo.create_label(name).await?;

    println!("{}", label.id);
    Ok(())
}

pub async fn run_label_rename(query: &str, name: &str, db_path: &Path) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    let label = find_label(&repo.all_labels().await?, query)?;

    let mut controller = LabelsController::open(repo, LabelsMode::Manage).await?;
    controller.commit_rename(label.id, name).await;
    finish(&mut controller)?;

    println!("{}", label.id);
    Ok(())
}

pub async fn run_label_delete(
    queries: &[String],
    confirmed: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    let labels = resolve_labels(&repo, queries).await?;
    let deleted = delete_labels(repo, &labels, confirmed).await?;

    println!("{deleted}");
    Ok(())
}

/// Select `labels` on a fresh manage screen and delete them, honoring the
/// in-use confirmation. Returns how many labels were deleted.
pub async fn delete_labels(
    repo: Repository,
    labels: &[Label],
    confirmed: bool,
) -> Result<usize, CliError> {
    let mut controller = LabelsController::open(repo, LabelsMode::Manage).await?;
    controller.clear_selection().await;
    for label in labels {
        controller.long_click(label.id).await;
    }

    let before = controller.view().items.len();
    controller.request_delete().await;

    let pending = controller
        .drain_commands()
        .into_iter()
        .find_map(|command| match command {
            LabelsCommand::ConfirmDelete { count } => Some(Ok(count)),
            LabelsCommand::ShowError(message) => Some(Err(CliError::Operation(message))),
            LabelsCommand::ShowRenameDialog { .. } | LabelsCommand::Exit => None,
        })
        .transpose()?;

    if let Some(count) = pending {
        if !confirmed {
            controller.clear_selection().await;
            return Err(CliError::LabelsInUse { count });
        }
        controller.confirm_delete().await;
        finish(&mut controller)?;
    }

    Ok(before.saturating_sub(controller.view().items.len()))
}

/// Turn the first queued error into a `CliError`.
pub fn finish(controller: &mut LabelsController) -> Result<(), CliError> {
    controller
        .drain_commands()
        .into_iter()
        .find_map(|command| match command {
            LabelsCommand::ShowError(message) => Some(message),
            _ => None,
        })
        .map_or(Ok(()), |message| Err(CliError::Operation(message)))
}
