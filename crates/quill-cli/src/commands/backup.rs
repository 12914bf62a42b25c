use std::path::Path;

use chrono::Utc;
use quill_core::backup::{export_backup, import_backup, suggested_backup_file_name, Backup};

use crate::commands::common::open_repository;
use crate::error::CliError;

pub async fn run_export(output_path: Option<&Path>, db_path: &Path) -> Result<(), CliError> {
    let repo = open_repository(db_path)?;
    let rendered = export_backup(&repo).await?.to_json()?;

    if let Some(path) = output_path {
        let path = if path.is_dir() {
            path.join(suggested_backup_file_name(Utc::now().timestamp_millis()))
        } else {
            path.to_path_buf()
        };
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

pub async fn run_import(path: &Path, db_path: &Path) -> Result<(), CliError> {
    let backup = Backup::from_json(&std::fs::read_to_string(path)?)?;
    let repo = open_repository(db_path)?;
    let summary = import_backup(&repo, &backup).await?;

    println!(
        "{} note(s), {} label(s), {} reference(s)",
        summary.notes, summary.labels, summary.label_refs
    );
    Ok(())
}
