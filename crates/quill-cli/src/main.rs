//! Quill CLI - notes, labels, archive and trash from the terminal.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use quill_core::config::Config;
use quill_core::NoteStatus;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, LabelCommands};
use crate::commands::add::run_add;
use crate::commands::assign::run_assign;
use crate::commands::backup::{run_export, run_import};
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::delete::{run_delete, run_empty_trash, run_move};
use crate::commands::labels::{run_label_add, run_label_delete, run_label_list, run_label_rename};
use crate::commands::list::{run_last, run_list, run_show};
use crate::commands::search::run_search;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path, &config);
    tracing::debug!("Using database at {}", db_path.display());

    match cli.command {
        Some(Commands::Add { title, content }) => {
            run_add(title.as_deref(), &content, &db_path).await?;
        }
        Some(Commands::List {
            status,
            label,
            limit,
            json,
        }) => run_list(status.into(), label.as_deref(), limit, json, &db_path).await?,
        Some(Commands::Search { query, limit, json }) => {
            run_search(&query, limit, json, &db_path).await?;
        }
        Some(Commands::Show { id, json }) => run_show(&id, json, &db_path).await?,
        Some(Commands::Last { json }) => run_last(json, &db_path).await?,
        Some(Commands::Archive { ids }) => run_move(&ids, NoteStatus::Archived, &db_path).await?,
        Some(Commands::Trash { ids }) => run_move(&ids, NoteStatus::Deleted, &db_path).await?,
        Some(Commands::Restore { ids }) => run_move(&ids, NoteStatus::Active, &db_path).await?,
        Some(Commands::Delete { id }) => run_delete(&id, &db_path).await?,
        Some(Commands::EmptyTrash) => run_empty_trash(&db_path).await?,
        Some(Commands::Label { command }) => match command {
            LabelCommands::List { usage, json } => run_label_list(usage, json, &db_path).await?,
            LabelCommands::Add { name } => run_label_add(&name, &db_path).await?,
            LabelCommands::Rename { label, name } => {
                run_label_rename(&label, &name, &db_path).await?;
            }
            LabelCommands::Delete { labels, yes } => {
                run_label_delete(&labels, yes, &db_path).await?;
            }
        },
        Some(Commands::Assign { notes, labels }) => run_assign(&notes, &labels, &db_path).await?,
        Some(Commands::Export { output }) => run_export(output.as_deref(), &db_path).await?,
        Some(Commands::Import { path }) => run_import(&path, &db_path).await?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None if cli.note.is_empty() => {
            run_list(NoteStatus::Active, None, 20, false, &db_path).await?;
        }
        None => run_add(None, &cli.note, &db_path).await?,
    }

    Ok(())
}
