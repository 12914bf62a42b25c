use std::path::PathBuf;

use clap::Parser;
use pretty_assertions::assert_eq;
use quill_core::config::Config;
use quill_core::services::Repository;
use quill_core::{Label, LabelId, LabelRef, Note, NoteId, NoteStatus};

use crate::cli::{Cli, Commands, CompletionShell, LabelCommands, StatusArg};
use crate::commands::assign::assign_labels;
use crate::commands::common::{
    find_label, format_note_lines, format_relative_time, format_timestamp, normalize_content,
    normalize_search_query, note_preview, note_to_list_item, parse_note_ids, resolve_db_path,
};
use crate::commands::completions::render_completions;
use crate::commands::labels::{delete_labels, format_label_lines, LabelListItem};
use crate::commands::list::list_notes;
use crate::error::CliError;

fn label(id: i64, name: &str) -> Label {
    Label {
        id: LabelId(id),
        name: name.to_string(),
    }
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_search_query_rejects_blank() {
    assert!(matches!(
        normalize_search_query("   "),
        Err(CliError::EmptySearchQuery)
    ));
    assert_eq!(normalize_search_query(" milk ").unwrap(), "milk");
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn format_timestamp_returns_utc_label() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn note_preview_falls_back_to_content_and_truncates() {
    let note = Note::new("", "This is a very long sentence that should be shortened\nsecond");
    assert_eq!(note_preview(&note, 20), "This is a very lo...");

    let titled = Note::new("Groceries", "milk");
    assert_eq!(note_preview(&titled, 20), "Groceries");
}

#[test]
fn note_lines_show_labels_and_pin() {
    let mut note = Note::new("Groceries", "milk");
    note.id = NoteId(3);
    note.pinned = true;
    let item = note_to_list_item(&note, &[label(1, "home")]);

    let lines = format_note_lines(&[item]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("     3* Groceries"));
    assert!(lines[0].ends_with("[home]"));
}

#[test]
fn label_lines_include_usage() {
    let lines = format_label_lines(&[LabelListItem {
        id: 2,
        name: "work".to_string(),
        notes: 4,
    }]);
    assert!(lines[0].contains("work"));
    assert!(lines[0].ends_with("4 note(s)"));
}

#[test]
fn parse_note_ids_sorts_dedups_and_rejects_garbage() {
    let ids = parse_note_ids(&["3".to_string(), " 1".to_string(), "3".to_string()]).unwrap();
    assert_eq!(ids, vec![NoteId(1), NoteId(3)]);

    assert!(matches!(
        parse_note_ids(&["abc".to_string()]),
        Err(CliError::InvalidNoteId(raw)) if raw == "abc"
    ));
    assert!(parse_note_ids(&["0".to_string()]).is_err());
}

#[test]
fn find_label_prefers_id_then_name() {
    let labels = vec![label(1, "Work"), label(2, "1"), label(3, "home")];

    assert_eq!(find_label(&labels, "1").unwrap().id, LabelId(1));
    assert_eq!(find_label(&labels, "work").unwrap().id, LabelId(1));
    assert_eq!(find_label(&labels, " HOME ").unwrap().id, LabelId(3));
    assert!(matches!(
        find_label(&labels, "missing"),
        Err(CliError::LabelNotFound(_))
    ));

    let duplicated = vec![label(1, "todo"), label(2, "TODO")];
    assert!(matches!(
        find_label(&duplicated, "todo"),
        Err(CliError::AmbiguousLabel(_))
    ));
}

#[test]
fn status_arg_maps_trash_to_deleted() {
    assert_eq!(NoteStatus::from(StatusArg::Trash), NoteStatus::Deleted);
    assert_eq!(NoteStatus::from(StatusArg::Archived), NoteStatus::Archived);
}

#[test]
fn cli_parses_assign_lists() {
    let cli = Cli::try_parse_from(["quill", "assign", "--notes", "1,2", "--labels", "home,work"])
        .unwrap();
    match cli.command {
        Some(Commands::Assign { notes, labels }) => {
            assert_eq!(notes, vec!["1", "2"]);
            assert_eq!(labels, vec!["home", "work"]);
        }
        _ => panic!("expected assign command"),
    }
}

#[test]
fn cli_parses_label_delete_confirmation() {
    let cli = Cli::try_parse_from(["quill", "label", "delete", "old", "--yes"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Label {
            command: LabelCommands::Delete { yes: true, .. }
        })
    ));
}

#[test]
fn cli_db_path_overrides_config() {
    let config = Config::from_lookup(|_| None);
    assert_eq!(resolve_db_path(None, &config), config.db_path);
    assert_eq!(
        resolve_db_path(Some(PathBuf::from("/tmp/x.db")), &config),
        PathBuf::from("/tmp/x.db")
    );
}

#[test]
fn completions_mention_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("quill"));
}

async fn seeded() -> (Repository, NoteId, Label, Label) {
    let repo = Repository::open_in_memory().unwrap();
    let note = repo
        .create_note(&Note::new("Groceries", "milk"))
        .await
        .unwrap()
        .id;
    let used = repo.create_label("used").await.unwrap();
    let unused = repo.create_label("unused").await.unwrap();
    repo.add_label_refs(&[LabelRef::new(note, used.id)])
        .await
        .unwrap();
    (repo, note, used, unused)
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_labels_requires_confirmation_when_in_use() {
    let (repo, note, used, unused) = seeded().await;

    let error = delete_labels(repo.clone(), &[used.clone(), unused.clone()], false)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::LabelsInUse { count: 1 }));
    assert_eq!(repo.all_labels().await.unwrap().len(), 2);

    let deleted = delete_labels(repo.clone(), &[used, unused], true)
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert!(repo.labels_for_note(note).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_unused_label_needs_no_confirmation() {
    let (repo, _, used, unused) = seeded().await;

    let deleted = delete_labels(repo.clone(), &[unused], false).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(repo.all_labels().await.unwrap(), vec![used]);
}

#[tokio::test(flavor = "multi_thread")]
async fn assign_labels_replaces_note_labels() {
    let (repo, note, used, unused) = seeded().await;
    let other = repo.create_note(&Note::new("Other", "")).await.unwrap().id;

    assign_labels(repo.clone(), vec![note, other], std::slice::from_ref(&unused))
        .await
        .unwrap();
    assert_eq!(repo.labels_for_note(note).await.unwrap(), vec![unused.clone()]);
    assert_eq!(repo.labels_for_note(other).await.unwrap(), vec![unused]);
    assert_eq!(repo.count_label_refs(&[used.id]).await.unwrap(), 0);

    assign_labels(repo.clone(), vec![note], &[]).await.unwrap();
    assert!(repo.labels_for_note(note).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn repository_file_is_created_under_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("quill.db");

    let repo = crate::commands::common::open_repository(&db_path).unwrap();
    repo.create_note(&Note::new("persisted", "")).await.unwrap();
    drop(repo);

    let reopened = crate::commands::common::open_repository(&db_path).unwrap();
    assert_eq!(reopened.all_notes().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_by_label_reaches_trash() {
    let (repo, note, used, _) = seeded().await;
    let kept = repo.create_note(&Note::new("Kept", "")).await.unwrap().id;
    repo.add_label_refs(&[LabelRef::new(kept, used.id)])
        .await
        .unwrap();
    repo.trash_notes(&[note]).await.unwrap();

    let trashed = list_notes(&repo, NoteStatus::Deleted, Some("used"))
        .await
        .unwrap();
    assert_eq!(trashed.iter().map(|n| n.id).collect::<Vec<_>>(), vec![note]);

    let active = list_notes(&repo, NoteStatus::Active, Some("used"))
        .await
        .unwrap();
    assert_eq!(active.iter().map(|n| n.id).collect::<Vec<_>>(), vec![kept]);
}
