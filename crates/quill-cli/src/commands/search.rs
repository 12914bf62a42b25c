use std::path::Path;

use crate::commands::common::{normalize_search_query, note_items, open_repository, print_notes};
use crate::error::CliError;

pub async fn run_search(
    query: &str,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let normalized_query = normalize_search_query(query)?;
    let repo = open_repository(db_path)?;
    let mut notes = repo.search_notes(&normalized_query).await?;
    notes.truncate(limit);

    print_notes(&note_items(&repo, &notes).await?, as_json)
}
