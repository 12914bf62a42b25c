use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quill_core::NoteStatus;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Notes with labels, archive and trash from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Quick capture: quill "my note here"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        #[arg(short, long)]
        title: Option<String>,
        /// Note content (read from stdin when omitted)
        content: Vec<String>,
    },
    /// List notes in one list, most recently modified first
    List {
        /// Which list to show
        #[arg(long, value_enum, default_value_t = StatusArg::Active)]
        status: StatusArg,
        /// Only notes carrying this label (id or name)
        #[arg(long)]
        label: Option<String>,
        /// Number of notes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Full-text search over titles and content
    Search {
        /// Search query
        query: String,
        /// Number of notes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one note with its labels
    Show {
        /// Note ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most recently modified note
    Last {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move notes to the archive
    Archive {
        /// Note IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Move notes to the trash
    Trash {
        /// Note IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Move archived or trashed notes back to the active list
    Restore {
        /// Note IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Permanently delete a note
    Delete {
        /// Note ID
        id: String,
    },
    /// Permanently delete every trashed note
    EmptyTrash,
    /// Manage labels
    Label {
        #[command(subcommand)]
        command: LabelCommands,
    },
    /// Set the exact labels a set of notes carries
    Assign {
        /// Note IDs
        #[arg(long, required = true, value_delimiter = ',')]
        notes: Vec<String>,
        /// Labels (id or name); omit to remove every label
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,
    },
    /// Write a JSON backup of every note and label
    Export {
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Add the contents of a JSON backup
    Import {
        /// Backup file
        path: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum LabelCommands {
    /// List labels
    List {
        /// Order by how many notes use each label
        #[arg(long)]
        usage: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a label
    Add {
        /// Label name
        name: String,
    },
    /// Rename a label
    Rename {
        /// Label id or current name
        label: String,
        /// New name
        name: String,
    },
    /// Delete labels and detach them from every note
    Delete {
        /// Label ids or names
        #[arg(required = true)]
        labels: Vec<String>,
        /// Delete even if notes still use the labels
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Active,
    Archived,
    Trash,
}

impl From<StatusArg> for NoteStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Active => Self::Active,
            StatusArg::Archived => Self::Archived,
            StatusArg::Trash => Self::Deleted,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
