use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use stickynotes::model::{NoteFormat, SortKey};

/// `0.3.0` for tagged releases, `0.3.0@abc1234 2024-01-15` otherwise.
const BUILD_VERSION: &str = env!("STICKYNOTES_BUILD_VERSION");

#[derive(Parser, Debug)]
#[command(name = "stickynotes", version = BUILD_VERSION)]
#[command(about = "File-backed notes with a rebuildable index and optional encryption", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (overrides DATA_DIR and stickynotes.toml)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding stickynotes.toml and encryption.json
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log at info level instead of warn (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "n")]
    Create {
        /// Title, also used for the file name
        title: Option<String>,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Md)]
        format: FormatArg,
    },

    /// List notes
    #[command(alias = "ls")]
    List {
        /// Case-insensitive search over file name, title and content
        #[arg(short, long)]
        search: Option<String>,

        /// Include trashed notes
        #[arg(long)]
        deleted: bool,

        #[arg(long, value_enum, default_value_t = SortArg::Updated)]
        sort: SortArg,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print a note
    #[command(alias = "v")]
    Show {
        id: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Replace a note's content (reads stdin when TEXT is omitted)
    Save {
        id: String,
        text: Option<String>,

        /// Revision the edit was based on
        #[arg(long)]
        base_rev: Option<u64>,
    },

    /// Change pin, title, file name or subject
    Meta {
        id: String,

        #[arg(long, conflicts_with = "unpin")]
        pin: bool,

        #[arg(long)]
        unpin: bool,

        /// Display title only
        #[arg(long)]
        title: Option<String>,

        /// New title that also renames the files
        #[arg(long)]
        rename: Option<String>,

        #[arg(long)]
        subject: Option<String>,
    },

    /// Move a note to the trash
    #[command(alias = "rm")]
    Delete { id: String },

    /// Bring a note back from the trash
    Restore { id: String },

    /// Rebuild index.json from the note files
    Rebuild,

    /// Manage the encryption passphrase
    Encryption {
        #[command(subcommand)]
        action: EncryptionAction,
    },

    /// Encrypt one note
    Encrypt { id: String },

    /// Decrypt one note
    Decrypt { id: String },

    /// Import .md, .txt, .yaml and .yml files as new notes
    Import {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<PathBuf>,
    },

    /// Open or summarize journal entries
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },

    /// Show the resolved configuration
    Config,
}

#[derive(Subcommand, Debug)]
pub enum EncryptionAction {
    /// Whether a key is set and how many notes are encrypted
    Status,

    /// Set or change the passphrase
    Set {
        passphrase: String,

        /// Current passphrase, required when one is already set
        #[arg(long)]
        current: Option<String>,
    },

    /// Decrypt every note and remove the passphrase
    Disable { current: String },
}

#[derive(Subcommand, Debug)]
pub enum JournalAction {
    /// Open the entry for a date (YYYY-MM-DD, default today), creating it if needed
    Today { date: Option<String> },

    /// Print all entries of a year or month
    Digest {
        year: String,
        month: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Print JSON instead of formatted text
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Md,
    Txt,
    Yaml,
    Yml,
}

impl From<FormatArg> for NoteFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Md => NoteFormat::Markdown,
            FormatArg::Txt => NoteFormat::Text,
            FormatArg::Yaml => NoteFormat::Yaml,
            FormatArg::Yml => NoteFormat::Yml,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Updated,
    Created,
    Filename,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Updated => SortKey::Updated,
            SortArg::Created => SortKey::Created,
            SortArg::Filename => SortKey::Filename,
        }
    }
}
