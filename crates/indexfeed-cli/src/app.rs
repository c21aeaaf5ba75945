//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use indexfeed_core::{HeaderVersion, IndexFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "indexfeed")]
#[command(
    author,
    version,
    about = "Feed files, databases and mail into Swish-e indexes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "INDEXFEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an index from a source
    Index(IndexArgs),

    /// Add a single file to an existing index
    Add(AddArgs),

    /// Merge source indexes into a target index
    Merge(MergeArgs),

    /// Delete an index and its associated files
    Rm(RemoveArgs),

    /// Rename an index and its associated files
    Mv(RenameArgs),

    /// Search an index
    Search(SearchArgs),

    /// List the files that make up an index
    Files(FilesArgs),
}

/// Options shared by commands that run the indexer
#[derive(Args, Clone, Default)]
pub struct IndexerOpts {
    /// Index layout
    #[arg(long = "index-format", value_enum)]
    pub index_format: Option<IndexFormatArg>,

    /// Header label table
    #[arg(long, value_enum)]
    pub headers: Option<HeaderVersionArg>,

    /// Extra option passed to swish-e (repeatable)
    #[arg(long = "swish-option", allow_hyphen_values = true)]
    pub swish_options: Vec<String>,

    /// Show indexer output
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub source: IndexSource,

    /// Index to create
    #[arg(short = 'f', long, required_unless_present = "stdout")]
    pub index: Option<PathBuf>,

    /// Write the framed document stream to stdout instead of running swish-e
    #[arg(long, conflicts_with = "index")]
    pub stdout: bool,

    #[command(flatten)]
    pub indexer: IndexerOpts,
}

#[derive(Subcommand)]
pub enum IndexSource {
    /// Files and directory trees
    Fs {
        /// Files or directories to index
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only index these extensions (repeatable)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Rule line, e.g. "FileRules dirname contains tmp" (repeatable)
        #[arg(long = "rule")]
        rules: Vec<String>,

        /// Follow symlinked directories
        #[arg(long)]
        follow_symlinks: bool,

        /// Skip documents larger than this many bytes
        #[arg(long)]
        max_size: Option<u64>,
    },

    /// Rows of a SQLite database
    Db {
        /// Database file
        database: PathBuf,

        /// Tables to index (all tables when omitted)
        #[arg(long = "table")]
        tables: Vec<String>,

        /// Column used as the document title
        #[arg(long)]
        title_column: Option<String>,

        /// Column used as the document url
        #[arg(long)]
        url_column: Option<String>,

        /// Column wrapped as the result description (repeatable)
        #[arg(long = "description-column")]
        description_columns: Vec<String>,
    },

    /// Messages of a Maildir tree
    Mail {
        /// Maildir root
        maildir: PathBuf,
    },
}

#[derive(Args)]
pub struct AddArgs {
    /// Target index
    pub index: PathBuf,

    /// File to add
    pub file: PathBuf,

    /// Url to record instead of the file path
    #[arg(long)]
    pub url: Option<String>,

    /// Content type (guessed from the extension when omitted)
    #[arg(long)]
    pub mime: Option<String>,

    #[command(flatten)]
    pub indexer: IndexerOpts,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Target index
    pub index: PathBuf,

    /// Source indexes (at least two)
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    #[command(flatten)]
    pub indexer: IndexerOpts,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Index to delete
    pub index: PathBuf,

    #[arg(long = "index-format", value_enum)]
    pub index_format: Option<IndexFormatArg>,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Current index name
    pub index: PathBuf,

    /// New index name
    pub new_name: PathBuf,

    #[arg(long = "index-format", value_enum)]
    pub index_format: Option<IndexFormatArg>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Index to search
    #[arg(short = 'f', long)]
    pub index: PathBuf,

    /// Search query
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Maximum number of results
    #[arg(short = 'n', long)]
    pub max: Option<usize>,
}

#[derive(Args)]
pub struct FilesArgs {
    /// Index name
    pub index: PathBuf,

    #[arg(long = "index-format", value_enum)]
    pub index_format: Option<IndexFormatArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum IndexFormatArg {
    Native,
    Incremental,
}

impl From<IndexFormatArg> for IndexFormat {
    fn from(arg: IndexFormatArg) -> Self {
        match arg {
            IndexFormatArg::Native => IndexFormat::Native,
            IndexFormatArg::Incremental => IndexFormat::Incremental,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum HeaderVersionArg {
    Legacy,
    Current,
}

impl From<HeaderVersionArg> for HeaderVersion {
    fn from(arg: HeaderVersionArg) -> Self {
        match arg {
            HeaderVersionArg::Legacy => HeaderVersion::Legacy,
            HeaderVersionArg::Current => HeaderVersion::Current,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Cli,
    Json,
    Files,
}
