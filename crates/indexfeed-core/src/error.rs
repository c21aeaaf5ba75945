//! Error types for indexfeed

use thiserror::Error;

/// Result type alias using IndexFeedError
pub type Result<T> = std::result::Result<T, IndexFeedError>;

/// Error type alias for convenience
pub type Error = IndexFeedError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const INDEXER_FAILED: i32 = 4;
}

/// Main error type for indexfeed
#[derive(Debug, Error)]
pub enum IndexFeedError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Content filter error: {0}")]
    Filter(String),

    #[error("Command `{command}` failed: {message}")]
    Process { command: String, message: String },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl IndexFeedError {
    /// Build a subprocess error naming the failing command line
    pub fn process(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Process {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::IndexNotFound(_) => exit_codes::NOT_FOUND,
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            Self::Process { .. } => exit_codes::INDEXER_FAILED,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Whether the pipeline may skip the offending item and keep going
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::WalkDir(_)
                | Self::Database(_)
                | Self::Filter(_)
                | Self::Parse(_)
                | Self::Serialization(_)
                | Self::Yaml(_)
        )
    }
}
