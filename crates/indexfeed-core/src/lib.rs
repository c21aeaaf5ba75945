//! Indexfeed Core Library
//!
//! Document aggregation front end for the Swish-e indexer.
//!
//! # Features
//! - Filesystem, SQLite, Maildir and in-memory object sources
//! - Ordered include/exclude rules with pruning directory traversal
//! - Byte-exact header framing for `swish-e -S prog -i stdin`
//! - Indexer process lifecycle: run, merge, single-document add
//! - Command-line search over built indexes

pub mod config;
pub mod document;
pub mod error;
pub mod filters;
pub mod headers;
pub mod index;
pub mod indexer;
pub mod pipeline;
pub mod providers;
pub mod search;
pub mod xml;

pub use config::{AggregatorConfig, Config, IndexerConfig, IndexerSettings};
pub use document::{Document, DocumentHooks, ParserHint, UpdateMode};
pub use error::{Error, IndexFeedError, Result};
pub use filters::{ContentFilter, FilterChain, FilterOutput, PdfFilter};
pub use headers::{HeaderFramer, HeaderOptions, HeaderVersion};
pub use index::{extract_title, MimeResolver, RuleSet, ScanFilter, ScanResult, Scanner};
pub use indexer::{associated_files, IndexFormat, IndexHandle, Indexer, IndexerState};
pub use pipeline::{DocumentSink, MemorySink, Pipeline, PipelineStats, WireSink};
pub use providers::{
    FileProvider, Indexable, MailMessage, MailPart, MailProvider, MailStore, MaildirStore,
    MemoryMailStore, ObjectProvider, SourceProvider, SqlProvider, TableSpec, ValueSerializer,
    YamlSerializer,
};
pub use search::{SearchResult, SearchResults, Searcher};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "indexfeed";
