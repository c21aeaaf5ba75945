//! Output formatters

pub mod files;
pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use indexfeed_core::SearchResult;
use std::path::PathBuf;

/// One file belonging to an index
#[derive(Debug, serde::Serialize)]
pub struct IndexFile {
    pub path: PathBuf,
    pub exists: bool,
}

/// Format search results
pub fn format_search_results(results: &[SearchResult], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_results(results),
        OutputFormat::Files => files::format_results(results),
        OutputFormat::Cli => terminal::format_results(results),
    }
}

/// Format the file listing of an index
pub fn format_index_files(files: &[IndexFile], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_index_files(files),
        OutputFormat::Files => files::format_index_files(files),
        OutputFormat::Cli => terminal::format_index_files(files),
    }
}
