//! JSON output formatter

use super::IndexFile;
use indexfeed_core::SearchResult;

pub fn format_results(results: &[SearchResult]) -> String {
    serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string()) + "\n"
}

pub fn format_index_files(files: &[IndexFile]) -> String {
    serde_json::to_string_pretty(files).unwrap_or_else(|_| "[]".to_string()) + "\n"
}
