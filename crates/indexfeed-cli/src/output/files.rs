//! Path-only output formatter

use super::IndexFile;
use indexfeed_core::SearchResult;

pub fn format_results(results: &[SearchResult]) -> String {
    results.iter().map(|r| format!("{}\n", r.url)).collect()
}

/// Only the files that are present on disk
pub fn format_index_files(files: &[IndexFile]) -> String {
    files
        .iter()
        .filter(|f| f.exists)
        .map(|f| format!("{}\n", f.path.display()))
        .collect()
}
