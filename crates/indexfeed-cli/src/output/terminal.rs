//! Terminal output formatter

use super::IndexFile;
use indexfeed_core::SearchResult;

pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results\n".to_string();
    }

    let mut output = String::new();
    for result in results {
        let title = if result.title.is_empty() {
            "(untitled)"
        } else {
            result.title.as_str()
        };
        output.push_str(&format!("{:>4} {}\n", result.rank, result.url));
        output.push_str(&format!("     {} ({} bytes)\n", title, result.size));
    }
    output
}

pub fn format_index_files(files: &[IndexFile]) -> String {
    files
        .iter()
        .map(|f| {
            let marker = if f.exists { "present" } else { "missing" };
            format!("{:<8} {}\n", marker, f.path.display())
        })
        .collect()
}
