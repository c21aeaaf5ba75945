//! Document title extraction

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r"(?is)<(swishtitle|title)[^>]*>(.*?)</(?:swishtitle|title)>").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref SPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Extract the title from markup content, falling back to the file stem
pub fn extract_title(content: &str, filename: &str) -> String {
    let head: String = content.chars().take(64 * 1024).collect();
    if let Some(caps) = TITLE_RE.captures(&head) {
        let raw = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let text = TAG_RE.replace_all(raw, " ");
        let title = SPACE_RE.replace_all(text.trim(), " ");
        if !title.is_empty() {
            return unescape_basic(&title);
        }
    }

    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.replace(['-', '_'], " "))
        .unwrap_or_else(|| filename.to_string())
}

fn unescape_basic(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
