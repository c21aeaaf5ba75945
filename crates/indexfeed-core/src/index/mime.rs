//! Content type resolution

use crate::document::{is_binary, ParserHint};
use std::collections::HashMap;

pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Extension to MIME type lookups, memoized per resolver
#[derive(Debug, Default)]
pub struct MimeResolver {
    cache: HashMap<String, String>,
    strict: bool,
}

impl MimeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer sniffed types over extension-derived ones
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// MIME type for an extension (without the dot)
    pub fn for_extension(&mut self, ext: &str) -> String {
        let key = ext.to_ascii_lowercase();
        if let Some(mime) = self.cache.get(&key) {
            return mime.clone();
        }
        let mime = mime_guess::from_ext(&key)
            .first_raw()
            .unwrap_or(DEFAULT_MIME)
            .to_string();
        self.cache.insert(key, mime.clone());
        mime
    }

    /// Declared type for `ext`, reconciled with the content in strict mode
    pub fn resolve(&mut self, ext: Option<&str>, content: &[u8]) -> String {
        let declared = match ext {
            Some(ext) => self.for_extension(ext),
            None => match sniff(content) {
                Some(sniffed) => return sniffed.to_string(),
                None => "text/plain".to_string(),
            },
        };
        if self.strict {
            if let Some(sniffed) = sniff(content) {
                return sniffed.to_string();
            }
        }
        declared
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Guess a type from leading bytes. Only recognizes what the indexer's
/// parsers or the shipped filters care about.
pub fn sniff(content: &[u8]) -> Option<&'static str> {
    if content.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    if is_binary(content) {
        return Some(DEFAULT_MIME);
    }
    let head = String::from_utf8_lossy(&content[..content.len().min(512)]).to_ascii_lowercase();
    let head = head.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        Some("text/html")
    } else if head.starts_with("<?xml") {
        Some("application/xml")
    } else {
        None
    }
}

/// Parser hint for a content type
pub fn parser_hint_for(mime: &str) -> ParserHint {
    let mime = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if mime == "text/html" || mime == "application/xhtml+xml" {
        ParserHint::Html
    } else if mime.ends_with("/xml") || mime.ends_with("+xml") {
        ParserHint::Xml
    } else if mime.starts_with("text/") {
        ParserHint::Text
    } else {
        ParserHint::Default
    }
}

/// Whether content of this type can go to the indexer without filtering
pub fn is_text_type(mime: &str) -> bool {
    parser_hint_for(mime) != ParserHint::Default
        || mime.starts_with("application/json")
        || mime.starts_with("application/javascript")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_extension_caches() {
        let mut resolver = MimeResolver::new();
        assert_eq!(resolver.for_extension("html"), "text/html");
        assert_eq!(resolver.for_extension("HTML"), "text/html");
        assert_eq!(resolver.cached(), 1);
        assert_eq!(resolver.for_extension("nosuchext"), DEFAULT_MIME);
    }

    #[test]
    fn test_strict_prefers_sniffed() {
        let html = b"<!DOCTYPE html><html><title>x</title></html>";
        let mut lenient = MimeResolver::new();
        assert_eq!(lenient.resolve(Some("txt"), html), "text/plain");
        let mut strict = MimeResolver::new().strict(true);
        assert_eq!(strict.resolve(Some("txt"), html), "text/html");
    }

    #[test]
    fn test_parser_hint_for() {
        assert_eq!(parser_hint_for("text/html; charset=utf-8"), ParserHint::Html);
        assert_eq!(parser_hint_for("application/xml"), ParserHint::Xml);
        assert_eq!(parser_hint_for("image/svg+xml"), ParserHint::Xml);
        assert_eq!(parser_hint_for("text/plain"), ParserHint::Text);
        assert_eq!(parser_hint_for("application/pdf"), ParserHint::Default);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(sniff(b"%PDF-1.4 ..."), Some("application/pdf"));
        assert_eq!(sniff(b"<?xml version=\"1.0\"?><a/>"), Some("application/xml"));
        assert_eq!(sniff(b"just words"), None);
        assert_eq!(sniff(b"\x00\x01\x02"), Some(DEFAULT_MIME));
    }
}
