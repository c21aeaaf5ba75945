//! Header framing for the indexer's stdin protocol
//!
//! Each document is sent as a block of `Label: value` lines, a blank line,
//! and then exactly `Content-Length` bytes of content.

use crate::document::{Document, ParserHint, UpdateMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Which label table the consumer expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeaderVersion {
    /// Swish-e 2.x labels (`Path-Name`, `Last-Mtime`, `Document-Type`)
    #[default]
    Legacy,
    /// Swish3 labels (`Content-Location`, `Last-Modified`, `Parser-Type`)
    Current,
}

/// Labels for one protocol version
struct LabelTable {
    url: &'static str,
    mod_time: &'static str,
    parser_hint: &'static str,
    mime_type: &'static str,
    update_mode: &'static str,
}

const LEGACY_LABELS: LabelTable = LabelTable {
    url: "Path-Name",
    mod_time: "Last-Mtime",
    parser_hint: "Document-Type",
    mime_type: "Content-Type",
    update_mode: "Update-Mode",
};

const CURRENT_LABELS: LabelTable = LabelTable {
    url: "Content-Location",
    mod_time: "Last-Modified",
    parser_hint: "Parser-Type",
    mime_type: "Content-Type",
    update_mode: "Update-Mode",
};

impl HeaderVersion {
    fn labels(&self) -> &'static LabelTable {
        match self {
            Self::Legacy => &LEGACY_LABELS,
            Self::Current => &CURRENT_LABELS,
        }
    }

    /// Parser name as the consumer spells it; `None` for the default parser
    pub fn parser_name(&self, hint: ParserHint) -> Option<&'static str> {
        let name = match (self, hint) {
            (_, ParserHint::Default) => return None,
            (Self::Legacy, ParserHint::Html) => "HTML*",
            (Self::Legacy, ParserHint::Xml) => "XML*",
            (Self::Legacy, ParserHint::Text) => "TXT*",
            (Self::Current, ParserHint::Html) => "HTML",
            (Self::Current, ParserHint::Xml) => "XML",
            (Self::Current, ParserHint::Text) => "TXT",
        };
        Some(name)
    }

    /// Version selected by the environment (`SWISH3` set and non-zero)
    pub fn from_env() -> Self {
        match std::env::var("SWISH3") {
            Ok(v) if !v.is_empty() && v != "0" => Self::Current,
            _ => Self::Legacy,
        }
    }
}

/// Optional metadata for one framed block
#[derive(Debug, Clone, Default)]
pub struct HeaderOptions {
    pub url: Option<String>,
    pub mod_time: Option<DateTime<Utc>>,
    pub parser_hint: Option<ParserHint>,
    pub mime_type: Option<String>,
    pub update_mode: Option<UpdateMode>,
}

/// Serializes document metadata into header blocks.
///
/// Owns the url surrogate counter used when a block has no url.
#[derive(Debug, Default)]
pub struct HeaderFramer {
    version: HeaderVersion,
    counter: AtomicU64,
}

impl HeaderFramer {
    pub fn new(version: HeaderVersion) -> Self {
        Self {
            version,
            counter: AtomicU64::new(0),
        }
    }

    pub fn version(&self) -> HeaderVersion {
        self.version
    }

    /// Next url surrogate; strictly increasing for the life of the framer
    pub fn next_surrogate(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Build the header block for `content`. The returned bytes do not
    /// include the content itself.
    pub fn frame(&self, content: &[u8], options: &HeaderOptions) -> Vec<u8> {
        let labels = self.version.labels();
        let mut out = format!("Content-Length: {}\n", content.len());

        // Canonical key order: mime_type, mod_time, parser_hint, update_mode, url
        if let Some(mime) = options.mime_type.as_deref().filter(|m| !m.is_empty()) {
            push_line(&mut out, labels.mime_type, mime);
        }

        let mod_time = options.mod_time.unwrap_or_else(Utc::now);
        push_line(&mut out, labels.mod_time, &mod_time.timestamp().to_string());

        if let Some(parser) = options
            .parser_hint
            .and_then(|hint| self.version.parser_name(hint))
        {
            push_line(&mut out, labels.parser_hint, parser);
        }

        if let Some(mode) = options.update_mode {
            push_line(&mut out, labels.update_mode, mode.as_str());
        }

        match options.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => push_line(&mut out, labels.url, url),
            None => push_line(&mut out, labels.url, &self.next_surrogate().to_string()),
        }

        out.push('\n');
        out.into_bytes()
    }

    /// Header block followed by the document's content
    pub fn frame_document(&self, doc: &Document) -> Vec<u8> {
        let mut out = self.frame(&doc.content, &doc.header_options());
        out.extend_from_slice(&doc.content);
        out
    }
}

fn push_line(out: &mut String, label: &str, value: &str) {
    out.push_str(label);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}
