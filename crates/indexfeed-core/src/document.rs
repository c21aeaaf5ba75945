//! Canonical document representation
//!
//! Every provider turns its raw items into a [`Document`]. The pipeline
//! runs the document through the configured [`DocumentHooks`] and hands it
//! to the indexer, which frames it with [`Document::serialize_for_wire`].

use crate::headers::{HeaderFramer, HeaderOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parser the external indexer should use for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParserHint {
    Html,
    Xml,
    Text,
    /// Let the indexer pick from its own configuration
    #[default]
    Default,
}

/// Incremental update mode carried in the `Update-Mode` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    Default,
    Update,
    Remove,
    Add,
}

impl UpdateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Update => "Update",
            Self::Remove => "Remove",
            Self::Add => "Add",
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indexable unit
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub url: String,
    pub content: Vec<u8>,
    pub mime_type: String,
    pub parser_hint: ParserHint,
    pub mod_time: DateTime<Utc>,
    pub update_mode: Option<UpdateMode>,
    size_override: Option<u64>,
}

impl Document {
    /// Create new document
    pub fn new(url: impl Into<String>, content: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            mime_type: mime_type.into(),
            parser_hint: ParserHint::Default,
            mod_time: Utc::now(),
            update_mode: None,
            size_override: None,
        }
    }

    pub fn with_parser(mut self, parser_hint: ParserHint) -> Self {
        self.parser_hint = parser_hint;
        self
    }

    pub fn with_mod_time(mut self, mod_time: DateTime<Utc>) -> Self {
        self.mod_time = mod_time;
        self
    }

    pub fn with_update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = Some(mode);
        self
    }

    /// Report a size other than the content length (e.g. the on-disk size
    /// of a file whose content was filtered)
    pub fn with_size(mut self, size: u64) -> Self {
        self.size_override = Some(size);
        self
    }

    /// Reported size: the override if one was set, else the content length
    pub fn size(&self) -> u64 {
        self.size_override.unwrap_or(self.content.len() as u64)
    }

    pub fn content_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Replace the content; an explicit size override is dropped since it
    /// described the old bytes.
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.size_override = None;
    }

    /// Header options describing this document
    pub fn header_options(&self) -> HeaderOptions {
        HeaderOptions {
            url: Some(self.url.clone()),
            mod_time: Some(self.mod_time),
            parser_hint: Some(self.parser_hint),
            mime_type: Some(self.mime_type.clone()),
            update_mode: self.update_mode,
        }
    }

    /// Framed header block followed by the content bytes. `Content-Length`
    /// is always taken from the content itself, never from `size()`.
    pub fn serialize_for_wire(&self, framer: &HeaderFramer) -> Vec<u8> {
        framer.frame_document(self)
    }
}

/// Heuristic binary check: NUL bytes, or too many control characters in
/// the first block.
pub fn is_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(8192)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let control = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0c))
        .count();
    control * 10 > sample.len()
}

pub type ContentHook = Box<dyn Fn(Vec<u8>) -> Vec<u8> + Send + Sync>;
pub type UrlHook = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Mutation hooks applied to every document before indexing.
///
/// Order is fixed: content first, then url.
#[derive(Default)]
pub struct DocumentHooks {
    content: Option<ContentHook>,
    url: Option<UrlHook>,
}

impl DocumentHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_hook(mut self, hook: impl Fn(Vec<u8>) -> Vec<u8> + Send + Sync + 'static) -> Self {
        self.content = Some(Box::new(hook));
        self
    }

    pub fn with_url_hook(mut self, hook: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.url = Some(Box::new(hook));
        self
    }

    pub fn apply(&self, doc: &mut Document) {
        if let Some(hook) = &self.content {
            let content = std::mem::take(&mut doc.content);
            doc.set_content(hook(content));
        }
        if let Some(hook) = &self.url {
            doc.url = hook(&doc.url);
        }
    }
}

impl fmt::Debug for DocumentHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHooks")
            .field("content", &self.content.is_some())
            .field("url", &self.url.is_some())
            .finish()
    }
}
