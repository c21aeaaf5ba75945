//! File system provider
//!
//! Walks the configured paths with the scanner and reads each accepted
//! file into a document.

use super::SourceProvider;
use crate::config::AggregatorConfig;
use crate::document::{is_binary, Document};
use crate::error::{IndexFeedError, Result};
use crate::filters::FilterChain;
use crate::index::mime::is_text_type;
use crate::index::{parser_hint_for, MimeResolver, ScanFilter, ScanOptions, ScanResult, Scanner};
use std::path::PathBuf;
use tracing::debug;

/// File system provider
pub struct FileProvider {
    scanner: Scanner,
    mime: MimeResolver,
    filters: FilterChain,
}

impl FileProvider {
    /// Create a provider over explicit files and directories
    pub fn new(paths: &[PathBuf], config: &AggregatorConfig) -> Result<Self> {
        if paths.is_empty() {
            return Err(IndexFeedError::Config(
                "file provider requires at least one path".to_string(),
            ));
        }
        let filter = ScanFilter::new(config)?;
        let options = ScanOptions {
            follow_symlinks: config.follow_symlinks,
        };
        Ok(Self {
            scanner: Scanner::new(paths, filter, options),
            mime: MimeResolver::new().strict(config.strict_mime),
            filters: FilterChain::with_defaults(),
        })
    }

    /// Replace the content filters
    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }
}

impl SourceProvider for FileProvider {
    type Item = ScanResult;

    fn provider_type(&self) -> &'static str {
        "file"
    }

    fn next_item(&mut self) -> Option<Result<ScanResult>> {
        self.scanner.next()
    }

    fn describe(&self, item: &ScanResult) -> String {
        item.path.display().to_string()
    }

    fn to_document(&mut self, item: ScanResult) -> Result<Document> {
        let raw = std::fs::read(&item.path).map_err(|e| {
            IndexFeedError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {:?}: {}", item.path, e),
            ))
        })?;

        let mut mime = self.mime.resolve(item.ext.as_deref(), &raw);
        let content = match self.filters.filter(&raw, &mime)? {
            Some(output) => {
                debug!("Filtered {} ({} -> {})", item.path.display(), mime, output.mime_type);
                mime = output.mime_type;
                output.content
            }
            None if !is_text_type(&mime) && is_binary(&raw) => {
                return Err(IndexFeedError::Filter(format!(
                    "{} is binary ({}) and no filter handles it",
                    item.path.display(),
                    mime
                )));
            }
            None => raw,
        };

        // Size and mtime both come from the stat snapshot the scanner judged
        Ok(Document::new(item.path.display().to_string(), content, mime.clone())
            .with_parser(parser_hint_for(&mime))
            .with_mod_time(item.modified)
            .with_size(item.size))
    }
}
