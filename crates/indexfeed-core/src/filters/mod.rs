//! Content filters
//!
//! A filter converts content of some declared type (PDF, office formats,
//! ...) into text the indexer can parse. Conversion itself is delegated to
//! whatever the filter wraps; the chain only picks a filter and checks that
//! the result is not binary.

use crate::document::is_binary;
use crate::error::{IndexFeedError, Result};
use std::sync::Arc;

pub mod pdf;

pub use pdf::PdfFilter;

/// Filtered content and the type it now has
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutput {
    pub content: Vec<u8>,
    pub mime_type: String,
}

/// Content filter trait
pub trait ContentFilter: Send + Sync {
    /// Filter identifier used in log messages
    fn name(&self) -> &'static str;

    /// Whether this filter converts content of type `mime`
    fn can_filter(&self, mime: &str) -> bool;

    /// Convert `content`
    fn filter(&self, content: &[u8], mime: &str) -> Result<FilterOutput>;
}

/// Ordered set of filters; the first one that accepts a type is used
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn ContentFilter>>,
}

impl FilterChain {
    /// Create an empty chain (filters nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with the built-in filters
    pub fn with_defaults() -> Self {
        let mut chain = Self::new();
        chain.push(Arc::new(PdfFilter::new()));
        chain
    }

    pub fn push(&mut self, filter: Arc<dyn ContentFilter>) {
        self.filters.push(filter);
    }

    pub fn can_filter(&self, mime: &str) -> bool {
        self.filters.iter().any(|f| f.can_filter(mime))
    }

    /// Run the matching filter. `Ok(None)` means no filter handles `mime`;
    /// a failing filter or a binary result is a `Filter` error.
    pub fn filter(&self, content: &[u8], mime: &str) -> Result<Option<FilterOutput>> {
        let Some(filter) = self.filters.iter().find(|f| f.can_filter(mime)) else {
            return Ok(None);
        };

        let output = filter.filter(content, mime).map_err(|e| match e {
            IndexFeedError::Filter(_) => e,
            other => IndexFeedError::Filter(format!("{} filter failed: {}", filter.name(), other)),
        })?;

        if is_binary(&output.content) {
            return Err(IndexFeedError::Filter(format!(
                "{} filter produced binary output for {}",
                filter.name(),
                mime
            )));
        }

        Ok(Some(output))
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|flt| flt.name()))
            .finish()
    }
}
