//! Pulls documents from a provider and feeds them to a sink
//!
//! One item is in flight at a time. Item-level failures (unreadable files,
//! bad rows, filter errors) are logged and skipped; sink failures abort.

use crate::config::AggregatorConfig;
use crate::document::{Document, DocumentHooks};
use crate::error::Result;
use crate::headers::HeaderFramer;
use crate::index::{extract_title, RuleScope, RuleSet, RuleTarget};
use crate::providers::SourceProvider;
use std::io::Write;
use tracing::{debug, info, warn};

/// Destination for accepted documents
pub trait DocumentSink {
    fn accept(&mut self, doc: &Document) -> Result<()>;
}

/// Collects documents in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub documents: Vec<Document>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSink for MemorySink {
    fn accept(&mut self, doc: &Document) -> Result<()> {
        self.documents.push(doc.clone());
        Ok(())
    }
}

/// Writes framed documents to any writer, e.g. stdout for `-S prog`
pub struct WireSink<W: Write> {
    writer: W,
    framer: HeaderFramer,
}

impl<W: Write> WireSink<W> {
    pub fn new(writer: W, framer: HeaderFramer) -> Self {
        Self { writer, framer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentSink for WireSink<W> {
    fn accept(&mut self, doc: &Document) -> Result<()> {
        self.writer.write_all(&doc.serialize_for_wire(&self.framer))?;
        Ok(())
    }
}

/// Counts from one `index_source` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub seen: usize,
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Drives providers into a sink
pub struct Pipeline<S: DocumentSink> {
    sink: S,
    hooks: DocumentHooks,
    rules: RuleSet,
    max_size: Option<u64>,
    stats: PipelineStats,
}

impl<S: DocumentSink> Pipeline<S> {
    pub fn new(sink: S, config: &AggregatorConfig) -> Result<Self> {
        Ok(Self {
            sink,
            hooks: DocumentHooks::default(),
            rules: config.rule_set()?,
            max_size: config.max_size,
            stats: PipelineStats::default(),
        })
    }

    pub fn with_hooks(mut self, hooks: DocumentHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Totals across every `index_source` call so far
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Final checks on a converted document
    pub fn content_acceptable(&self, doc: &Document) -> bool {
        if doc.content.is_empty() {
            debug!("Skipping empty document {}", doc.url);
            return false;
        }
        if let Some(max) = self.max_size {
            if doc.size() > max {
                debug!("Skipping {}: {} bytes exceeds {}", doc.url, doc.size(), max);
                return false;
            }
        }
        if self.rules.has_scope(RuleScope::Title) {
            let title = extract_title(&doc.content_str(), &doc.url);
            if self.rules.is_excluded(RuleTarget::Title(&title)) {
                debug!("Skipping {}: title {:?} excluded", doc.url, title);
                return false;
            }
        }
        true
    }

    /// Index every item of `provider`, returning how many were accepted
    pub fn index_source<P: SourceProvider>(&mut self, provider: &mut P) -> Result<usize> {
        let mut count = 0;
        while let Some(next) = provider.next_item() {
            self.stats.seen += 1;

            let item = match next {
                Ok(item) => item,
                Err(e) if e.is_item_level() => {
                    warn!("Skipping {} item: {}", provider.provider_type(), e);
                    self.stats.failed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if !provider.is_eligible(&item) {
                self.stats.skipped += 1;
                continue;
            }

            let name = provider.describe(&item);
            let mut doc = match provider.to_document(item) {
                Ok(doc) => doc,
                Err(e) if e.is_item_level() => {
                    warn!("Skipping {}: {}", name, e);
                    self.stats.failed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.hooks.apply(&mut doc);
            if !self.content_acceptable(&doc) {
                self.stats.skipped += 1;
                continue;
            }

            self.sink.accept(&doc)?;
            count += 1;
            self.stats.indexed += 1;
        }

        info!(
            "Indexed {} documents from {} provider",
            count,
            provider.provider_type()
        );
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexFeedError;

    /// Provider over canned results
    struct Canned {
        items: std::vec::IntoIter<Result<Document>>,
    }

    impl Canned {
        fn new(items: Vec<Result<Document>>) -> Self {
            Self {
                items: items.into_iter(),
            }
        }
    }

    impl SourceProvider for Canned {
        type Item = Document;

        fn provider_type(&self) -> &'static str {
            "canned"
        }

        fn next_item(&mut self) -> Option<Result<Document>> {
            self.items.next()
        }

        fn is_eligible(&self, item: &Document) -> bool {
            !item.url.ends_with(".skip")
        }

        fn describe(&self, item: &Document) -> String {
            item.url.clone()
        }

        fn to_document(&mut self, item: Document) -> Result<Document> {
            if item.url.ends_with(".bad") {
                return Err(IndexFeedError::Filter("bad".to_string()));
            }
            Ok(item)
        }
    }

    fn doc(url: &str, content: &str) -> Result<Document> {
        Ok(Document::new(url, content, "text/html"))
    }

    #[test]
    fn test_skips_item_level_errors() {
        let mut provider = Canned::new(vec![
            doc("a.html", "<p>a</p>"),
            Err(IndexFeedError::Io(std::io::Error::other("unreadable"))),
            doc("b.bad", "x"),
            doc("c.skip", "x"),
            doc("empty.html", ""),
            doc("d.html", "<p>d</p>"),
        ]);
        let mut pipeline = Pipeline::new(MemorySink::new(), &AggregatorConfig::default()).unwrap();
        let count = pipeline.index_source(&mut provider).unwrap();

        assert_eq!(count, 2);
        let urls: Vec<&str> = pipeline.sink().documents.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(urls, vec!["a.html", "d.html"]);
        assert_eq!(
            pipeline.stats(),
            PipelineStats {
                seen: 6,
                indexed: 2,
                skipped: 2,
                failed: 2
            }
        );
    }

    #[test]
    fn test_fatal_error_aborts() {
        let mut provider = Canned::new(vec![
            doc("a.html", "a"),
            Err(IndexFeedError::Config("broken".to_string())),
            doc("b.html", "b"),
        ]);
        let mut pipeline = Pipeline::new(MemorySink::new(), &AggregatorConfig::default()).unwrap();
        assert!(pipeline.index_source(&mut provider).is_err());
        assert_eq!(pipeline.sink().documents.len(), 1);
    }

    #[test]
    fn test_title_rule_and_max_size() {
        let config = AggregatorConfig {
            max_size: Some(40),
            ..Default::default()
        }
        .with_rule("title contains Draft");
        let mut provider = Canned::new(vec![
            doc("a.html", "<title>Draft notes</title>"),
            doc("b.html", "<title>Final</title>"),
            doc("c.html", "<title>Final</title> and a much longer body text"),
        ]);
        let mut pipeline = Pipeline::new(MemorySink::new(), &config).unwrap();
        assert_eq!(pipeline.index_source(&mut provider).unwrap(), 1);
        assert_eq!(pipeline.sink().documents[0].url, "b.html");
    }

    #[test]
    fn test_hooks_applied_before_sink() {
        let hooks = DocumentHooks::new()
            .with_url_hook(|url| format!("https://example.com/{}", url))
            .with_content_hook(|c| c.to_ascii_uppercase());
        let mut provider = Canned::new(vec![doc("a.html", "hello")]);
        let mut pipeline = Pipeline::new(MemorySink::new(), &AggregatorConfig::default())
            .unwrap()
            .with_hooks(hooks);
        pipeline.index_source(&mut provider).unwrap();

        let indexed = &pipeline.sink().documents[0];
        assert_eq!(indexed.url, "https://example.com/a.html");
        assert_eq!(indexed.content, b"HELLO");
    }

    #[test]
    fn test_wire_sink_frames_documents() {
        let mut sink = WireSink::new(Vec::new(), HeaderFramer::default());
        sink.accept(&Document::new("a.txt", "héllo", "text/plain")).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.starts_with("Content-Length: 6\n"));
        assert!(out.ends_with("\n\nhéllo"));
    }
}
