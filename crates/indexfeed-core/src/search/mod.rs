//! Querying built indexes through the indexer's command-line search

use crate::config::IndexerConfig;
use crate::error::{IndexFeedError, Result};
use crate::indexer::{resolve_program, CommandLine};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Output layout requested with `-x`; the indexer expands the escapes
const RESULT_FORMAT: &str = r"<swishrank>\t<swishdocpath>\t<swishtitle>\t<swishdocsize>\n";

const NO_RESULTS: &str = "no results";

/// A single search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub rank: u32,
    pub url: String,
    pub title: String,
    pub size: u64,
}

/// Hits in rank order
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    hits: std::vec::IntoIter<SearchResult>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.len() == 0
    }
}

impl Iterator for SearchResults {
    type Item = SearchResult;

    fn next(&mut self) -> Option<SearchResult> {
        self.hits.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.hits.size_hint()
    }
}

impl ExactSizeIterator for SearchResults {}

/// Runs queries against one or more indexes
#[derive(Debug, Clone)]
pub struct Searcher {
    config: IndexerConfig,
    indexes: Vec<PathBuf>,
    max_results: Option<usize>,
}

impl Searcher {
    pub fn new(index: impl Into<PathBuf>, config: IndexerConfig) -> Self {
        Self {
            config,
            indexes: vec![index.into()],
            max_results: None,
        }
    }

    /// Search an additional index in the same query
    pub fn with_index(mut self, index: impl Into<PathBuf>) -> Self {
        self.indexes.push(index.into());
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    fn command(&self, query: &str) -> Result<CommandLine> {
        let program = resolve_program(self.config.program.as_deref())?;
        let mut cmd = CommandLine::new(program).arg("-f");
        for index in &self.indexes {
            cmd = cmd.arg(index);
        }
        cmd = cmd.arg("-w").arg(query).arg("-H").arg("0");
        if let Some(max) = self.max_results {
            cmd = cmd.arg("-m").arg(max.to_string());
        }
        Ok(cmd.arg("-x").arg(RESULT_FORMAT))
    }

    pub fn search(&self, query: &str) -> Result<SearchResults> {
        if query.trim().is_empty() {
            return Err(IndexFeedError::InvalidInput("empty query".to_string()));
        }
        if let Some(missing) = self.indexes.iter().find(|i| !i.is_file()) {
            return Err(IndexFeedError::IndexNotFound(missing.display().to_string()));
        }

        let cmd = self.command(query)?;
        debug!("Running: {}", cmd);
        let output = cmd
            .to_command()
            .output()
            .map_err(|e| IndexFeedError::process(cmd.to_string(), e.to_string()))?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        match parse_output(&stdout) {
            Ok(hits) if output.status.success() || hits.is_empty() => Ok(SearchResults {
                hits: hits.into_iter(),
            }),
            Ok(_) => Err(IndexFeedError::process(cmd.to_string(), output.status.to_string())),
            Err(e) => Err(e),
        }
    }
}

/// Parse tab-separated hit lines; `err:` lines become errors except "no results"
pub fn parse_output(stdout: &str) -> Result<Vec<SearchResult>> {
    let mut hits = Vec::new();
    for line in stdout.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line == "." || line.starts_with('#') {
            continue;
        }
        if let Some(message) = line.strip_prefix("err:") {
            let message = message.trim();
            if message == NO_RESULTS {
                return Ok(Vec::new());
            }
            return Err(IndexFeedError::Search(message.to_string()));
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let &[rank, url, title, size] = fields.as_slice() else {
            return Err(IndexFeedError::Parse(format!("unexpected search output: {}", line)));
        };
        hits.push(SearchResult {
            rank: rank
                .trim()
                .parse()
                .map_err(|_| IndexFeedError::Parse(format!("invalid rank: {}", rank)))?,
            url: url.to_string(),
            title: title.to_string(),
            size: size.trim().parse().unwrap_or(0),
        });
    }
    Ok(hits)
}
