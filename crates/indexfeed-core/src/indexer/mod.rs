//! External indexer process management
//!
//! An [`Indexer`] owns one target index. `start` spawns the indexer reading
//! framed documents from its stdin, `write` streams documents, and `finish`
//! waits for it. Merging and single-document adds run their own short-lived
//! processes.

pub mod command;
pub mod handle;
mod merge;

pub use command::{resolve_program, CommandLine, DEFAULT_PROGRAM, PROGRAM_ENV};
pub use handle::{associated_files, IndexFormat, IndexHandle};
pub use merge::MAX_MERGE_SOURCES;

use crate::config::IndexerConfig;
use crate::document::Document;
use crate::error::{IndexFeedError, Result};
use crate::headers::HeaderFramer;
use crate::pipeline::DocumentSink;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Stdio};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Exit status meaning the run saw no documents
const NO_DOCUMENTS_STATUS: i32 = 1;

/// Lifecycle of an indexing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexerState {
    Idle,
    Running,
    Closed,
}

struct RunningProcess {
    command: CommandLine,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    // Removed when the run ends
    _settings_file: Option<NamedTempFile>,
}

/// Drives the external indexer for one target index
pub struct Indexer {
    config: IndexerConfig,
    handle: IndexHandle,
    framer: Arc<HeaderFramer>,
    state: IndexerState,
    process: Option<RunningProcess>,
    written: usize,
}

impl Indexer {
    pub fn new(index: impl Into<PathBuf>, config: IndexerConfig) -> Self {
        let framer = Arc::new(HeaderFramer::new(config.header_version));
        Self {
            handle: IndexHandle::new(index, config.format),
            config,
            framer,
            state: IndexerState::Idle,
            process: None,
            written: 0,
        }
    }

    /// Share a framer so URL surrogates stay unique across indexers
    pub fn with_framer(mut self, framer: Arc<HeaderFramer>) -> Self {
        self.framer = framer;
        self
    }

    pub fn handle(&self) -> &IndexHandle {
        &self.handle
    }

    pub fn state(&self) -> IndexerState {
        self.state
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Documents written during the current or last run
    pub fn documents_written(&self) -> usize {
        self.written
    }

    fn program(&self) -> Result<PathBuf> {
        resolve_program(self.config.program.as_deref())
    }

    /// Materialize the settings store, if any, and pick the `-c` path
    fn config_file(&self) -> Result<(Option<PathBuf>, Option<NamedTempFile>)> {
        let Some(settings) = self.config.settings_store() else {
            return Ok((self.config.config_file.clone(), None));
        };
        match &self.config.config_file {
            Some(path) => {
                settings.write_to(path)?;
                Ok((Some(path.clone()), None))
            }
            None => {
                let file = settings.write_temp()?;
                Ok((Some(file.path().to_path_buf()), Some(file)))
            }
        }
    }

    /// Spawn the indexer. Only valid from `Idle`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != IndexerState::Idle {
            return Err(IndexFeedError::InvalidInput(format!(
                "cannot start indexer for {} in state {:?}",
                self.handle, self.state
            )));
        }

        let program = self.program()?;
        let (config_path, settings_file) = self.config_file()?;
        let command = CommandLine::index(&program, &self.config, self.handle.path(), config_path.as_deref());
        debug!("Starting: {}", command);

        let (stdout, stderr) = if self.config.debug {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };
        let mut child = command
            .to_command()
            .stdin(Stdio::piped())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| IndexFeedError::process(command.to_string(), e.to_string()))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| IndexFeedError::process(command.to_string(), "stdin was not captured"))?;

        self.process = Some(RunningProcess {
            command,
            child,
            stdin: BufWriter::new(stdin),
            _settings_file: settings_file,
        });
        self.written = 0;
        self.state = IndexerState::Running;
        Ok(())
    }

    /// Frame and send one document. Only valid while `Running`.
    pub fn write(&mut self, doc: &Document) -> Result<()> {
        let process = self.process.as_mut().ok_or_else(|| {
            IndexFeedError::InvalidInput(format!("indexer for {} is not running", self.handle))
        })?;

        let block = self.framer.frame_document(doc);
        process
            .stdin
            .write_all(&block)
            .map_err(|e| IndexFeedError::process(process.command.to_string(), e.to_string()))?;
        self.written += 1;
        Ok(())
    }

    /// Close stdin and wait for the indexer to exit.
    ///
    /// Exit status 1 ("no documents indexed") is tolerated.
    pub fn finish(&mut self) -> Result<()> {
        let RunningProcess {
            command,
            mut child,
            mut stdin,
            _settings_file,
        } = self.process.take().ok_or_else(|| {
            IndexFeedError::InvalidInput(format!("indexer for {} is not running", self.handle))
        })?;
        self.state = IndexerState::Closed;

        let flushed = stdin.flush();
        drop(stdin);
        let status = child
            .wait()
            .map_err(|e| IndexFeedError::process(command.to_string(), e.to_string()))?;
        flushed.map_err(|e| IndexFeedError::process(command.to_string(), e.to_string()))?;

        match status.code() {
            Some(0) => {
                info!("Indexed {} documents into {}", self.written, self.handle);
                Ok(())
            }
            Some(NO_DOCUMENTS_STATUS) => {
                warn!("{}: no documents were indexed", command);
                Ok(())
            }
            _ => Err(IndexFeedError::process(command.to_string(), status.to_string())),
        }
    }

    /// Delete the target index files
    pub fn remove(&self) -> bool {
        self.handle.remove()
    }

    /// Rename the target index files
    pub fn rename(&mut self, new_base: impl Into<PathBuf>) -> bool {
        self.handle.rename(new_base)
    }

    /// Merge two or more source indexes into the target
    pub fn merge<I, H>(&mut self, sources: I) -> Result<()>
    where
        I: IntoIterator<Item = H>,
        H: Into<IndexHandle>,
    {
        let sources: Vec<IndexHandle> = sources.into_iter().map(Into::into).collect();
        if sources.len() < 2 {
            return Err(IndexFeedError::InvalidInput(format!(
                "merge needs at least 2 source indexes, got {}",
                sources.len()
            )));
        }
        let program = self.program()?;
        merge::merge_into(&program, &self.config, &self.handle, &sources)
    }

    /// Add one document to an existing native index.
    ///
    /// Builds a single-document scratch index and merges it in.
    pub fn add(&mut self, doc: &Document) -> Result<()> {
        if self.handle.format() == IndexFormat::Incremental {
            return Err(IndexFeedError::Unsupported(
                "adding single documents to incremental indexes is not implemented".to_string(),
            ));
        }
        if self.state == IndexerState::Running {
            return Err(IndexFeedError::InvalidInput(format!(
                "cannot add to {} while an indexing run is active",
                self.handle
            )));
        }

        let parent = self
            .handle
            .path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let scratch_dir = tempfile::Builder::new()
            .prefix(".indexfeed-add")
            .tempdir_in(parent)?;

        let mut scratch = Indexer::new(scratch_dir.path().join("add"), self.config.clone())
            .with_framer(Arc::clone(&self.framer));
        scratch.start()?;
        scratch.write(doc)?;
        scratch.finish()?;

        if !self.handle.exists() {
            // Nothing to merge with; the scratch index becomes the target
            merge::replace_index(scratch.handle(), &self.handle, scratch_dir.path())?;
            debug!("Created {} from a single document", self.handle);
            return Ok(());
        }

        let program = self.program()?;
        let result = merge::merge_into(&program, &self.config, &self.handle, &[scratch.handle().clone()]);
        scratch.remove();
        result
    }
}

impl DocumentSink for Indexer {
    fn accept(&mut self, doc: &Document) -> Result<()> {
        self.write(doc)
    }
}

impl Drop for Indexer {
    fn drop(&mut self) {
        if let Some(mut process) = self.process.take() {
            let _ = process.stdin.flush();
            drop(process.stdin);
            if let Err(e) = process.child.wait() {
                warn!("Failed to reap {}: {}", process.command, e);
            }
        }
    }
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("written", &self.written)
            .finish()
    }
}
