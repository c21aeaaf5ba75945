//! File scanning for indexing
//!
//! Explicitly named files are visited before explicitly named directories.
//! Directory recursion prunes with `filter_entry`, so nothing below a
//! rejected directory is ever visited.
//!
//! Entries found under a directory root are judged by their path relative
//! to that root, so the location of the root itself never trips a rule.
//! Explicitly named files are judged by the path as given.

use super::rules::{RuleSet, RuleTarget};
use crate::config::AggregatorConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Version control directories, never descended into
pub const VCS_DIRS: &[&str] = &[".git", ".svn", "CVS", ".hg", ".bzr", "_darcs", "RCS", "SCCS"];

lazy_static! {
    /// Extensions accepted when no explicit list is configured
    static ref DEFAULT_EXT_RE: Regex = Regex::new(r"^[A-Za-z0-9_\-]{1,12}$").unwrap();
}

/// Scan result: the path plus a stat snapshot taken when it was classified
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub path: PathBuf,
    /// Lowercased extension, used as a MIME lookup hint
    pub ext: Option<String>,
    pub modified: DateTime<Utc>,
    pub size: u64,
}

impl ScanResult {
    fn from_metadata(path: PathBuf, ext: Option<String>, meta: &Metadata) -> Self {
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Self {
            path,
            ext,
            modified,
            size: meta.len(),
        }
    }
}

/// Why an entry was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Hidden,
    VersionControl,
    Extension,
    Rule,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let why = match self {
            Self::Hidden => "hidden",
            Self::VersionControl => "version control",
            Self::Extension => "extension not included",
            Self::Rule => "excluded by rule",
        };
        f.write_str(why)
    }
}

/// Directory and file acceptance tests
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    include_extensions: BTreeSet<String>,
    rules: RuleSet,
}

impl ScanFilter {
    pub fn new(config: &AggregatorConfig) -> Result<Self> {
        Ok(Self {
            include_extensions: config.include_extensions.clone(),
            rules: config.rule_set()?,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn dir_ok(&self, path: &Path) -> std::result::Result<(), Rejection> {
        if let Some(name) = path.file_name().map(|n| n.to_string_lossy()) {
            if is_hidden(&name) {
                return Err(Rejection::Hidden);
            }
            if VCS_DIRS.contains(&&*name) {
                return Err(Rejection::VersionControl);
            }
        }
        if self.rules.is_excluded(RuleTarget::Dir(path)) {
            return Err(Rejection::Rule);
        }
        Ok(())
    }

    /// Accept or reject a file; accepted files yield their extension
    pub fn file_ok(&self, path: &Path) -> std::result::Result<Option<String>, Rejection> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if name.starts_with('.') {
            return Err(Rejection::Hidden);
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        if self.include_extensions.is_empty() {
            if let Some(ext) = &ext {
                if !DEFAULT_EXT_RE.is_match(ext) {
                    return Err(Rejection::Extension);
                }
            }
        } else if !ext
            .as_ref()
            .map(|e| self.include_extensions.contains(e))
            .unwrap_or(false)
        {
            return Err(Rejection::Extension);
        }

        if in_vcs_path(path) {
            return Err(Rejection::VersionControl);
        }
        if self.rules.is_excluded(RuleTarget::File(path)) {
            return Err(Rejection::Rule);
        }
        Ok(ext)
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.') && name != "." && name != ".."
}

fn in_vcs_path(path: &Path) -> bool {
    path.parent()
        .map(|p| {
            p.components()
                .any(|c| VCS_DIRS.contains(&&*c.as_os_str().to_string_lossy()))
        })
        .unwrap_or(false)
}

/// Scan options
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub follow_symlinks: bool,
}

type Walker = Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + Send>;

/// Pull-style traversal over explicit files and directory trees
pub struct Scanner {
    filter: Arc<ScanFilter>,
    options: ScanOptions,
    files: VecDeque<PathBuf>,
    dirs: VecDeque<PathBuf>,
    walker: Option<Walker>,
    walk_root: Option<PathBuf>,
}

impl Scanner {
    /// Split `paths` into explicit files and directories. Paths that do not
    /// exist are kept as files so that reading them reports the error.
    pub fn new(paths: &[PathBuf], filter: ScanFilter, options: ScanOptions) -> Self {
        let (dirs, files): (Vec<_>, Vec<_>) = paths.iter().cloned().partition(|p| p.is_dir());
        Self {
            filter: Arc::new(filter),
            options,
            files: files.into(),
            dirs: dirs.into(),
            walker: None,
            walk_root: None,
        }
    }

    pub fn filter(&self) -> &ScanFilter {
        &self.filter
    }

    fn open_walker(&self, root: &Path) -> Walker {
        let filter = Arc::clone(&self.filter);
        let base = root.to_path_buf();
        let walker = WalkDir::new(root)
            .follow_links(self.options.follow_symlinks)
            .into_iter()
            .filter_entry(move |e| {
                // Explicitly named roots are always entered
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                match filter.dir_ok(relative_to(&base, e.path())) {
                    Ok(()) => true,
                    Err(why) => {
                        debug!("Pruning {} ({})", e.path().display(), why);
                        false
                    }
                }
            });
        Box::new(walker)
    }

    fn next_explicit_file(&mut self) -> Option<Result<ScanResult>> {
        while let Some(path) = self.files.pop_front() {
            match self.filter.file_ok(&path) {
                Ok(ext) => {
                    return Some(
                        std::fs::metadata(&path)
                            .map(|meta| ScanResult::from_metadata(path, ext, &meta))
                            .map_err(Into::into),
                    );
                }
                Err(why) => debug!("Skipping {} ({})", path.display(), why),
            }
        }
        None
    }
}

impl Iterator for Scanner {
    type Item = Result<ScanResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.next_explicit_file() {
            return Some(item);
        }

        loop {
            if self.walker.is_none() {
                let root = self.dirs.pop_front()?;
                self.walker = Some(self.open_walker(&root));
                self.walk_root = Some(root);
            }

            let entry = match self.walker.as_mut().and_then(|w| w.next()) {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => return Some(Err(e.into())),
                None => {
                    self.walker = None;
                    self.walk_root = None;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                if !entry.file_type().is_dir() {
                    debug!("Skipping non-regular entry {}", entry.path().display());
                }
                continue;
            }

            let judged = match &self.walk_root {
                Some(root) => relative_to(root, entry.path()),
                None => entry.path(),
            };
            match self.filter.file_ok(judged) {
                Ok(ext) => {
                    return Some(
                        entry
                            .metadata()
                            .map(|meta| ScanResult::from_metadata(entry.path().to_path_buf(), ext, &meta))
                            .map_err(Into::into),
                    );
                }
                Err(why) => debug!("Skipping {} ({})", entry.path().display(), why),
            }
        }
    }
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// Collect every accepted file under `root`
pub fn scan_files(root: &Path, config: &AggregatorConfig) -> Result<Vec<ScanResult>> {
    let filter = ScanFilter::new(config)?;
    let options = ScanOptions {
        follow_symlinks: config.follow_symlinks,
    };
    Scanner::new(&[root.to_path_buf()], filter, options).collect()
}
