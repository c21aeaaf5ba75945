//! Index handles and their on-disk file sets

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk index format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    /// Full rebuild format: base file plus `.prop`
    #[default]
    Native,
    /// Btree-backed incremental format
    Incremental,
}

impl IndexFormat {
    /// File suffixes appended to the base name, base file first
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            Self::Native => &["", ".prop"],
            Self::Incremental => &["", ".array", ".file", ".btree", ".psort", ".wdata", ".prop"],
        }
    }
}

impl std::str::FromStr for IndexFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "incremental" => Ok(Self::Incremental),
            other => Err(format!("unknown index format: {}", other)),
        }
    }
}

/// Every file that makes up the index at `base`, in a fixed order
pub fn associated_files(base: &Path, format: IndexFormat) -> Vec<PathBuf> {
    format
        .suffixes()
        .iter()
        .map(|suffix| with_suffix(base, suffix))
        .collect()
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// A named index on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHandle {
    path: PathBuf,
    format: IndexFormat,
}

impl IndexHandle {
    pub fn new(path: impl Into<PathBuf>, format: IndexFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> IndexFormat {
        self.format
    }

    pub fn associated_files(&self) -> Vec<PathBuf> {
        associated_files(&self.path, self.format)
    }

    /// Whether the base index file is present
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Delete every associated file.
    ///
    /// Keeps going past failures, logging each, and returns `false` if any
    /// file could not be removed. Files that are already gone count as removed.
    pub fn remove(&self) -> bool {
        let mut ok = true;
        for file in self.associated_files() {
            match fs::remove_file(&file) {
                Ok(()) => debug!("Removed {}", file.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove {}: {}", file.display(), e);
                    ok = false;
                }
            }
        }
        ok
    }

    /// Rename every associated file to `new_base`, keeping suffixes.
    ///
    /// The handle points at `new_base` afterwards, even on partial failure.
    pub fn rename(&mut self, new_base: impl Into<PathBuf>) -> bool {
        let new_base = new_base.into();
        let mut ok = true;
        for suffix in self.format.suffixes() {
            let from = with_suffix(&self.path, suffix);
            let to = with_suffix(&new_base, suffix);
            if let Err(e) = fs::rename(&from, &to) {
                warn!("Failed to rename {} to {}: {}", from.display(), to.display(), e);
                ok = false;
            }
        }
        self.path = new_base;
        ok
    }
}

impl std::fmt::Display for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl From<&str> for IndexHandle {
    fn from(path: &str) -> Self {
        Self::new(path, IndexFormat::Native)
    }
}

impl From<String> for IndexHandle {
    fn from(path: String) -> Self {
        Self::new(path, IndexFormat::Native)
    }
}

impl From<PathBuf> for IndexHandle {
    fn from(path: PathBuf) -> Self {
        Self::new(path, IndexFormat::Native)
    }
}

impl From<&Path> for IndexHandle {
    fn from(path: &Path) -> Self {
        Self::new(path, IndexFormat::Native)
    }
}
