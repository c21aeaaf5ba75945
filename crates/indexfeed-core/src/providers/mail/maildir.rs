use super::parse::parse_message;
use super::{MailMessage, MailStore};
use crate::error::{IndexFeedError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const MAILDIR_SUBDIRS: &[&str] = &["cur", "new", "tmp"];

/// Maildir tree on disk
///
/// Messages live in `cur/` and `new/`; any other subdirectory is a child
/// folder (plain nesting or Maildir++ `.Name` directories).
#[derive(Debug, Clone)]
pub struct MaildirStore {
    root: PathBuf,
    name: String,
}

impl MaildirStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(IndexFeedError::Config(format!(
                "Mail directory not found: {}",
                root.display()
            )));
        }
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mail".to_string());
        Ok(Self {
            root: root.to_path_buf(),
            name,
        })
    }

    fn dir_for(&self, folder: &str) -> PathBuf {
        let relative = folder
            .strip_prefix(&self.name)
            .unwrap_or(folder)
            .trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

impl MailStore for MaildirStore {
    fn root_folder(&self) -> String {
        self.name.clone()
    }

    fn subfolders(&self, folder: &str) -> Result<Vec<String>> {
        let mut children = Vec::new();
        for entry in fs::read_dir(self.dir_for(folder))? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if MAILDIR_SUBDIRS.contains(&name.as_str()) {
                continue;
            }
            children.push(format!("{}/{}", folder, name));
        }
        children.sort();
        Ok(children)
    }

    fn message_keys(&self, folder: &str) -> Result<Vec<String>> {
        let dir = self.dir_for(folder);
        let mut keys = Vec::new();
        for sub in ["cur", "new"] {
            let path = dir.join(sub);
            if !path.is_dir() {
                continue;
            }
            let mut names: Vec<String> = fs::read_dir(&path)?
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| !n.starts_with('.'))
                .collect();
            names.sort();
            keys.extend(names.into_iter().map(|n| format!("{}/{}", sub, n)));
        }
        Ok(keys)
    }

    fn load(&self, folder: &str, key: &str) -> Result<MailMessage> {
        let path = self.dir_for(folder).join(key);
        let raw = fs::read(&path).map_err(|e| {
            IndexFeedError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {:?}: {}", path, e),
            ))
        })?;
        Ok(parse_message(&raw))
    }
}
