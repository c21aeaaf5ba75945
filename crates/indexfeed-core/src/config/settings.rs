//! Key-value settings store materialized as an indexer config file

use crate::error::Result;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Indexer directives, one `Key value...` line each
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexerSettings {
    entries: BTreeMap<String, Vec<String>>,
}

impl IndexerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the values of `key`
    pub fn set<I, S>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(key.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Append one value to a multi-valued key
    pub fn push(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.entries
            .entry(key.to_string())
            .or_default()
            .push(value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as config text: sorted keys, values space-joined
    pub fn to_config_text(&self) -> String {
        let mut out = String::new();
        for (key, values) in &self.entries {
            out.push_str(key);
            if !values.is_empty() {
                out.push(' ');
                out.push_str(&values.join(" "));
            }
            out.push('\n');
        }
        out
    }

    /// Write to a caller-chosen path
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_text())?;
        Ok(())
    }

    /// Write to a temporary file that lives as long as the returned handle
    pub fn write_temp(&self) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("indexfeed-")
            .suffix(".conf")
            .tempfile()?;
        file.write_all(self.to_config_text().as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}
