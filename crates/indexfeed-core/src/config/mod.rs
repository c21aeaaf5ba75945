//! Configuration management

pub mod settings;

pub use settings::IndexerSettings;

use crate::error::Result;
use crate::headers::HeaderVersion;
use crate::index::RuleSet;
use crate::indexer::IndexFormat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// External indexer settings
    #[serde(default)]
    pub indexer: IndexerConfig,

    /// Traversal and inclusion rules
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

/// How to run the external indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Path to the swish-e executable (resolved from PATH when unset)
    #[serde(default)]
    pub program: Option<PathBuf>,

    /// `-v` level
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,

    /// `-W` level
    #[serde(default = "default_warnings")]
    pub warnings: u8,

    /// Extra options placed before the generated flags
    #[serde(default)]
    pub options: Vec<String>,

    /// Echo indexer output
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub format: IndexFormat,

    #[serde(default)]
    pub header_version: HeaderVersion,

    /// Directives materialized into a config file passed with `-c`
    #[serde(default)]
    pub settings: BTreeMap<String, Vec<String>>,

    /// Where to write the materialized settings (temp file when unset)
    #[serde(default)]
    pub config_file: Option<PathBuf>,
}

fn default_verbosity() -> u8 {
    1
}

fn default_warnings() -> u8 {
    2
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            program: None,
            verbosity: default_verbosity(),
            warnings: default_warnings(),
            options: Vec::new(),
            debug: env_flag("INDEXFEED_DEBUG"),
            format: IndexFormat::default(),
            header_version: HeaderVersion::from_env(),
            settings: BTreeMap::new(),
            config_file: None,
        }
    }
}

impl IndexerConfig {
    /// Settings store for the `-c` file, if any directives are configured
    pub fn settings_store(&self) -> Option<IndexerSettings> {
        if self.settings.is_empty() {
            return None;
        }
        let mut store = IndexerSettings::new();
        for (key, values) in &self.settings {
            store.set(key, values.iter().cloned());
        }
        Some(store)
    }
}

/// Which files and documents are eligible for indexing
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AggregatorConfig {
    /// Extensions to accept; empty accepts any plausible extension
    #[serde(default)]
    pub include_extensions: BTreeSet<String>,

    /// Ordered rule lines, e.g. `FileRules filename contains ~$`
    #[serde(default)]
    pub rules: Vec<String>,

    #[serde(default)]
    pub follow_symlinks: bool,

    /// Prefer sniffed content type over the extension-derived one
    #[serde(default)]
    pub strict_mime: bool,

    /// Skip documents larger than this many bytes
    #[serde(default)]
    pub max_size: Option<u64>,
}

impl AggregatorConfig {
    pub fn with_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include_extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_rule(mut self, line: impl Into<String>) -> Self {
        self.rules.push(line.into());
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Parse the rule lines once
    pub fn rule_set(&self) -> Result<RuleSet> {
        RuleSet::parse(&self.rules)
    }
}

impl Config {
    /// Load config from `INDEXFEED_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("INDEXFEED_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from a specific path; a missing file yields defaults
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| !v.is_empty() && v != "0")
        .unwrap_or(false)
}
