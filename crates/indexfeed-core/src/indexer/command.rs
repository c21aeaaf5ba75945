//! Indexer command lines

use crate::config::IndexerConfig;
use crate::error::{IndexFeedError, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Executable looked up in `PATH` when nothing else is configured
pub const DEFAULT_PROGRAM: &str = "swish-e";

/// Environment override for the executable
pub const PROGRAM_ENV: &str = "INDEXFEED_SWISH_BIN";

/// Resolve the indexer executable: environment, then config, then `PATH`
pub fn resolve_program(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(PROGRAM_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    which::which(DEFAULT_PROGRAM).map_err(|e| {
        IndexFeedError::Config(format!(
            "{} not found in PATH ({}); set {} or indexer.program",
            DEFAULT_PROGRAM, e, PROGRAM_ENV
        ))
    })
}

/// A fully built indexer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Free-form option strings, split on whitespace
    fn options(mut self, options: &[String]) -> Self {
        for option in options {
            self.args
                .extend(option.split_whitespace().map(OsString::from));
        }
        self
    }

    fn levels(self, config: &IndexerConfig) -> Self {
        self.arg("-v")
            .arg(config.verbosity.to_string())
            .arg("-W")
            .arg(config.warnings.to_string())
    }

    /// `PROG [options] -f INDEX -v N -W N -S prog -i stdin [-c CONFIG]`
    pub fn index(program: &Path, config: &IndexerConfig, index: &Path, config_file: Option<&Path>) -> Self {
        let cmd = Self::new(program)
            .options(&config.options)
            .arg("-f")
            .arg(index)
            .levels(config)
            .arg("-S")
            .arg("prog")
            .arg("-i")
            .arg("stdin");
        match config_file {
            Some(path) => cmd.arg("-c").arg(path),
            None => cmd,
        }
    }

    /// `PROG [options] -v N -W N -M INPUT... OUTPUT`
    pub fn merge(program: &Path, config: &IndexerConfig, inputs: &[&Path], output: &Path) -> Self {
        let mut cmd = Self::new(program)
            .options(&config.options)
            .levels(config)
            .arg("-M");
        for input in inputs {
            cmd = cmd.arg(input);
        }
        cmd.arg(output)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IndexerConfig {
        IndexerConfig {
            options: vec!["-e  -T".to_string()],
            verbosity: 0,
            warnings: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_index_command() {
        let cmd = CommandLine::index(
            Path::new("swish-e"),
            &config(),
            Path::new("out/index"),
            Some(Path::new("/tmp/x.conf")),
        );
        assert_eq!(
            cmd.to_string(),
            "swish-e -e -T -f out/index -v 0 -W 3 -S prog -i stdin -c /tmp/x.conf"
        );
    }

    #[test]
    fn test_index_command_without_config() {
        let cmd = CommandLine::index(Path::new("swish-e"), &IndexerConfig::default(), Path::new("i"), None);
        assert_eq!(cmd.to_string(), "swish-e -f i -v 1 -W 2 -S prog -i stdin");
    }

    #[test]
    fn test_merge_command() {
        let cmd = CommandLine::merge(
            Path::new("swish-e"),
            &config(),
            &[Path::new("A"), Path::new("B"), Path::new("C")],
            Path::new("tmp/A"),
        );
        assert_eq!(cmd.to_string(), "swish-e -e -T -v 0 -W 3 -M A B C tmp/A");
        assert_eq!(cmd.args().len(), 11);
    }
}
