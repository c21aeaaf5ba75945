//! Merging indexes through a scratch copy
//!
//! The indexer cannot merge into one of its own inputs, so the result is
//! written to a scratch index beside the target and renamed over it only
//! after the merge process succeeded.

use super::command::CommandLine;
use super::handle::IndexHandle;
use crate::config::IndexerConfig;
use crate::error::{IndexFeedError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Above this many inputs the merge may run out of file descriptors
pub const MAX_MERGE_SOURCES: usize = 60;

/// Merge `target` (when it exists) and `sources` into `target`.
///
/// Source-count validation belongs to the caller.
pub(crate) fn merge_into(
    program: &Path,
    config: &IndexerConfig,
    target: &IndexHandle,
    sources: &[IndexHandle],
) -> Result<()> {
    if sources.len() > MAX_MERGE_SOURCES {
        warn!(
            "Merging {} indexes at once may exceed the open file limit",
            sources.len()
        );
    }

    let parent = target
        .path()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let scratch_dir = tempfile::Builder::new()
        .prefix(".indexfeed-merge")
        .tempdir_in(parent)?;
    let file_name = target
        .path()
        .file_name()
        .ok_or_else(|| IndexFeedError::InvalidInput(format!("Invalid index name: {}", target)))?;
    let scratch = IndexHandle::new(scratch_dir.path().join(file_name), target.format());

    let mut inputs: Vec<&Path> = Vec::with_capacity(sources.len() + 1);
    if target.exists() {
        inputs.push(target.path());
    }
    inputs.extend(sources.iter().map(IndexHandle::path));

    let cmd = CommandLine::merge(program, config, &inputs, scratch.path());
    debug!("Running: {}", cmd);
    let output = cmd
        .to_command()
        .output()
        .map_err(|e| IndexFeedError::process(cmd.to_string(), e.to_string()))?;

    for line in String::from_utf8_lossy(&output.stdout)
        .lines()
        .chain(String::from_utf8_lossy(&output.stderr).lines())
    {
        if config.debug {
            info!("{}", line);
        } else {
            debug!("{}", line);
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IndexFeedError::process(
            cmd.to_string(),
            format!("{}: {}", output.status, stderr.trim()),
        ));
    }

    if let Err(e) = replace_index(&scratch, target, scratch_dir.path()) {
        return Err(IndexFeedError::process(
            cmd.to_string(),
            format!("could not move merged index onto {}: {}", target, e),
        ));
    }
    info!("Merged {} indexes into {}", inputs.len(), target);
    Ok(())
}

/// Move every file of `built` onto `target`.
///
/// The current target files are parked under `staging` first and moved
/// back if any step fails, so the target is either fully replaced or left
/// as it was. `staging` must be on the same filesystem as the target.
pub(crate) fn replace_index(built: &IndexHandle, target: &IndexHandle, staging: &Path) -> io::Result<()> {
    let parking = tempfile::Builder::new().prefix("previous").tempdir_in(staging)?;
    let parked_handle = IndexHandle::new(parking.path().join("index"), target.format());

    let mut parked = Vec::new();
    let mut installed = Vec::new();
    let result = move_files(
        target.associated_files().into_iter().zip(parked_handle.associated_files()),
        true,
        &mut parked,
    )
    .and_then(|()| {
        move_files(
            built.associated_files().into_iter().zip(target.associated_files()),
            false,
            &mut installed,
        )
    });

    if let Err(e) = result {
        warn!("Restoring {} after failed replace: {}", target, e);
        for (from, to) in installed.iter().rev().chain(parked.iter().rev()) {
            if let Err(e) = fs::rename(to, from) {
                warn!("Failed to move {} back to {}: {}", to.display(), from.display(), e);
            }
        }
        return Err(e);
    }
    Ok(())
}

/// Rename each pair, recording the ones that moved
fn move_files(
    pairs: impl Iterator<Item = (PathBuf, PathBuf)>,
    skip_missing: bool,
    moved: &mut Vec<(PathBuf, PathBuf)>,
) -> io::Result<()> {
    for (from, to) in pairs {
        if skip_missing && !from.exists() {
            continue;
        }
        fs::rename(&from, &to)?;
        moved.push((from, to));
    }
    Ok(())
}
