//! Rename command

use super::index_format;
use crate::app::RenameArgs;
use anyhow::{bail, Result};
use indexfeed_core::{Config, IndexFeedError, IndexHandle};

pub fn run(args: RenameArgs, config: &Config) -> Result<()> {
    let mut handle = IndexHandle::new(args.index, index_format(config, args.index_format));
    if !handle.exists() {
        return Err(IndexFeedError::IndexNotFound(handle.to_string()).into());
    }
    let old = handle.to_string();
    if !handle.rename(&args.new_name) {
        bail!("Failed to rename every file of {} to {}", old, handle);
    }
    println!("Renamed {} to {}", old, handle);
    Ok(())
}
