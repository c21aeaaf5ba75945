//! Remove command

use super::index_format;
use crate::app::RemoveArgs;
use anyhow::{bail, Result};
use indexfeed_core::{Config, IndexHandle};

pub fn run(args: RemoveArgs, config: &Config) -> Result<()> {
    let handle = IndexHandle::new(args.index, index_format(config, args.index_format));
    if !handle.remove() {
        bail!("Failed to remove every file of {}", handle);
    }
    println!("Removed {}", handle);
    Ok(())
}
