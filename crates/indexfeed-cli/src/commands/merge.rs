//! Merge command

use super::indexer_config;
use crate::app::MergeArgs;
use anyhow::Result;
use indexfeed_core::{Config, Indexer};

pub fn run(args: MergeArgs, config: &Config) -> Result<()> {
    let mut indexer = Indexer::new(args.index.clone(), indexer_config(config, &args.indexer));
    indexer.merge(args.sources.iter().cloned())?;

    println!(
        "Merged {} indexes into {}",
        args.sources.len(),
        args.index.display()
    );
    Ok(())
}
