//! Search command

use crate::app::{OutputFormat, SearchArgs};
use crate::output::format_search_results;
use anyhow::Result;
use indexfeed_core::{Config, Searcher};

pub fn run(args: SearchArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let query = args.query.join(" ");

    let mut searcher = Searcher::new(args.index, config.indexer.clone());
    if let Some(max) = args.max {
        searcher = searcher.with_max_results(max);
    }

    let results: Vec<_> = searcher.search(&query)?.collect();
    print!("{}", format_search_results(&results, format));
    Ok(())
}
