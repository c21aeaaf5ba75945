//! CLI command handlers

pub mod add;
pub mod files;
pub mod index;
pub mod merge;
pub mod remove;
pub mod rename;
pub mod search;

use crate::app::{IndexFormatArg, IndexerOpts};
use indexfeed_core::{Config, IndexFormat, IndexerConfig};

/// Config file settings overridden by command-line flags
pub(crate) fn indexer_config(config: &Config, opts: &IndexerOpts) -> IndexerConfig {
    let mut indexer = config.indexer.clone();
    if let Some(format) = opts.index_format {
        indexer.format = format.into();
    }
    if let Some(headers) = opts.headers {
        indexer.header_version = headers.into();
    }
    indexer.options.extend(opts.swish_options.iter().cloned());
    indexer.debug |= opts.debug;
    indexer
}

pub(crate) fn index_format(config: &Config, arg: Option<IndexFormatArg>) -> IndexFormat {
    arg.map(Into::into).unwrap_or(config.indexer.format)
}
