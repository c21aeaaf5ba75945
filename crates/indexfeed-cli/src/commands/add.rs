//! Add command

use super::indexer_config;
use crate::app::AddArgs;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexfeed_core::index::parser_hint_for;
use indexfeed_core::{Config, Document, Indexer, MimeResolver};

pub fn run(args: AddArgs, config: &Config) -> Result<()> {
    let content = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let mime = match args.mime {
        Some(mime) => mime,
        None => {
            let ext = args.file.extension().and_then(|e| e.to_str());
            MimeResolver::new()
                .strict(config.aggregator.strict_mime)
                .resolve(ext, &content)
        }
    };

    let url = args
        .url
        .unwrap_or_else(|| args.file.to_string_lossy().into_owned());
    let mut doc = Document::new(url, content, mime.as_str()).with_parser(parser_hint_for(&mime));
    if let Ok(modified) = std::fs::metadata(&args.file).and_then(|m| m.modified()) {
        doc = doc.with_mod_time(DateTime::<Utc>::from(modified));
    }

    let mut indexer = Indexer::new(args.index.clone(), indexer_config(config, &args.indexer));
    indexer.add(&doc)?;

    println!("Added {} to {}", doc.url, args.index.display());
    Ok(())
}
