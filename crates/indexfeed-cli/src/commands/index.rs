//! Index command

use super::indexer_config;
use crate::app::{IndexArgs, IndexSource};
use anyhow::{Context, Result};
use indexfeed_core::{
    AggregatorConfig, Config, DocumentSink, FileProvider, HeaderFramer, Indexer, MailProvider,
    MaildirStore, Pipeline, SourceProvider, SqlProvider, TableSpec, WireSink,
};
use std::io::{BufWriter, Write};

pub fn run(args: IndexArgs, config: &Config) -> Result<()> {
    let indexer_cfg = indexer_config(config, &args.indexer);

    if args.stdout {
        let stdout = std::io::stdout();
        let sink = WireSink::new(
            BufWriter::new(stdout.lock()),
            HeaderFramer::new(indexer_cfg.header_version),
        );
        let (count, sink) = feed_source(&args.source, config, sink)?;
        sink.into_inner().flush()?;
        tracing::info!("Wrote {} documents to stdout", count);
        return Ok(());
    }

    let index = args
        .index
        .context("an index name is required unless --stdout is given")?;
    let mut indexer = Indexer::new(index.clone(), indexer_cfg);
    indexer.start()?;
    let (count, mut indexer) = feed_source(&args.source, config, indexer)?;
    indexer.finish()?;

    println!("Indexed {} documents into {}", count, index.display());
    Ok(())
}

fn feed_source<S: DocumentSink>(source: &IndexSource, config: &Config, sink: S) -> Result<(usize, S)> {
    match source {
        IndexSource::Fs {
            paths,
            extensions,
            rules,
            follow_symlinks,
            max_size,
        } => {
            let mut aggregator = config.aggregator.clone();
            if !extensions.is_empty() {
                aggregator = aggregator.with_extensions(extensions);
            }
            if *follow_symlinks {
                aggregator = aggregator.with_follow_symlinks(true);
            }
            for rule in rules {
                aggregator = aggregator.with_rule(rule.as_str());
            }
            if max_size.is_some() {
                aggregator.max_size = *max_size;
            }
            let mut provider = FileProvider::new(paths, &aggregator)?;
            feed(&mut provider, &aggregator, sink)
        }
        IndexSource::Db {
            database,
            tables,
            title_column,
            url_column,
            description_columns,
        } => {
            let mut provider = SqlProvider::open(&database.to_string_lossy())?;
            let customized =
                title_column.is_some() || url_column.is_some() || !description_columns.is_empty();
            let tables = if tables.is_empty() && customized {
                provider.list_tables()?
            } else {
                tables.clone()
            };
            for table in tables {
                let mut spec = TableSpec::new(table);
                if let Some(column) = title_column {
                    spec = spec.with_title_column(column.as_str());
                }
                if let Some(column) = url_column {
                    spec = spec.with_url_column(column.as_str());
                }
                for column in description_columns {
                    spec = spec.with_description_column(column.as_str());
                }
                provider = provider.with_table(spec);
            }
            feed(&mut provider, &config.aggregator, sink)
        }
        IndexSource::Mail { maildir } => {
            let mut provider = MailProvider::new(MaildirStore::open(maildir)?);
            feed(&mut provider, &config.aggregator, sink)
        }
    }
}

fn feed<P: SourceProvider, S: DocumentSink>(
    provider: &mut P,
    aggregator: &AggregatorConfig,
    sink: S,
) -> Result<(usize, S)> {
    let mut pipeline = Pipeline::new(sink, aggregator)?;
    let count = pipeline.index_source(provider)?;

    let stats = pipeline.stats();
    if stats.skipped > 0 || stats.failed > 0 {
        eprintln!(
            "Skipped {} documents, {} failed ({} seen)",
            stats.skipped, stats.failed, stats.seen
        );
    }
    Ok((count, pipeline.into_sink()))
}
