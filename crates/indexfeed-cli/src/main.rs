//! Indexfeed CLI
//!
//! Aggregate documents and drive the Swish-e indexer.

use anyhow::Result;
use clap::Parser;
use indexfeed_core::error::exit_codes;
use indexfeed_core::{Config, IndexFeedError};

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<IndexFeedError>()
            .map(IndexFeedError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Index(args) => commands::index::run(args, &config),
        Commands::Add(args) => commands::add::run(args, &config),
        Commands::Merge(args) => commands::merge::run(args, &config),
        Commands::Rm(args) => commands::remove::run(args, &config),
        Commands::Mv(args) => commands::rename::run(args, &config),
        Commands::Search(args) => commands::search::run(args, &config, cli.format),
        Commands::Files(args) => commands::files::run(args, &config, cli.format),
    }
}
