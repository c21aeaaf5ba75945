//! Files command

use super::index_format;
use crate::app::{FilesArgs, OutputFormat};
use crate::output::{format_index_files, IndexFile};
use anyhow::Result;
use indexfeed_core::{Config, IndexHandle};

pub fn run(args: FilesArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let handle = IndexHandle::new(args.index, index_format(config, args.index_format));
    let files: Vec<IndexFile> = handle
        .associated_files()
        .into_iter()
        .map(|path| {
            let exists = path.is_file();
            IndexFile { path, exists }
        })
        .collect();

    print!("{}", format_index_files(&files, format));
    Ok(())
}
