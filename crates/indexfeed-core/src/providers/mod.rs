//! Source provider abstraction
//!
//! Provides a unified interface for pulling documents from different sources:
//! - File system (directory trees and explicit files)
//! - Databases (SQLite tables, one document per row)
//! - Mail stores (Maildir folders, one document per message)
//! - In-memory objects (one document per object)
//!
//! Each provider implements the SourceProvider trait so the pipeline can
//! drive any of them the same way.

use crate::document::Document;
use crate::error::Result;

pub mod file;
pub mod mail;
pub mod object;
pub mod sql;

pub use file::FileProvider;
pub use mail::{MailMessage, MailPart, MailProvider, MailStore, MaildirStore, MemoryMailStore};
pub use object::{Indexable, ObjectProvider, ValueSerializer, YamlSerializer};
pub use sql::{SqlProvider, SqlRow, TableSpec};

/// Source provider trait - all content sources must implement this
pub trait SourceProvider {
    /// Raw item produced by the source
    type Item;

    /// Provider type identifier (e.g., "file", "sql", "mail")
    fn provider_type(&self) -> &'static str;

    /// Pull the next raw item; `None` once the source is exhausted
    fn next_item(&mut self) -> Option<Result<Self::Item>>;

    /// Cheap pre-check before the item is read
    fn is_eligible(&self, _item: &Self::Item) -> bool {
        true
    }

    /// Human-readable name of an item for log messages
    fn describe(&self, item: &Self::Item) -> String;

    /// Turn a raw item into a document
    fn to_document(&mut self, item: Self::Item) -> Result<Document>;
}

/// Optional hook deciding a title from a raw item
pub type TitleHook<T> = Box<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// Optional hook deciding a url from a raw item
pub type UrlHook<T> = Box<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// Optional hook that replaces a raw item before it is converted
pub type FilterHook<T> = Box<dyn Fn(T) -> T + Send + Sync>;
