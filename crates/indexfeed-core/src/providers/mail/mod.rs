//! Mail store provider
//!
//! Walks a folder tree depth-first (each folder's own messages first, then
//! its subfolders in sorted order) and turns every message into one XML
//! document. Attachments are indexed when a content filter handles their
//! declared type.

mod maildir;
pub mod parse;

pub use maildir::MaildirStore;

use super::{FilterHook, SourceProvider};
use crate::document::{Document, ParserHint};
use crate::error::{IndexFeedError, Result};
use crate::filters::FilterChain;
use crate::index::mime::is_text_type;
use crate::xml::XmlBuilder;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

const NO_SUBJECT: &str = "(no subject)";

/// A parsed message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailMessage {
    pub message_id: Option<String>,
    pub subject: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// Size of the raw message in bytes
    pub size: u64,
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub content_type: String,
    pub parts: Vec<MailPart>,
}

/// One leaf MIME part, already transfer-decoded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailPart {
    pub name: Option<String>,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// A hierarchical store of mail folders
///
/// Folder names are full paths separated by `/`, starting at
/// [`MailStore::root_folder`].
pub trait MailStore {
    fn root_folder(&self) -> String;

    /// Direct children of `folder`, as full folder names
    fn subfolders(&self, folder: &str) -> Result<Vec<String>>;

    /// Keys of the messages stored directly in `folder`
    fn message_keys(&self, folder: &str) -> Result<Vec<String>>;

    fn load(&self, folder: &str, key: &str) -> Result<MailMessage>;
}

/// In-memory store, mainly for embedding and tests
#[derive(Debug, Clone)]
pub struct MemoryMailStore {
    root: String,
    folders: BTreeMap<String, Vec<MailMessage>>,
}

impl MemoryMailStore {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let mut folders = BTreeMap::new();
        folders.insert(root.clone(), Vec::new());
        Self { root, folders }
    }

    /// Add a message to `folder` (relative to the root), creating it as needed
    pub fn add(&mut self, folder: &str, message: MailMessage) -> &mut Self {
        let mut path = self.root.clone();
        for segment in folder.split('/').filter(|s| !s.is_empty()) {
            path.push('/');
            path.push_str(segment);
            self.folders.entry(path.clone()).or_default();
        }
        self.folders.entry(path).or_default().push(message);
        self
    }
}

impl MailStore for MemoryMailStore {
    fn root_folder(&self) -> String {
        self.root.clone()
    }

    fn subfolders(&self, folder: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", folder);
        Ok(self
            .folders
            .keys()
            .filter(|name| {
                name.strip_prefix(&prefix)
                    .map(|rest| !rest.is_empty() && !rest.contains('/'))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    fn message_keys(&self, folder: &str) -> Result<Vec<String>> {
        let messages = self
            .folders
            .get(folder)
            .ok_or_else(|| IndexFeedError::InvalidInput(format!("No such folder: {}", folder)))?;
        Ok((0..messages.len()).map(|i| i.to_string()).collect())
    }

    fn load(&self, folder: &str, key: &str) -> Result<MailMessage> {
        key.parse::<usize>()
            .ok()
            .and_then(|i| self.folders.get(folder)?.get(i).cloned())
            .ok_or_else(|| IndexFeedError::InvalidInput(format!("No message {} in {}", key, folder)))
    }
}

/// A message reference produced while walking the store
#[derive(Debug, Clone, PartialEq)]
pub struct MailItem {
    pub folder: String,
    pub key: String,
}

/// Provider over any [`MailStore`]
pub struct MailProvider<S: MailStore> {
    store: S,
    folders: Option<Vec<String>>,
    pending: VecDeque<MailItem>,
    filters: FilterChain,
    mail_filter: Option<FilterHook<MailMessage>>,
    counter: u64,
}

impl<S: MailStore> MailProvider<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            folders: None,
            pending: VecDeque::new(),
            filters: FilterChain::with_defaults(),
            mail_filter: None,
            counter: 0,
        }
    }

    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Hook that may rewrite each message before it is serialized
    pub fn with_mail_filter(mut self, hook: impl Fn(MailMessage) -> MailMessage + Send + Sync + 'static) -> Self {
        self.mail_filter = Some(Box::new(hook));
        self
    }

    /// Load the next folder's message keys and queue its subfolders
    fn open_folder(&mut self, folder: String) -> Result<()> {
        let mut children = self.store.subfolders(&folder)?;
        children.sort();
        if let Some(stack) = self.folders.as_mut() {
            stack.extend(children.into_iter().rev());
        }

        let keys = self.store.message_keys(&folder)?;
        debug!("Folder {}: {} messages", folder, keys.len());
        self.pending.extend(keys.into_iter().map(|key| MailItem {
            folder: folder.clone(),
            key,
        }));
        Ok(())
    }

    fn render_part(&self, part: &MailPart) -> Option<String> {
        match self.filters.filter(&part.content, &part.content_type) {
            Ok(Some(output)) => Some(String::from_utf8_lossy(&output.content).into_owned()),
            Ok(None) if is_text_type(&part.content_type) => {
                Some(String::from_utf8_lossy(&part.content).into_owned())
            }
            Ok(None) => {
                debug!("Skipping {} part {:?}", part.content_type, part.name);
                None
            }
            Err(e) => {
                warn!("Skipping {} part {:?}: {}", part.content_type, part.name, e);
                None
            }
        }
    }

    fn build_xml(&self, folder: &str, message: &MailMessage) -> String {
        let subject = message.subject.as_deref().unwrap_or(NO_SUBJECT);
        let date = message.date.map(|d| d.to_rfc2822()).unwrap_or_default();

        let mut xml = XmlBuilder::new();
        xml.start_tag("message", &[])
            .newline()
            .start_tag("head", &[])
            .newline()
            .element("swishtitle", subject)
            .newline()
            .element("folder", folder)
            .newline()
            .element("id", message.message_id.as_deref().unwrap_or_default())
            .newline()
            .element("date", &date)
            .newline()
            .element("size", &message.size.to_string())
            .newline()
            .element("from", &message.from.join(", "))
            .newline()
            .element("to", &message.to.join(", "))
            .newline()
            .element("cc", &message.cc.join(", "))
            .newline()
            .element("bcc", &message.bcc.join(", "))
            .newline()
            .element("type", &message.content_type)
            .newline()
            .end_tag()
            .newline()
            .start_tag("body", &[])
            .newline();

        for part in &message.parts {
            let Some(text) = self.render_part(part) else {
                continue;
            };
            let name = part.name.as_deref().unwrap_or_default();
            xml.start_tag("part", &[("name", name), ("type", &part.content_type)])
                .text(&text)
                .end_tag()
                .newline();
        }

        xml.end_tag().newline().end_tag();
        xml.finish()
    }
}

impl<S: MailStore> SourceProvider for MailProvider<S> {
    type Item = MailItem;

    fn provider_type(&self) -> &'static str {
        "mail"
    }

    fn next_item(&mut self) -> Option<Result<MailItem>> {
        if self.folders.is_none() {
            self.folders = Some(vec![self.store.root_folder()]);
        }

        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(Ok(item));
            }
            let folder = self.folders.as_mut()?.pop()?;
            if let Err(e) = self.open_folder(folder) {
                return Some(Err(e));
            }
        }
    }

    fn describe(&self, item: &MailItem) -> String {
        format!("{}/{}", item.folder, item.key)
    }

    fn to_document(&mut self, item: MailItem) -> Result<Document> {
        let mut message = self.store.load(&item.folder, &item.key)?;
        if let Some(hook) = &self.mail_filter {
            message = hook(message);
        }

        self.counter += 1;
        let id = message
            .message_id
            .clone()
            .unwrap_or_else(|| self.counter.to_string());
        let url = format!("{}.{}", item.folder, id);
        let xml = self.build_xml(&item.folder, &message);

        let mut doc = Document::new(url, xml, "application/xml").with_parser(ParserHint::Xml);
        if let Some(date) = message.date {
            doc = doc.with_mod_time(date);
        }
        Ok(doc)
    }
}
