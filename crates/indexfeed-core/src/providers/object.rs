//! In-memory object provider
//!
//! Turns any iterator of [`Indexable`] values into XML documents, one
//! element per configured accessor.

use super::{FilterHook, SourceProvider};
use crate::document::{Document, ParserHint};
use crate::error::Result;
use crate::xml::XmlBuilder;
use serde_json::Value;

/// An object that can be indexed by accessor name
pub trait Indexable {
    /// Used as the document root tag
    fn class_name(&self) -> String;

    /// Value of the named accessor, `None` when the object has no such accessor
    fn call(&self, accessor: &str) -> Option<Value>;

    /// Title fallback when no title accessor is configured or it yields nothing
    fn display(&self) -> String;
}

impl Indexable for Value {
    fn class_name(&self) -> String {
        self.get("class")
            .and_then(Value::as_str)
            .unwrap_or("object")
            .to_string()
    }

    fn call(&self, accessor: &str) -> Option<Value> {
        self.get(accessor).cloned()
    }

    fn display(&self) -> String {
        self.to_string()
    }
}

/// Serializes non-scalar accessor values before they are embedded
pub trait ValueSerializer: Send + Sync {
    fn serialize(&self, value: &Value) -> Result<String>;
}

/// YAML rendering, the default
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlSerializer;

impl ValueSerializer for YamlSerializer {
    fn serialize(&self, value: &Value) -> Result<String> {
        let text = serde_yaml::to_string(value)?;
        Ok(text.trim_end().to_string())
    }
}

/// Pretty-printed JSON rendering
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl ValueSerializer for JsonSerializer {
    fn serialize(&self, value: &Value) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

/// Provider over a sequence of objects
pub struct ObjectProvider<I>
where
    I: Iterator,
    I::Item: Indexable,
{
    objects: I,
    accessors: Vec<String>,
    title_accessor: Option<String>,
    url_accessor: Option<String>,
    serializer: Box<dyn ValueSerializer>,
    object_filter: Option<FilterHook<I::Item>>,
    counter: u64,
}

impl<I> ObjectProvider<I>
where
    I: Iterator,
    I::Item: Indexable,
{
    pub fn new<T, S>(objects: T, accessors: &[S]) -> Self
    where
        T: IntoIterator<IntoIter = I>,
        S: AsRef<str>,
    {
        Self {
            objects: objects.into_iter(),
            accessors: accessors.iter().map(|a| a.as_ref().to_string()).collect(),
            title_accessor: None,
            url_accessor: None,
            serializer: Box::new(YamlSerializer),
            object_filter: None,
            counter: 0,
        }
    }

    pub fn with_title_accessor(mut self, accessor: impl Into<String>) -> Self {
        self.title_accessor = Some(accessor.into());
        self
    }

    pub fn with_url_accessor(mut self, accessor: impl Into<String>) -> Self {
        self.url_accessor = Some(accessor.into());
        self
    }

    pub fn with_serializer(mut self, serializer: impl ValueSerializer + 'static) -> Self {
        self.serializer = Box::new(serializer);
        self
    }

    /// Hook that may substitute each object before it is serialized
    pub fn with_object_filter(mut self, hook: impl Fn(I::Item) -> I::Item + Send + Sync + 'static) -> Self {
        self.object_filter = Some(Box::new(hook));
        self
    }

    fn render(&self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => self.serializer.serialize(value)?,
        })
    }

    fn scalar(&self, object: &I::Item, accessor: Option<&str>) -> Result<Option<String>> {
        match accessor.and_then(|a| object.call(a)) {
            Some(value) => Ok(Some(self.render(&value)?).filter(|s| !s.is_empty())),
            None => Ok(None),
        }
    }
}

impl<I> SourceProvider for ObjectProvider<I>
where
    I: Iterator,
    I::Item: Indexable,
{
    type Item = I::Item;

    fn provider_type(&self) -> &'static str {
        "object"
    }

    fn next_item(&mut self) -> Option<Result<I::Item>> {
        self.objects.next().map(Ok)
    }

    fn describe(&self, item: &I::Item) -> String {
        item.class_name()
    }

    fn to_document(&mut self, item: I::Item) -> Result<Document> {
        let object = match &self.object_filter {
            Some(hook) => hook(item),
            None => item,
        };
        self.counter += 1;

        let title = self
            .scalar(&object, self.title_accessor.as_deref())?
            .unwrap_or_else(|| object.display());
        let url = self
            .scalar(&object, self.url_accessor.as_deref())?
            .unwrap_or_else(|| self.counter.to_string());

        let mut xml = XmlBuilder::new();
        xml.start_tag(&object.class_name(), &[])
            .newline()
            .element("swishtitle", &title)
            .newline();
        for accessor in &self.accessors {
            let text = match object.call(accessor) {
                Some(value) => self.render(&value)?,
                None => String::new(),
            };
            xml.element(accessor, &text).newline();
        }
        xml.end_tag();

        Ok(Document::new(url, xml.finish(), "application/xml").with_parser(ParserHint::Xml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drain<P: SourceProvider>(provider: &mut P) -> Vec<Document> {
        let mut docs = Vec::new();
        while let Some(item) = provider.next_item() {
            docs.push(provider.to_document(item.unwrap()).unwrap());
        }
        docs
    }

    #[test]
    fn test_object_documents() {
        let objects = vec![
            json!({"class": "My::Movie", "title": "Alien", "year": 1979, "cast": ["Weaver", "Hurt"]}),
            json!({"class": "My::Movie", "title": "Heat", "year": 1995}),
        ];
        let mut provider = ObjectProvider::new(objects, &["title", "year", "cast"]).with_title_accessor("title");
        let docs = drain(&mut provider);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].url, "1");
        assert_eq!(docs[1].url, "2");
        let xml = docs[0].content_str();
        assert!(xml.starts_with("<My__Movie>"));
        assert!(xml.contains("<swishtitle>Alien</swishtitle>"));
        assert!(xml.contains("<year>1979</year>"));
        assert!(xml.contains("<cast>- Weaver\n- Hurt</cast>"));
        assert!(docs[1].content_str().contains("<cast></cast>"));
        assert_eq!(docs[0].parser_hint, ParserHint::Xml);
    }

    #[test]
    fn test_title_falls_back_to_display() {
        let mut provider = ObjectProvider::new(vec![json!({"a": 1})], &["a"]);
        let docs = drain(&mut provider);
        assert!(docs[0].content_str().contains("<swishtitle>{&quot;a&quot;:1}</swishtitle>"));
        assert!(docs[0].content_str().starts_with("<object>"));
    }

    #[test]
    fn test_url_accessor_and_filter() {
        let mut provider = ObjectProvider::new(vec![json!({"id": "x1"})], &["id"])
            .with_url_accessor("id")
            .with_object_filter(|_| json!({"id": "replaced"}));
        let docs = drain(&mut provider);
        assert_eq!(docs[0].url, "replaced");
    }

    #[test]
    fn test_json_serializer() {
        let mut provider =
            ObjectProvider::new(vec![json!({"tags": {"k": "v"}})], &["tags"]).with_serializer(JsonSerializer);
        let docs = drain(&mut provider);
        assert!(docs[0].content_str().contains("&quot;k&quot;: &quot;v&quot;"));
    }
}
