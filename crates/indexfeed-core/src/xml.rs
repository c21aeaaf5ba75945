//! Small XML builder for synthesized documents
//!
//! Text passed to [`XmlBuilder::text`] is always escaped; tag names are
//! sanitized with [`tag_safe`].

/// Escape text so it is safe between a start and end tag.
///
/// Markup characters become entities and characters that XML 1.0 forbids
/// are dropped.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_char(c) => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Sanitize an arbitrary name into a usable tag name: `[A-Za-z0-9_.-]`
/// only, and it must start with a letter or underscore.
pub fn tag_safe(name: &str) -> String {
    let mut tag: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let starts_ok = tag
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !starts_ok {
        tag.insert(0, '_');
    }
    tag
}

/// Incremental XML writer
#[derive(Debug, Default)]
pub struct XmlBuilder {
    buf: String,
    open: Vec<String>,
}

impl XmlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `<name attr="value" ...>`. The name is sanitized, attribute
    /// values are escaped.
    pub fn start_tag(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        let tag = tag_safe(name);
        self.buf.push('<');
        self.buf.push_str(&tag);
        for (key, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(&tag_safe(key));
            self.buf.push_str("=\"");
            self.buf.push_str(&escape(value));
            self.buf.push('"');
        }
        self.buf.push('>');
        self.open.push(tag);
        self
    }

    /// Close the most recently opened tag
    pub fn end_tag(&mut self) -> &mut Self {
        if let Some(tag) = self.open.pop() {
            self.buf.push_str("</");
            self.buf.push_str(&tag);
            self.buf.push('>');
        }
        self
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(&escape(text));
        self
    }

    /// `<name>text</name>`
    pub fn element(&mut self, name: &str, text: &str) -> &mut Self {
        self.start_tag(name, &[]).text(text).end_tag()
    }

    pub fn newline(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Close any open tags and return the document
    pub fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.end_tag();
        }
        self.buf
    }
}
