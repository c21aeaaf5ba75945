//! Message metadata and MIME part extraction
//!
//! Only what indexing needs: envelope headers, encoded-word decoding,
//! transfer decoding, and a flattened list of leaf parts.

use super::{MailMessage, MailPart};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

lazy_static! {
    static ref ENCODED_WORD_RE: Regex = Regex::new(r"=\?([^?\s]+)\?([bBqQ])\?([^?\s]*)\?=").unwrap();
    static ref ADJACENT_WORDS_RE: Regex = Regex::new(r"\?=\s+=\?").unwrap();
    static ref DATE_COMMENT_RE: Regex = Regex::new(r"\s*\([^)]*\)\s*$").unwrap();
}

const MAX_DEPTH: usize = 16;

type Headers = Vec<(String, String)>;

struct Entity<'a> {
    headers: Headers,
    body: &'a [u8],
}

/// Parse a raw RFC 822 message
pub fn parse_message(raw: &[u8]) -> MailMessage {
    let entity = parse_entity(raw);
    let content_type = ContentType::from_headers(&entity.headers);

    let message_id = header(&entity.headers, "message-id")
        .map(|id| id.trim().trim_start_matches('<').trim_end_matches('>').to_string())
        .filter(|id| !id.is_empty());

    let subject = header(&entity.headers, "subject")
        .map(decode_words)
        .filter(|s| !s.trim().is_empty());

    let date = header(&entity.headers, "date").and_then(parse_date);

    let mut parts = Vec::new();
    collect_parts(&entity, &mut parts, 0);

    MailMessage {
        message_id,
        subject,
        date,
        size: raw.len() as u64,
        from: addresses(&entity.headers, "from"),
        to: addresses(&entity.headers, "to"),
        cc: addresses(&entity.headers, "cc"),
        bcc: addresses(&entity.headers, "bcc"),
        content_type: content_type.mime,
        parts,
    }
}

fn parse_entity(raw: &[u8]) -> Entity<'_> {
    let (head, body) = split_head_body(raw);
    Entity {
        headers: parse_headers(head),
        body,
    }
}

fn split_head_body(raw: &[u8]) -> (&[u8], &[u8]) {
    // Leading blank line means no headers at all
    if raw.starts_with(b"\r\n") {
        return (&[], &raw[2..]);
    }
    if raw.starts_with(b"\n") {
        return (&[], &raw[1..]);
    }
    let crlf = find(raw, b"\r\n\r\n", 0).map(|i| (i, i + 4));
    let lf = find(raw, b"\n\n", 0).map(|i| (i, i + 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };
    match split {
        Some((end, start)) => (&raw[..end], &raw[start..]),
        None => (raw, &[]),
    }
}

fn parse_headers(block: &[u8]) -> Headers {
    let text = String::from_utf8_lossy(block);
    let mut headers: Headers = Vec::new();
    for line in text.lines() {
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }
    headers
}

fn header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

fn addresses(headers: &Headers, name: &str) -> Vec<String> {
    headers
        .iter()
        .filter(|(n, _)| n == name)
        .flat_map(|(_, v)| split_addresses(&decode_words(v)))
        .collect()
}

/// Split an address list on commas outside quotes and angle brackets
pub fn split_addresses(value: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut angle = 0usize;
    for c in value.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => angle += 1,
            '>' if !in_quotes => angle = angle.saturating_sub(1),
            ',' if !in_quotes && angle == 0 => {
                out.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    out.push(current);
    out.into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let cleaned = DATE_COMMENT_RE.replace(value.trim(), "");
    DateTime::parse_from_rfc2822(&cleaned)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| debug!("Unparseable date {:?}: {}", value, e))
        .ok()
}

struct ContentType {
    mime: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    fn parse(value: &str) -> Self {
        let mut pieces = value.split(';');
        let mime = pieces
            .next()
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| m.contains('/'))
            .unwrap_or_else(|| "text/plain".to_string());
        let params = pieces
            .filter_map(|p| p.split_once('='))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().trim_matches('"').to_string()))
            .collect();
        Self { mime, params }
    }

    fn from_headers(headers: &Headers) -> Self {
        header(headers, "content-type")
            .map(Self::parse)
            .unwrap_or_else(|| Self::parse("text/plain"))
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn collect_parts(entity: &Entity<'_>, parts: &mut Vec<MailPart>, depth: usize) {
    let content_type = ContentType::from_headers(&entity.headers);

    if content_type.mime.starts_with("multipart/") && depth < MAX_DEPTH {
        if let Some(boundary) = content_type.param("boundary") {
            for raw in split_multipart(entity.body, boundary) {
                collect_parts(&parse_entity(raw), parts, depth + 1);
            }
            return;
        }
    }

    let encoding = header(&entity.headers, "content-transfer-encoding")
        .unwrap_or("7bit")
        .to_ascii_lowercase();
    let mut content = decode_transfer(entity.body, &encoding);
    if content_type.mime.starts_with("text/") {
        let charset = content_type.param("charset").unwrap_or("utf-8");
        content = decode_charset(&content, charset).into_bytes();
    }

    let name = header(&entity.headers, "content-disposition")
        .map(ContentType::parse)
        .and_then(|d| d.param("filename").map(str::to_string))
        .or_else(|| content_type.param("name").map(str::to_string))
        .map(|n| decode_words(&n));

    parts.push(MailPart {
        name,
        content_type: content_type.mime,
        content,
    });
}

fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{}", boundary);
    let delimiter = delimiter.as_bytes();
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let end = find(body, b"\n", pos).map(|i| i + 1).unwrap_or(body.len());
        let line = &body[pos..end];
        if line.starts_with(delimiter) {
            if let Some(s) = start {
                parts.push(trim_eol(&body[s..pos]));
            }
            if line[delimiter.len()..].starts_with(b"--") {
                return parts;
            }
            start = Some(end);
        }
        pos = end;
    }

    if let Some(s) = start.filter(|s| *s < body.len()) {
        parts.push(&body[s..]);
    }
    parts
}

fn trim_eol(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

fn decode_transfer(body: &[u8], encoding: &str) -> Vec<u8> {
    match encoding {
        "base64" => {
            let compact: Vec<u8> = body
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            STANDARD.decode(&compact).unwrap_or_else(|e| {
                debug!("Invalid base64 body: {}", e);
                body.to_vec()
            })
        }
        "quoted-printable" => decode_quoted_printable(body),
        _ => body.to_vec(),
    }
}

/// Decode quoted-printable, including soft line breaks
pub fn decode_quoted_printable(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if body[i] != b'=' {
            out.push(body[i]);
            i += 1;
            continue;
        }
        match (body.get(i + 1), body.get(i + 2)) {
            (Some(b'\r'), Some(b'\n')) => i += 3,
            (Some(b'\n'), _) => i += 2,
            (Some(&hi), Some(&lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                out.push(hex_value(hi) << 4 | hex_value(lo));
                i += 3;
            }
            _ => {
                out.push(b'=');
                i += 1;
            }
        }
    }
    out
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

fn decode_charset(bytes: &[u8], charset: &str) -> String {
    match charset.to_ascii_lowercase().as_str() {
        "iso-8859-1" | "latin1" | "latin-1" | "windows-1252" | "cp1252" => {
            bytes.iter().map(|&b| b as char).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decode RFC 2047 encoded words (`=?utf-8?B?...?=`)
pub fn decode_words(value: &str) -> String {
    if !value.contains("=?") {
        return value.to_string();
    }
    let joined = ADJACENT_WORDS_RE.replace_all(value, "?==?");
    ENCODED_WORD_RE
        .replace_all(&joined, |caps: &Captures<'_>| {
            let charset = &caps[1];
            let text = &caps[3];
            let bytes = if caps[2].eq_ignore_ascii_case("b") {
                match STANDARD.decode(text) {
                    Ok(bytes) => bytes,
                    Err(_) => return caps[0].to_string(),
                }
            } else {
                decode_quoted_printable(text.replace('_', " ").as_bytes())
            };
            decode_charset(&bytes, charset)
        })
        .into_owned()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
