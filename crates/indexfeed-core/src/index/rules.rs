//! Inclusion and exclusion rules
//!
//! Rules come from declarative lines of the form
//! `[FileRules|FileMatch] <scope> <action> <pattern>`, where scope is one of
//! `filename`, `pathname`, `dirname` and `title`, and action is one of `is`,
//! `contains` and `regex`. `FileRules` (or `exclude`, the default) excludes;
//! `FileMatch` (or `include`) includes. The first rule that applies and
//! matches decides.
//!
//! `pathname` and `dirname` rules see the path the scanner hands them,
//! which is relative to the directory being indexed.

use crate::error::{IndexFeedError, Result};
use regex::Regex;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Exclude,
    Include,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Filename,
    Pathname,
    Dirname,
    Title,
}

impl RuleScope {
    fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "filename" | "file" => Some(Self::Filename),
            "pathname" | "path" => Some(Self::Pathname),
            "dirname" | "directory" | "dir" => Some(Self::Dirname),
            "title" => Some(Self::Title),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RuleAction {
    Is(String),
    Contains(String),
    Regex(Regex),
}

impl RuleAction {
    fn matches(&self, subject: &str) -> bool {
        match self {
            Self::Is(s) => subject == s,
            Self::Contains(s) => subject.contains(s.as_str()),
            Self::Regex(re) => re.is_match(subject),
        }
    }
}

/// What a rule is evaluated against
#[derive(Debug, Clone, Copy)]
pub enum RuleTarget<'a> {
    File(&'a Path),
    Dir(&'a Path),
    Title(&'a str),
}

#[derive(Debug, Clone)]
pub struct FileRule {
    pub verdict: Verdict,
    pub scope: RuleScope,
    pub action: RuleAction,
    source: String,
}

impl FileRule {
    /// Parse one rule line
    pub fn parse(line: &str) -> Result<Self> {
        let invalid = |why: &str| IndexFeedError::Config(format!("invalid rule `{}`: {}", line, why));

        let mut rest = line.trim();
        let mut verdict = Verdict::Exclude;
        let (first, tail) = split_word(rest);
        match first.to_ascii_lowercase().as_str() {
            "filerules" | "exclude" => {
                rest = tail;
            }
            "filematch" | "include" => {
                verdict = Verdict::Include;
                rest = tail;
            }
            _ => {}
        }

        let (scope_word, tail) = split_word(rest);
        let scope = RuleScope::parse(scope_word).ok_or_else(|| invalid("unknown scope"))?;
        let (action_word, pattern) = split_word(tail);
        if pattern.is_empty() {
            return Err(invalid("missing pattern"));
        }

        let action = match action_word.to_ascii_lowercase().as_str() {
            "is" => RuleAction::Is(pattern.to_string()),
            "contains" => RuleAction::Contains(pattern.to_string()),
            "regex" => RuleAction::Regex(Regex::new(&regex_body(pattern))?),
            _ => return Err(invalid("unknown action")),
        };

        Ok(Self {
            verdict,
            scope,
            action,
            source: line.trim().to_string(),
        })
    }

    /// Subject string this rule looks at for `target`, if the scope applies
    fn subject<'a>(&self, target: RuleTarget<'a>) -> Option<std::borrow::Cow<'a, str>> {
        match (self.scope, target) {
            (RuleScope::Filename, RuleTarget::File(path)) => {
                path.file_name().map(|n| n.to_string_lossy())
            }
            (RuleScope::Pathname, RuleTarget::File(path) | RuleTarget::Dir(path)) => {
                Some(path.to_string_lossy())
            }
            (RuleScope::Dirname, RuleTarget::Dir(path)) => Some(path.to_string_lossy()),
            (RuleScope::Title, RuleTarget::Title(title)) => Some(title.into()),
            _ => None,
        }
    }

    pub fn matches(&self, target: RuleTarget<'_>) -> bool {
        self.subject(target)
            .map(|s| self.action.matches(&s))
            .unwrap_or(false)
    }
}

impl fmt::Display for FileRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim()),
        None => (s, ""),
    }
}

/// Accept `/body/flags` as well as a bare pattern
fn regex_body(pattern: &str) -> String {
    if let Some(inner) = pattern.strip_prefix('/') {
        if let Some(end) = inner.rfind('/') {
            let (body, flags) = (&inner[..end], &inner[end + 1..]);
            if flags.chars().all(|c| c == 'i') {
                return if flags.is_empty() {
                    body.to_string()
                } else {
                    format!("(?i){}", body)
                };
            }
        }
    }
    pattern.to_string()
}

/// Ordered rule list
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<FileRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rule lines; blank lines and `#` comments are skipped
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let rules = lines
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(FileRule::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn push(&mut self, rule: FileRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn has_scope(&self, scope: RuleScope) -> bool {
        self.rules.iter().any(|rule| rule.scope == scope)
    }

    /// Verdict of the first rule that applies to `target` and matches
    pub fn verdict(&self, target: RuleTarget<'_>) -> Option<Verdict> {
        self.rules
            .iter()
            .find(|rule| rule.matches(target))
            .map(|rule| rule.verdict)
    }

    pub fn is_excluded(&self, target: RuleTarget<'_>) -> bool {
        self.verdict(target) == Some(Verdict::Exclude)
    }
}
