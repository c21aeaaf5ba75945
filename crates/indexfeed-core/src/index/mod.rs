//! Traversal and classification
//!
//! File scanning, inclusion rules, content types, and title extraction.

pub mod mime;
mod parser;
pub mod rules;
mod scanner;

pub use mime::{parser_hint_for, MimeResolver};
pub use parser::*;
pub use rules::{FileRule, RuleAction, RuleScope, RuleSet, RuleTarget, Verdict};
pub use scanner::*;
