//! HTML content to Markdown-flavoured plain text.
//!
//! [`Linearizer`] walks a content root block by block and hands each
//! paragraph or list item to [`InlineFormatter`], which renders emphasis and
//! links in place. The joined output goes through [`normalize_whitespace`].

use lazy_static::lazy_static;
use regex::Regex;

pub mod blocks;
pub mod inline;

pub use blocks::Linearizer;
pub use inline::{InlineFormatter, InlineRules};

lazy_static! {
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t\u{a0}]+").unwrap();
    static ref EXTRA_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Collapses horizontal whitespace, trims every line and keeps at most one
/// blank line between paragraphs. Applying it twice changes nothing.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = HORIZONTAL_SPACE.replace_all(text, " ");
    let trimmed_lines = collapsed
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    EXTRA_NEWLINES
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}
