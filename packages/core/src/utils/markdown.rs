//! Markdown helpers for note content
//!
//! Two jobs: strip formatting so content can be matched as plain text, and
//! pull the `[[Title]]` / `[[Title|alias]]` references out of a note body.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Compiled regex patterns for markdown stripping
///
/// The order of these patterns matters:
/// 1. Images first (to not conflict with links or italic)
/// 2. Links (before italic since links use brackets)
/// 3. Bold (before italic since ** conflicts with *)
/// 4. Other inline styles
/// 5. Line-start patterns (headers, lists, etc.)
static MARKDOWN_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Remove images FIRST: ![alt](url) -> alt
        (Regex::new(r"!\[([^\]]*)\]\([^)]+\)").unwrap(), "$1"),
        // Remove markdown links, keeping link text: [text](url) -> text
        (Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap(), "$1"),
        // Remove inline code: `code` -> code
        (Regex::new(r"`([^`]+)`").unwrap(), "$1"),
        // Remove bold: **text** or __text__ -> text (process before italic)
        (Regex::new(r"\*\*([^*]+)\*\*").unwrap(), "$1"),
        (Regex::new(r"__([^_]+)__").unwrap(), "$1"),
        // Remove strikethrough: ~~text~~ -> text
        (Regex::new(r"~~([^~]+)~~").unwrap(), "$1"),
        // Remove italic: *text* or _text_ -> text
        (Regex::new(r"\*([^*]+)\*").unwrap(), "$1"),
        (Regex::new(r"_([^_]+)_").unwrap(), "$1"),
        // Remove headers: # Header -> Header (up to 6 levels)
        (Regex::new(r"^#{1,6}\s+").unwrap(), ""),
        // Remove blockquote markers: > quote -> quote
        (Regex::new(r"^>\s*").unwrap(), ""),
        // Remove ordered list markers: 1. item -> item
        (Regex::new(r"^\d+\.\s+").unwrap(), ""),
        // Remove unordered list markers: - item or * item -> item
        (Regex::new(r"^[-*+]\s+").unwrap(), ""),
        // Remove horizontal rules
        (Regex::new(r"^[-*_]{3,}$").unwrap(), ""),
        // Remove HTML tags
        (Regex::new(r"<[^>]+>").unwrap(), ""),
    ]
});

/// `[[Title]]` or `[[Title|alias]]` on a single line
static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]|\n]+)(?:\|([^\[\]\n]*))?\]\]").unwrap());

/// Compiled regex for whitespace normalization
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A closed bracket reference found in note content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReference {
    /// Target title as written between the brackets
    pub title: String,
    /// Display text after `|`, if any
    pub alias: Option<String>,
}

impl ContentReference {
    /// Text a reader sees for this reference
    pub fn display_text(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.title)
    }
}

/// Strip markdown formatting from content to produce plain text
///
/// Bracket references are unwrapped to their display text so that content
/// search matches what a reader sees.
///
/// # Examples
///
/// ```
/// use notelink_core::utils::strip_markdown;
///
/// assert_eq!(strip_markdown("# Hello World"), "Hello World");
/// assert_eq!(strip_markdown("**bold** text"), "bold text");
/// assert_eq!(strip_markdown("see [[Roadmap|the plan]]"), "see the plan");
/// ```
pub fn strip_markdown(content: &str) -> String {
    let mut result = REFERENCE_RE
        .replace_all(content, |caps: &Captures| {
            let title = caps.get(1).map_or("", |m| m.as_str().trim());
            match caps.get(2).map(|m| m.as_str().trim()) {
                Some(alias) if !alias.is_empty() => alias.to_string(),
                _ => title.to_string(),
            }
        })
        .to_string();

    for (pattern, replacement) in MARKDOWN_PATTERNS.iter() {
        // Line-start patterns run line by line
        if replacement.is_empty() && pattern.as_str().starts_with('^') {
            result = result
                .lines()
                .map(|line| pattern.replace_all(line, *replacement).to_string())
                .collect::<Vec<_>>()
                .join("\n");
        } else {
            result = pattern.replace_all(&result, *replacement).to_string();
        }
    }

    result = WHITESPACE_RE.replace_all(&result, " ").to_string();
    result.trim().to_string()
}

/// Extract every closed bracket reference from `content`, in document order
///
/// Titles are trimmed; references with a blank title are skipped.
///
/// # Examples
///
/// ```
/// use notelink_core::utils::extract_references;
///
/// let refs = extract_references("See [[Roadmap]] and [[Q3 Goals|goals]].");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[1].title, "Q3 Goals");
/// assert_eq!(refs[1].alias.as_deref(), Some("goals"));
/// ```
pub fn extract_references(content: &str) -> Vec<ContentReference> {
    REFERENCE_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let title = caps.get(1)?.as_str().trim();
            if title.is_empty() {
                return None;
            }
            let alias = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|a| !a.is_empty())
                .map(str::to_string);
            Some(ContentReference {
                title: title.to_string(),
                alias,
            })
        })
        .collect()
}
