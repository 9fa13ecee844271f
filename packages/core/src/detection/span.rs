//! Open-span detection for bracket references and hashtags
//!
//! Both detectors take the full editor text and a cursor offset and scan
//! backward from the cursor to find the marker that opened the span. They keep
//! no state between calls; every keystroke re-derives the span from scratch.
//!
//! All offsets are 0-based and count Unicode scalar values, not bytes.

use serde::{Deserialize, Serialize};

const REFERENCE_OPEN: [char; 2] = ['[', '['];
const REFERENCE_CLOSE: [char; 2] = [']', ']'];

/// Which marker opened a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// `[[` bracket reference
    Reference,
    /// `#` hashtag
    Hashtag,
}

/// An open reference being typed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub kind: SpanKind,
    /// Offset of the opening marker
    pub start: usize,
    /// Offset of the cursor
    pub end: usize,
    /// Text between the marker and the cursor
    pub query: String,
}

impl Span {
    /// Replace the span in `text` with `replacement`
    ///
    /// Returns the new text and the cursor offset just after the replacement.
    pub fn replace_in(&self, text: &str, replacement: &str) -> (String, usize) {
        let chars: Vec<char> = text.chars().collect();
        let start = self.start.min(chars.len());
        let end = self.end.clamp(start, chars.len());

        let mut out: String = chars[..start].iter().collect();
        out.push_str(replacement);
        out.extend(&chars[end..]);

        (out, start + replacement.chars().count())
    }
}

/// Detects an open span at the cursor
pub trait SpanDetector {
    fn kind(&self) -> SpanKind;

    /// Scan `chars` backward from `cursor`; return the opener offset and the
    /// offset where the query begins
    fn find_opener(&self, chars: &[char], cursor: usize) -> Option<(usize, usize)>;

    /// Whether the text after the cursor already closes the span
    fn closed_ahead(&self, _chars: &[char], _cursor: usize) -> bool {
        false
    }

    fn detect(&self, text: &str, cursor: usize) -> Option<Span> {
        let chars: Vec<char> = text.chars().collect();
        let cursor = cursor.min(chars.len());

        let (start, query_start) = self.find_opener(&chars, cursor)?;
        if self.closed_ahead(&chars, cursor) {
            return None;
        }

        Some(Span {
            kind: self.kind(),
            start,
            end: cursor,
            query: chars[query_start..cursor].iter().collect(),
        })
    }
}

/// `[[Title` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceDetector;

impl SpanDetector for ReferenceDetector {
    fn kind(&self) -> SpanKind {
        SpanKind::Reference
    }

    fn find_opener(&self, chars: &[char], cursor: usize) -> Option<(usize, usize)> {
        let mut i = cursor;
        while i >= 2 {
            let pair = [chars[i - 2], chars[i - 1]];
            if chars[i - 1] == '\n' {
                return None;
            }
            if pair == REFERENCE_OPEN {
                return Some((i - 2, i));
            }
            if pair == REFERENCE_CLOSE {
                return None;
            }
            i -= 1;
        }
        None
    }

    fn closed_ahead(&self, chars: &[char], cursor: usize) -> bool {
        // Cursor between the two closing brackets
        if cursor > 0
            && cursor < chars.len()
            && [chars[cursor - 1], chars[cursor]] == REFERENCE_CLOSE
        {
            return true;
        }
        let mut j = cursor;
        while j < chars.len() {
            if chars[j] == '\n' {
                return false;
            }
            if j + 1 < chars.len() {
                let pair = [chars[j], chars[j + 1]];
                if pair == REFERENCE_CLOSE {
                    return true;
                }
                if pair == REFERENCE_OPEN {
                    return false;
                }
            }
            j += 1;
        }
        false
    }
}

/// `#tag` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct HashtagDetector;

/// Characters allowed inside a hashtag
pub fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '/')
}

impl SpanDetector for HashtagDetector {
    fn kind(&self) -> SpanKind {
        SpanKind::Hashtag
    }

    fn find_opener(&self, chars: &[char], cursor: usize) -> Option<(usize, usize)> {
        let mut i = cursor;
        while i > 0 && is_tag_char(chars[i - 1]) {
            i -= 1;
        }
        if i == 0 || chars[i - 1] != '#' {
            return None;
        }

        let hash = i - 1;
        if hash > 0 && !chars[hash - 1].is_whitespace() {
            return None;
        }
        Some((hash, i))
    }
}

/// Detect an open `[[` reference at `cursor`
///
/// # Examples
///
/// ```
/// use notelink_core::detection::detect_reference_span;
///
/// let span = detect_reference_span("See [[Projec", 12).unwrap();
/// assert_eq!((span.start, span.end), (4, 12));
/// assert_eq!(span.query, "Projec");
///
/// assert!(detect_reference_span("See [[Done]] note", 16).is_none());
/// ```
pub fn detect_reference_span(text: &str, cursor: usize) -> Option<Span> {
    ReferenceDetector.detect(text, cursor)
}

/// Detect an open `#tag` at `cursor`
pub fn detect_hashtag_span(text: &str, cursor: usize) -> Option<Span> {
    HashtagDetector.detect(text, cursor)
}

/// Replace an open reference span with `[[title]]`
///
/// Returns the new text and the cursor offset after the closing brackets.
pub fn complete_reference(text: &str, span: &Span, title: &str) -> (String, usize) {
    span.replace_in(text, &format!("[[{}]]", title))
}

/// Replace an open hashtag span with `#tag` followed by a space
pub fn complete_hashtag(text: &str, span: &Span, tag: &str) -> (String, usize) {
    span.replace_in(text, &format!("#{} ", tag))
}
