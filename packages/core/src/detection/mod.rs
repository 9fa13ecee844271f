//! Reference and hashtag detection
//!
//! Synchronous, pure functions over editor text. See [`SpanDetector`] for the
//! scanning rules and [`SpanTracker`] for keystroke-to-keystroke state.

mod span;
mod tracker;

pub use span::{
    complete_hashtag, complete_reference, detect_hashtag_span, detect_reference_span,
    is_tag_char, HashtagDetector, ReferenceDetector, Span, SpanDetector, SpanKind,
};
pub use tracker::{SpanTracker, SpanTransition};

#[cfg(test)]
#[path = "detection_test.rs"]
mod detection_test;
