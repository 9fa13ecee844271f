//! Span tracking across keystrokes
//!
//! The detectors are stateless. `SpanTracker` remembers the last span it saw
//! so the editor knows when to rerun or cancel resolution.

use super::span::{HashtagDetector, ReferenceDetector, Span, SpanDetector, SpanKind};

/// What changed between two consecutive `update` calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanTransition {
    /// A new span became active (also reported when the cursor jumps to a
    /// different opener)
    Opened(Span),
    /// Same opener, different query
    QueryChanged(Span),
    /// The active span went away
    Closed,
    Unchanged,
}

/// Holds the currently active span for one detector kind
#[derive(Debug, Clone)]
pub struct SpanTracker {
    kind: SpanKind,
    active: Option<Span>,
}

impl SpanTracker {
    pub fn new(kind: SpanKind) -> Self {
        Self { kind, active: None }
    }

    pub fn references() -> Self {
        Self::new(SpanKind::Reference)
    }

    pub fn hashtags() -> Self {
        Self::new(SpanKind::Hashtag)
    }

    pub fn active(&self) -> Option<&Span> {
        self.active.as_ref()
    }

    /// Re-detect at `cursor` and report the transition
    pub fn update(&mut self, text: &str, cursor: usize) -> SpanTransition {
        let detected = match self.kind {
            SpanKind::Reference => ReferenceDetector.detect(text, cursor),
            SpanKind::Hashtag => HashtagDetector.detect(text, cursor),
        };

        let transition = match (&self.active, &detected) {
            (None, None) => SpanTransition::Unchanged,
            (Some(_), None) => SpanTransition::Closed,
            (None, Some(span)) => SpanTransition::Opened(span.clone()),
            (Some(prev), Some(span)) if prev.start != span.start => {
                SpanTransition::Opened(span.clone())
            }
            (Some(prev), Some(span)) if prev.query != span.query => {
                SpanTransition::QueryChanged(span.clone())
            }
            (Some(_), Some(_)) => SpanTransition::Unchanged,
        };

        self.active = detected;
        transition
    }

    /// Forget the active span, e.g. after a completion was inserted
    pub fn reset(&mut self) {
        self.active = None;
    }
}
