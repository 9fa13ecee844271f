//! Tests for reference and hashtag detection
//!
//! Tests cover:
//! - Open, closed and nested bracket spans
//! - Hashtag boundaries and tag characters
//! - Completion text and cursor placement
//! - Tracker transitions across keystrokes

#[cfg(test)]
mod tests {
    use crate::detection::*;

    // =========================================================================
    // Reference detection
    // =========================================================================

    #[test]
    fn test_open_reference() {
        let span = detect_reference_span("See [[Projec", 12).unwrap();
        assert_eq!(span.kind, SpanKind::Reference);
        assert_eq!(span.start, 4);
        assert_eq!(span.end, 12);
        assert_eq!(span.query, "Projec");
    }

    #[test]
    fn test_closed_reference_ahead_of_cursor() {
        assert_eq!(detect_reference_span("See [[Done]] note", 16), None);
        // Cursor inside the brackets of a closed reference
        assert_eq!(detect_reference_span("See [[Done]] note", 8), None);
    }

    #[test]
    fn test_cursor_right_after_closing_brackets() {
        assert_eq!(detect_reference_span("[[Done]]", 8), None);
    }

    #[test]
    fn test_cursor_between_closing_brackets() {
        assert_eq!(detect_reference_span("[[A]]", 4), None);
        assert_eq!(detect_reference_span("See [[Done]] note", 11), None);
    }

    #[test]
    fn test_nested_opener_uses_innermost() {
        let span = detect_reference_span("[[A[[B", 6).unwrap();
        assert_eq!(span.start, 3);
        assert_eq!(span.query, "B");
    }

    #[test]
    fn test_empty_query_right_after_opener() {
        let span = detect_reference_span("Hello [[", 8).unwrap();
        assert_eq!(span.start, 6);
        assert_eq!(span.query, "");
    }

    #[test]
    fn test_newline_breaks_reference() {
        assert_eq!(detect_reference_span("[[Proj\nect", 10), None);
        assert_eq!(detect_reference_span("[[\n", 3), None);
    }

    #[test]
    fn test_no_opener() {
        assert_eq!(detect_reference_span("plain text", 5), None);
        assert_eq!(detect_reference_span("[single", 7), None);
        assert_eq!(detect_reference_span("", 0), None);
    }

    #[test]
    fn test_open_reference_followed_by_newer_opener() {
        let span = detect_reference_span("[[Alp [[Beta]]", 5).unwrap();
        assert_eq!(span.query, "Alp");
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        let span = detect_reference_span("Café [[Ré", 9).unwrap();
        assert_eq!(span.start, 5);
        assert_eq!(span.query, "Ré");
    }

    #[test]
    fn test_cursor_past_end_is_clamped() {
        let span = detect_reference_span("[[Abc", 99).unwrap();
        assert_eq!(span.end, 5);
        assert_eq!(span.query, "Abc");
    }

    // =========================================================================
    // Hashtag detection
    // =========================================================================

    #[test]
    fn test_hashtag_at_start_and_after_space() {
        let span = detect_hashtag_span("#proj", 5).unwrap();
        assert_eq!((span.start, span.end), (0, 5));
        assert_eq!(span.query, "proj");

        let span = detect_hashtag_span("tagged #work/q3-plan_x", 22).unwrap();
        assert_eq!(span.start, 7);
        assert_eq!(span.query, "work/q3-plan_x");
    }

    #[test]
    fn test_hashtag_empty_query() {
        let span = detect_hashtag_span("note #", 6).unwrap();
        assert_eq!(span.kind, SpanKind::Hashtag);
        assert_eq!(span.query, "");
    }

    #[test]
    fn test_hashtag_requires_boundary_before_hash() {
        assert_eq!(detect_hashtag_span("issue#12", 8), None);
    }

    #[test]
    fn test_hashtag_ended_by_whitespace_or_punctuation() {
        assert_eq!(detect_hashtag_span("#done now", 9), None);
        assert_eq!(detect_hashtag_span("#a.b", 4), None);
    }

    // =========================================================================
    // Completion
    // =========================================================================

    #[test]
    fn test_complete_reference() {
        let text = "See [[Projec and more";
        let span = detect_reference_span(text, 12).unwrap();
        let (out, cursor) = complete_reference(text, &span, "Project Alpha");
        assert_eq!(out, "See [[Project Alpha]] and more");
        assert_eq!(cursor, 21);
        assert_eq!(detect_reference_span(&out, cursor), None);
    }

    #[test]
    fn test_complete_hashtag() {
        let text = "todo #wo";
        let span = detect_hashtag_span(text, 8).unwrap();
        let (out, cursor) = complete_hashtag(text, &span, "work");
        assert_eq!(out, "todo #work ");
        assert_eq!(cursor, 11);
    }

    // =========================================================================
    // Tracker
    // =========================================================================

    #[test]
    fn test_tracker_lifecycle() {
        let mut tracker = SpanTracker::references();

        assert_eq!(tracker.update("See ", 4), SpanTransition::Unchanged);

        match tracker.update("See [[", 6) {
            SpanTransition::Opened(span) => assert_eq!(span.query, ""),
            other => panic!("expected Opened, got {:?}", other),
        }

        match tracker.update("See [[P", 7) {
            SpanTransition::QueryChanged(span) => assert_eq!(span.query, "P"),
            other => panic!("expected QueryChanged, got {:?}", other),
        }

        assert_eq!(tracker.update("See [[P", 7), SpanTransition::Unchanged);
        assert_eq!(tracker.update("See [[P]]", 9), SpanTransition::Closed);
        assert!(tracker.active().is_none());
    }

    #[test]
    fn test_tracker_reports_new_opener_as_opened() {
        let mut tracker = SpanTracker::references();
        tracker.update("[[A", 3);

        match tracker.update("[[A [[B", 7) {
            SpanTransition::Opened(span) => {
                assert_eq!(span.start, 4);
                assert_eq!(span.query, "B");
            }
            other => panic!("expected Opened, got {:?}", other),
        }
    }

    #[test]
    fn test_tracker_hashtags_and_reset() {
        let mut tracker = SpanTracker::hashtags();
        assert!(matches!(tracker.update("#a", 2), SpanTransition::Opened(_)));
        tracker.reset();
        assert!(matches!(tracker.update("#a", 2), SpanTransition::Opened(_)));
    }
}
