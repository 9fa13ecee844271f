//! Utility functions for Notelink Core
//!
//! Text helpers shared by the detectors, the resolver and the engine.

mod markdown;
mod slug;

pub use markdown::{extract_references, strip_markdown, ContentReference};
pub use slug::{slugify, suffixed_slug, FALLBACK_SLUG};
