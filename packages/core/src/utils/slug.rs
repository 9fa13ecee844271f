//! Slug derivation for note titles

/// Slug used when a title has no alphanumeric characters
pub const FALLBACK_SLUG: &str = "untitled";

/// Derive a URL-safe slug from a title
///
/// Lower-case ASCII alphanumerics are kept; every other run of characters
/// collapses to a single `-`. Leading and trailing dashes are trimmed.
///
/// # Examples
///
/// ```
/// use notelink_core::utils::slugify;
///
/// assert_eq!(slugify("Project Alpha"), "project-alpha");
/// assert_eq!(slugify("  Q3 -- Goals!  "), "q3-goals");
/// assert_eq!(slugify("???"), "untitled");
/// ```
pub fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Append a numeric suffix to a base slug: `roadmap` → `roadmap-2`
pub fn suffixed_slug(base: &str, n: usize) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Project"), "my-project");
        assert_eq!(slugify("Test  Project!"), "test-project");
        assert_eq!(slugify("already-slugged"), "already-slugged");
        assert_eq!(slugify("Project 123"), "project-123");
    }

    #[test]
    fn test_slugify_non_ascii_collapses() {
        assert_eq!(slugify("Café Notes"), "caf-notes");
        assert_eq!(slugify("日本語"), FALLBACK_SLUG);
        assert_eq!(slugify(""), FALLBACK_SLUG);
    }

    #[test]
    fn test_suffixed_slug() {
        assert_eq!(suffixed_slug("roadmap", 1), "roadmap");
        assert_eq!(suffixed_slug("roadmap", 2), "roadmap-2");
        assert_eq!(suffixed_slug("roadmap", 10), "roadmap-10");
    }
}
