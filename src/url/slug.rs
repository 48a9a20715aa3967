//! Conversions between display labels and URL path segments

use crate::url::normalize::canonical;
use crate::UrlError;
use url::{form_urlencoded, Url};

/// Turns a display label into a path segment by joining its words
///
/// ```
/// use canopy::url::slugify;
///
/// assert_eq!(slugify("  iPhone   12 Pro ", '_'), "iPhone_12_Pro");
/// ```
pub fn slugify(label: &str, join_char: char) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(&join_char.to_string())
}

/// Synthesizes a category URL for a label under `base`
///
/// Used when no real link could be matched to a breadcrumb label, so the
/// trail can keep going instead of aborting.
pub fn fallback_url(base: &str, label: &str, join_char: char) -> Result<String, UrlError> {
    let mut url = Url::parse(base).map_err(|e| UrlError::Parse(e.to_string()))?;
    let slug = slugify(label, join_char);

    url.path_segments_mut()
        .map_err(|_| UrlError::Malformed(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .push(&slug);

    Ok(canonical(url.as_str()))
}

/// Turns a path segment back into a display label
///
/// ```
/// use canopy::url::label_from_segment;
///
/// assert_eq!(label_from_segment("Galaxy_S%2010", '_'), "Galaxy S 10");
/// ```
pub fn label_from_segment(segment: &str, join_char: char) -> String {
    // Only percent escapes should be decoded; keep pair separators literal
    let escaped = segment
        .replace('&', "%26")
        .replace('=', "%3D")
        .replace('+', "%2B");
    let decoded = form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_else(|| segment.to_string());

    decoded
        .replace(join_char, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the path segments of `target` that lie below `base`
///
/// `None` when the two URLs are on different origins or `target` is not
/// under `base`.
pub fn segments_below(base: &str, target: &str) -> Option<Vec<String>> {
    let base = Url::parse(base).ok()?;
    let target = Url::parse(target).ok()?;

    if base.origin() != target.origin() {
        return None;
    }

    let base_segments: Vec<&str> = base
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    let target_segments: Vec<&str> = target
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();

    if target_segments.len() < base_segments.len()
        || target_segments[..base_segments.len()] != base_segments[..]
    {
        return None;
    }

    Some(
        target_segments[base_segments.len()..]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
}

/// Builds the URL formed by `base` plus the given path segments
///
/// Segments are taken as they appear in a URL path (already escaped).
pub fn join_segments(base: &str, segments: &[String]) -> Option<String> {
    let mut url = Url::parse(base).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }

    let mut path = url.path().trim_end_matches('/').to_string();
    for segment in segments {
        path.push('/');
        path.push_str(segment);
    }
    url.set_path(&path);

    Some(canonical(url.as_str()))
}

/// Returns the last non-empty path segment of a URL
pub fn last_segment(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
}

/// Splits text into lowercase keyword tokens longer than two characters
pub fn keyword_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_whitespace() {
        assert_eq!(slugify("Samsung Galaxy\tS10", '_'), "Samsung_Galaxy_S10");
        assert_eq!(slugify("Laptop", '-'), "Laptop");
        assert_eq!(slugify("", '_'), "");
    }

    #[test]
    fn test_fallback_url_appends_slug() {
        let url = fallback_url("https://example.com/Device", "Game Console", '_').unwrap();
        assert_eq!(url, "https://example.com/Device/Game_Console");

        let url = fallback_url("https://example.com/Device/", "Tablet", '_').unwrap();
        assert_eq!(url, "https://example.com/Device/Tablet");
    }

    #[test]
    fn test_fallback_url_encodes_reserved_characters() {
        let url = fallback_url("https://example.com/Device", "Q&A #1?", '_').unwrap();
        assert!(url.starts_with("https://example.com/Device/Q&A_%231%3F"));
    }

    #[test]
    fn test_label_from_segment() {
        assert_eq!(label_from_segment("iPhone_12_Pro", '_'), "iPhone 12 Pro");
        assert_eq!(label_from_segment("Mac%20Laptop", '_'), "Mac Laptop");
        assert_eq!(label_from_segment("Game-Console", '-'), "Game Console");
    }

    #[test]
    fn test_segments_below() {
        let segments = segments_below(
            "https://example.com/Device",
            "https://example.com/Device/Phone/iPhone_12",
        )
        .unwrap();
        assert_eq!(segments, vec!["Phone", "iPhone_12"]);

        assert_eq!(
            segments_below("https://example.com/Device", "https://example.com/Device"),
            Some(vec![])
        );
        assert!(segments_below("https://example.com/Device", "https://example.com/Guide/1").is_none());
        assert!(segments_below("https://example.com/Device", "https://other.com/Device/x").is_none());
    }

    #[test]
    fn test_join_segments() {
        let url = join_segments(
            "https://example.com/Device/",
            &["Phone".to_string(), "iPhone_12".to_string()],
        )
        .unwrap();
        assert_eq!(url, "https://example.com/Device/Phone/iPhone_12");

        let url = join_segments("https://example.com/Device", &["Mac%20Laptop".to_string()]);
        assert_eq!(url.as_deref(), Some("https://example.com/Device/Mac%20Laptop"));
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(
            last_segment("https://example.com/Device/iPhone_12"),
            Some("iPhone_12".to_string())
        );
        assert_eq!(last_segment("https://example.com/"), None);
    }

    #[test]
    fn test_keyword_tokens_skip_short_words() {
        assert_eq!(
            keyword_tokens("iPhone_12_Pro_Max"),
            vec!["iphone", "pro", "max"]
        );
        assert!(keyword_tokens("a-b-cd").is_empty());
    }
}
