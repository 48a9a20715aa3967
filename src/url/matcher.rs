/// Characters that end one URL path segment or query component
const SEPARATORS: &[char] = &['/', '?', '#', '&', '=', ';'];

/// Checks whether a link matches any deny pattern
///
/// Patterns are compared case-insensitively against the whole URL and only
/// count when they sit on segment boundaries: a pattern starting with a
/// letter or digit must follow a separator, and one ending with a letter or
/// digit must be followed by a separator or the end of the URL. They
/// identify links that live next to category links on a page without being
/// categories themselves (edit, history, revision, creation, and
/// answer-forum pages).
///
/// # Examples
///
/// ```
/// use canopy::url::is_denied_link;
///
/// let patterns = vec!["/edit".to_string(), "revision".to_string()];
/// assert!(is_denied_link("https://example.com/Device/Phone/Edit", &patterns));
/// assert!(is_denied_link("https://example.com/x?view=revision", &patterns));
/// assert!(!is_denied_link("https://example.com/Device/Editors_Keyboard", &patterns));
/// ```
pub fn is_denied_link(url: &str, patterns: &[String]) -> bool {
    let lowered = url.to_lowercase();
    patterns
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| matches_on_boundary(&lowered, &p.to_lowercase()))
}

fn matches_on_boundary(haystack: &str, pattern: &str) -> bool {
    let open_start = pattern.starts_with(|c: char| c.is_alphanumeric());
    let open_end = pattern.ends_with(|c: char| c.is_alphanumeric());

    haystack.match_indices(pattern).any(|(start, found)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + found.len()..].chars().next();
        (!open_start || is_separator(before)) && (!open_end || is_separator(after))
    })
}

fn is_separator(c: Option<char>) -> bool {
    c.map_or(true, |c| SEPARATORS.contains(&c))
}
