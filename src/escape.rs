//! HTML escaping, query-string encoding and href validation.
//!
//! Fast-path optimized: scans for first escapable character,
//! then bulk-copies segments between escapes.

use memchr::{memchr2, memchr3};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Lookup table for escapable characters. Text and attribute values share
/// it: all five of `& < > " '` are escaped everywhere.
const ESCAPE_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    table[b'<' as usize] = true;
    table[b'>' as usize] = true;
    table[b'&' as usize] = true;
    table[b'"' as usize] = true;
    table[b'\'' as usize] = true;
    table
};

/// Query component encoding: everything but `A-Za-z0-9-_.~` is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Same as [`QUERY_COMPONENT`] but keeps `#` so `[[Title#section]]`
/// still jumps to the fragment.
const QUERY_WITH_FRAGMENT: &AsciiSet = &QUERY_COMPONENT.remove(b'#');

/// Escape `& < > " '` into the output buffer.
///
/// # Example
/// ```
/// use dtext::escape::escape_html_into;
///
/// let mut out = Vec::new();
/// escape_html_into(&mut out, b"<script>alert('x')</script>");
/// assert_eq!(out, b"&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;");
/// ```
#[inline]
pub fn escape_html_into(out: &mut Vec<u8>, input: &[u8]) {
    if input.is_empty() {
        return;
    }

    let mut pos = match first_escape(input) {
        Some(p) => p,
        None => {
            out.extend_from_slice(input);
            return;
        }
    };

    if pos > 0 {
        out.extend_from_slice(&input[..pos]);
    }

    while pos < input.len() {
        let scan_start = pos;
        while pos < input.len() && !ESCAPE_TABLE[input[pos] as usize] {
            pos += 1;
        }

        if pos > scan_start {
            out.extend_from_slice(&input[scan_start..pos]);
        }

        if pos < input.len() {
            let escape_seq: &[u8] = match input[pos] {
                b'<' => b"&lt;",
                b'>' => b"&gt;",
                b'&' => b"&amp;",
                b'"' => b"&quot;",
                _ => b"&#39;",
            };
            out.extend_from_slice(escape_seq);
            pos += 1;
        }
    }
}

#[inline]
fn first_escape(input: &[u8]) -> Option<usize> {
    let a = memchr3(b'<', b'>', b'&', input);
    let b = memchr2(b'"', b'\'', input);
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Percent-encode a query-string value.
pub fn encode_query(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

/// Percent-encode a query-string value, leaving `#` intact.
pub fn encode_query_keep_fragment(value: &str) -> String {
    utf8_percent_encode(value, QUERY_WITH_FRAGMENT).to_string()
}

/// Whether an href may be emitted.
///
/// Allowed: `http://`, `https://`, `mailto:` and root-relative paths.
/// Protocol-relative `//host` and backslash tricks are rejected, as is any
/// whitespace or control character.
///
/// ```
/// use dtext::escape::is_safe_href;
///
/// assert!(is_safe_href("https://example.com/a?b=c"));
/// assert!(is_safe_href("/posts/1"));
/// assert!(!is_safe_href("javascript:alert(1)"));
/// assert!(!is_safe_href("//evil.example"));
/// ```
pub fn is_safe_href(href: &str) -> bool {
    let bytes = href.as_bytes();
    if bytes.iter().any(|&b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return false;
    }

    if let Some(rest) = bytes.strip_prefix(b"/") {
        return !matches!(rest.first(), Some(b'/') | Some(b'\\'));
    }

    [&b"http://"[..], b"https://", b"mailto:"].iter().any(|scheme| {
        bytes.len() > scheme.len() && bytes[..scheme.len()].eq_ignore_ascii_case(scheme)
    })
}

/// Reduce an identifier to `[a-z0-9_-]`, for header ids and anchors.
/// Returns `None` when nothing usable is left.
pub fn slug(input: &str) -> Option<String> {
    let slug: String = input
        .chars()
        .filter_map(|c| match c {
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            'a'..='z' | '0'..='9' | '_' | '-' => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect();
    (!slug.is_empty()).then_some(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(input: &str) -> String {
        let mut out = Vec::new();
        escape_html_into(&mut out, input.as_bytes());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_escape_plain() {
        assert_eq!(escaped("Hello, World!"), "Hello, World!");
        assert_eq!(escaped(""), "");
    }

    #[test]
    fn test_escape_all_five() {
        assert_eq!(escaped("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_escape_unicode_untouched() {
        assert_eq!(escaped("猫 & 犬"), "猫 &amp; 犬");
    }

    #[test]
    fn test_encode_query() {
        assert_eq!(encode_query("blue_eyes rating:s"), "blue_eyes%20rating%3As");
        assert_eq!(encode_query("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_query("猫"), "%E7%8C%AB");
    }

    #[test]
    fn test_encode_query_keep_fragment() {
        assert_eq!(encode_query_keep_fragment("help:dtext#links"), "help%3Adtext#links");
    }

    #[test]
    fn test_safe_href() {
        assert!(is_safe_href("HTTP://EXAMPLE.COM"));
        assert!(is_safe_href("mailto:someone@example.com"));
        assert!(is_safe_href("/wiki_pages/show_or_new?title=cat"));
        assert!(!is_safe_href("http://"));
        assert!(!is_safe_href("data:text/html,hi"));
        assert!(!is_safe_href("/\\evil.example"));
        assert!(!is_safe_href("#top"));
        assert!(!is_safe_href("relative/path"));
        assert!(!is_safe_href("https://a.example/\u{7}"));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Overview").as_deref(), Some("overview"));
        assert_eq!(slug("See Also!").as_deref(), Some("see-also"));
        assert_eq!(slug("<>"), None);
    }
}
