//! Path addressing inside an archive.
//!
//! Paths are `/`-separated. A path starting with `/` is absolute; anything
//! else is resolved against a context path. A final segment beginning with
//! `@` names an attribute of the node addressed by the preceding segments.
//!
//! All functions here are pure string manipulation.

use crate::util::{Error, Result};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Prefix marking an attribute segment.
pub const ATTRIBUTE_PREFIX: char = '@';

/// Characters that cannot appear literally inside one segment.
const RESERVED: [(char, &str); 2] = [('&', "&#38;"), ('/', "&#47;")];

/// Resolve `path` against `context`.
///
/// Absolute paths are returned unchanged. Relative paths are appended to the
/// context and normalised: empty and `.` segments are dropped and `..` removes
/// the previous segment (stopping at the root).
pub fn resolve(context: &str, path: &str) -> String {
    if path.starts_with(SEPARATOR) {
        return path.to_string();
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in context.split(SEPARATOR).chain(path.split(SEPARATOR)) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    join(&parts)
}

/// Build an absolute path from segments.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push(SEPARATOR);
        out.push_str(segment.as_ref());
    }
    if out.is_empty() {
        out.push(SEPARATOR);
    }
    out
}

/// Non-empty segments of a path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Split a path into its parent path and last segment.
///
/// The root has no last segment: `split_leaf("/")` is `("/", "")`.
pub fn split_leaf(path: &str) -> (String, &str) {
    let parts: Vec<&str> = segments(path).collect();
    match parts.split_last() {
        Some((leaf, parent)) => (join(parent), leaf),
        None => (SEPARATOR.to_string(), ""),
    }
}

/// Check that `key` can be used as one leaf segment.
pub fn validate_leaf(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidPath("empty key".to_string()));
    }
    if key == "." || key == ".." {
        return Err(Error::InvalidPath(format!("key is a relative segment: {}", key)));
    }
    if key.contains(SEPARATOR) {
        return Err(Error::InvalidPath(format!("key must not contain '/': {}", key)));
    }
    Ok(())
}

/// Returns true if the segment addresses an attribute.
#[inline]
pub fn is_attribute_segment(segment: &str) -> bool {
    segment.starts_with(ATTRIBUTE_PREFIX)
}

/// Escape reserved characters so that `segment` is a single path segment.
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match RESERVED.iter().find(|(r, _)| *r == c) {
            Some((_, escaped)) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out
}

/// Undo [`encode_segment`].
pub fn decode_segment(segment: &str) -> String {
    let mut out = segment.to_string();
    // '&' last so that "&#38;#47;" decodes to "&#47;" and not "/".
    for (c, escaped) in RESERVED.iter().rev() {
        out = out.replace(escaped, &c.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute_unchanged() {
        assert_eq!(resolve("/ctx", "/a/b"), "/a/b");
        assert_eq!(resolve("/ctx", "/a//b/"), "/a//b/");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve("/", "a"), "/a");
        assert_eq!(resolve("/ctx", "a/b"), "/ctx/a/b");
        assert_eq!(resolve("/ctx/", "a//b/"), "/ctx/a/b");
        assert_eq!(resolve("", "a"), "/a");
        assert_eq!(resolve("/ctx", ""), "/ctx");
    }

    #[test]
    fn test_resolve_dots() {
        assert_eq!(resolve("/a/b", "../c"), "/a/c");
        assert_eq!(resolve("/a/b", "./c"), "/a/b/c");
        assert_eq!(resolve("/a", "../../.."), "/");
    }

    #[test]
    fn test_split_leaf() {
        assert_eq!(split_leaf("/a/b/c"), ("/a/b".to_string(), "c"));
        assert_eq!(split_leaf("/a"), ("/".to_string(), "a"));
        assert_eq!(split_leaf("/"), ("/".to_string(), ""));
        assert_eq!(split_leaf("/g/@units"), ("/g".to_string(), "@units"));
    }

    #[test]
    fn test_validate_leaf() {
        assert!(validate_leaf("energy").is_ok());
        assert!(matches!(validate_leaf("a/b"), Err(Error::InvalidPath(_))));
        assert!(matches!(validate_leaf("/"), Err(Error::InvalidPath(_))));
        assert!(matches!(validate_leaf(""), Err(Error::InvalidPath(_))));
        assert!(matches!(validate_leaf(".."), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_encode_decode() {
        let raw = "a/b&c";
        let encoded = encode_segment(raw);
        assert_eq!(encoded, "a&#47;b&#38;c");
        assert!(validate_leaf(&encoded).is_ok());
        assert_eq!(decode_segment(&encoded), raw);

        let tricky = "&#47;";
        assert_eq!(decode_segment(&encode_segment(tricky)), tricky);
    }

    #[test]
    fn test_attribute_segment() {
        assert!(is_attribute_segment("@units"));
        assert!(!is_attribute_segment("units"));
    }
}
