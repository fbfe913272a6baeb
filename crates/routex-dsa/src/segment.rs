//! Path segmentation.
//!
//! A raw request target is reduced to a normalized path (query string
//! removed, trailing slashes removed) which is always a sub-slice of the
//! caller's buffer, so every segment handed out is a view into that buffer.

use core::str::Split;

/// The path every empty or oversized request collapses to.
pub const ROOT_PATH: &str = "/";

/// A normalized request path borrowed from the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentedPath<'p> {
    path: &'p str,
    substituted: bool,
}

impl<'p> SegmentedPath<'p> {
    /// The query-stripped, slash-normalized path.
    #[inline(always)]
    pub fn as_str(&self) -> &'p str {
        self.path
    }

    /// Lazily yields the non-empty `/`-separated segments.
    #[inline]
    pub fn segments(&self) -> Segments<'p> {
        Segments {
            inner: self.path.split('/'),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path == ROOT_PATH
    }

    /// True when the raw input was empty or over-length and was replaced by `/`.
    pub fn was_substituted(&self) -> bool {
        self.substituted
    }
}

/// Iterator over the non-empty segments of a [`SegmentedPath`].
#[derive(Debug, Clone)]
pub struct Segments<'p> {
    inner: Split<'p, char>,
}

impl<'p> Iterator for Segments<'p> {
    type Item = &'p str;

    #[inline]
    fn next(&mut self) -> Option<&'p str> {
        self.inner.by_ref().find(|s| !s.is_empty())
    }
}

/// Splits a raw request target.
///
/// The query string is dropped and trailing slashes are trimmed (`/users/`
/// and `/users` are the same path). An empty path, or one whose length
/// exceeds `max_len`, is replaced by the root path `/`.
pub fn split(raw: &str, max_len: usize) -> SegmentedPath<'_> {
    let path = match raw.find('?') {
        Some(q) => &raw[..q],
        None => raw,
    };

    if path.is_empty() || path.len() > max_len {
        return SegmentedPath {
            path: ROOT_PATH,
            substituted: true,
        };
    }

    let trimmed = path.trim_end_matches('/');
    let path = if trimmed.is_empty() { ROOT_PATH } else { trimmed };
    SegmentedPath {
        path,
        substituted: false,
    }
}

/// A single segment of a registered route pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSegment<'a> {
    Literal(&'a str),
    /// `:name`; carries the name without the colon.
    Param(&'a str),
}

impl<'a> PatternSegment<'a> {
    #[inline]
    pub fn classify(segment: &'a str) -> Self {
        match segment.strip_prefix(':') {
            Some(name) => PatternSegment::Param(name),
            None => PatternSegment::Literal(segment),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::vec::Vec;

    fn segs(raw: &str) -> Vec<&str> {
        split(raw, 1024).segments().collect()
    }

    #[test]
    fn test_query_string_is_stripped() {
        let p = split("/users/42?expand=true", 1024);
        assert_eq!(p.as_str(), "/users/42");
        assert_eq!(segs("/users/42?expand=true"), ["users", "42"]);
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        assert_eq!(split("/users/", 1024).as_str(), "/users");
        assert_eq!(split("/users///", 1024).as_str(), "/users");
        assert_eq!(split("/", 1024).as_str(), "/");
        assert!(split("/", 1024).segments().next().is_none());
    }

    #[test]
    fn test_empty_interior_segments_are_skipped() {
        assert_eq!(segs("//a///b"), ["a", "b"]);
    }

    #[test]
    fn test_empty_and_oversized_collapse_to_root() {
        let empty = split("", 1024);
        assert!(empty.is_root());
        assert!(empty.was_substituted());

        let long = "/a".repeat(600);
        let over = split(&long, 1024);
        assert!(over.is_root());
        assert!(over.was_substituted());

        let q_only = split("?x=1", 1024);
        assert!(q_only.is_root());
    }

    #[test]
    fn test_segments_borrow_the_input() {
        let raw = std::string::String::from("/files/report.pdf");
        let p = split(&raw, 1024);
        let last = p.segments().last().unwrap();
        let base = raw.as_ptr() as usize;
        let at = last.as_ptr() as usize;
        assert!(at >= base && at < base + raw.len());
    }

    #[test]
    fn test_pattern_segment_classification() {
        assert_eq!(PatternSegment::classify(":id"), PatternSegment::Param("id"));
        assert_eq!(PatternSegment::classify("users"), PatternSegment::Literal("users"));
        assert_eq!(PatternSegment::classify("a:b"), PatternSegment::Literal("a:b"));
    }
}
