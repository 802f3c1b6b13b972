//! Validated configuration routes.

use std::cmp::Ordering;
use std::fmt;

use super::PathError;

/// Separator between route segments.
pub const SEPARATOR: char = '/';

/// Maximum number of segments in a route.
pub const MAX_SEGMENTS: usize = 8;

/// Maximum length of a single segment, in bytes.
pub const MAX_SEGMENT_LEN: usize = 64;

/// Maximum length of a whole route, in bytes.
pub const MAX_ROUTE_LEN: usize = 255;

/// An immutable, validated route: `"carriers/dhl/enabled"`.
///
/// A route consists of 1 to [`MAX_SEGMENTS`] non-empty segments joined by
/// [`SEPARATOR`]. Segments are limited to ASCII letters, digits, `_` and `-`.
/// Construction is the only place validation happens; a `Route` value is
/// always well formed.
///
/// Routes order lexicographically by segment, not by raw string. The two
/// differ: `-` sorts below the separator byte, so `"aa-b"` would precede
/// `"aa/b"` in raw order even though the single segment `aa-b` follows the
/// segment `aa`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    raw: String,
}

impl Route {
    /// Parses and validates a route from its string form.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the input is empty, contains an empty or
    /// over-long segment, a character outside the allowed set, more than
    /// [`MAX_SEGMENTS`] segments or more than [`MAX_ROUTE_LEN`] bytes.
    pub fn new(raw: &str) -> Result<Self, PathError> {
        validate(raw)?;
        Ok(Route {
            raw: raw.to_owned(),
        })
    }

    /// Builds a route by joining `parts` with the separator.
    ///
    /// # Errors
    ///
    /// Same rules as [`Route::new`] applied to the joined string.
    pub fn from_parts(parts: &[&str]) -> Result<Self, PathError> {
        Route::new(&parts.join("/"))
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Iterates the segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split(SEPARATOR)
    }

    /// Iterates the leading prefixes, shortest first: for `"aa/bb/cc"` the
    /// iterator yields `"aa"`, `"aa/bb"`, `"aa/bb/cc"`.
    #[must_use]
    pub fn prefixes(&self) -> Prefixes<'_> {
        Prefixes {
            raw: &self.raw,
            pos: 0,
        }
    }

    /// Whether `self` is a structural prefix of `other`: equal to it, or
    /// equal to a leading run of its segments.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Route) -> bool {
        let Some(rest) = other.raw.strip_prefix(self.raw.as_str()) else {
            return false;
        };
        rest.is_empty() || rest.starts_with(SEPARATOR)
    }

    /// Grows this route by appending all segments of `other`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the combined route would exceed the
    /// segment or length limits; `self` is left unchanged in that case.
    pub fn append(&mut self, other: &Route) -> Result<(), PathError> {
        let joined = format!("{}{SEPARATOR}{}", self.raw, other.raw);
        validate(&joined)?;
        self.raw = joined;
        Ok(())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for Route {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments().cmp(other.segments())
    }
}

impl PartialOrd for Route {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn validate(raw: &str) -> Result<(), PathError> {
    if raw.is_empty() {
        return Err(PathError::EmptyRoute);
    }
    if raw.len() > MAX_ROUTE_LEN {
        return Err(PathError::RouteTooLong(raw.len()));
    }
    let mut depth = 0;
    for segment in raw.split(SEPARATOR) {
        depth += 1;
        if segment.is_empty() {
            return Err(PathError::EmptySegment(raw.to_string()));
        }
        if segment.len() > MAX_SEGMENT_LEN {
            return Err(PathError::SegmentTooLong(segment.to_string()));
        }
        if let Some(ch) = segment
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-')
        {
            return Err(PathError::InvalidChar {
                segment: segment.to_string(),
                ch,
            });
        }
    }
    if depth > MAX_SEGMENTS {
        return Err(PathError::TooManySegments(depth));
    }
    Ok(())
}

/// Iterator over the leading prefixes of a route, shortest first.
///
/// Yields borrowed slices of the route's string form; no allocation.
#[derive(Debug, Clone)]
pub struct Prefixes<'a> {
    raw: &'a str,
    pos: usize,
}

impl<'a> Iterator for Prefixes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.pos >= self.raw.len() {
            return None;
        }
        match self.raw[self.pos..].find(SEPARATOR) {
            Some(offset) => {
                let end = self.pos + offset;
                self.pos = end + 1;
                Some(&self.raw[..end])
            }
            None => {
                self.pos = self.raw.len();
                Some(self.raw)
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -- validation tests --

    #[test]
    fn test_route_accepts_valid_forms() {
        for raw in ["aa", "aa/bb", "carriers/dhl-express/enabled", "a_1/B-2/c3"] {
            let route = Route::new(raw).unwrap();
            assert_eq!(route.as_str(), raw);
        }
    }

    #[test]
    fn test_route_rejects_empty_input() {
        assert!(matches!(Route::new(""), Err(PathError::EmptyRoute)));
        assert!(matches!(Route::from_parts(&[]), Err(PathError::EmptyRoute)));
    }

    #[test]
    fn test_route_rejects_empty_segments() {
        for raw in ["/aa", "aa/", "aa//bb"] {
            assert!(matches!(Route::new(raw), Err(PathError::EmptySegment(_))), "{raw}");
        }
    }

    #[test]
    fn test_route_rejects_invalid_characters() {
        let err = Route::new("aa/b b").unwrap_err();
        assert!(matches!(err, PathError::InvalidChar { ch: ' ', .. }));
        let err = Route::new("aa/b.b").unwrap_err();
        assert!(matches!(err, PathError::InvalidChar { ch: '.', .. }));
    }

    #[test]
    fn test_route_rejects_over_long_segment() {
        let raw = "a".repeat(MAX_SEGMENT_LEN + 1);
        assert!(matches!(Route::new(&raw), Err(PathError::SegmentTooLong(_))));
    }

    #[test]
    fn test_route_rejects_too_many_segments() {
        let raw = vec!["a"; MAX_SEGMENTS + 1].join("/");
        assert!(matches!(
            Route::new(&raw),
            Err(PathError::TooManySegments(n)) if n == MAX_SEGMENTS + 1
        ));
    }

    #[test]
    fn test_route_rejects_over_long_route() {
        let raw = vec!["a".repeat(MAX_SEGMENT_LEN); 4].join("/");
        assert!(raw.len() > MAX_ROUTE_LEN);
        assert!(matches!(Route::new(&raw), Err(PathError::RouteTooLong(_))));
    }

    // -- structure tests --

    #[test]
    fn test_route_segments_and_depth() {
        let route = Route::new("xx/yy/zz").unwrap();
        assert_eq!(route.depth(), 3);
        assert_eq!(route.segments().collect::<Vec<_>>(), vec!["xx", "yy", "zz"]);
    }

    #[test]
    fn test_route_from_parts_joins() {
        let route = Route::from_parts(&["xx", "yy", "zz"]).unwrap();
        assert_eq!(route.as_str(), "xx/yy/zz");
    }

    #[test]
    fn test_route_prefixes_shortest_first() {
        let route = Route::new("aa/bb/cc").unwrap();
        let prefixes: Vec<&str> = route.prefixes().collect();
        assert_eq!(prefixes, vec!["aa", "aa/bb", "aa/bb/cc"]);

        let single = Route::new("aa").unwrap();
        assert_eq!(single.prefixes().collect::<Vec<_>>(), vec!["aa"]);
    }

    #[test]
    fn test_route_is_prefix_of_segment_boundaries() {
        let xx = Route::new("xx").unwrap();
        let xx_yy = Route::new("xx/yy").unwrap();
        let xx_yy_zz = Route::new("xx/yy/zz").unwrap();
        let xx_yyy = Route::new("xx/yyy").unwrap();

        assert!(xx.is_prefix_of(&xx_yy));
        assert!(xx_yy.is_prefix_of(&xx_yy));
        assert!(xx_yy.is_prefix_of(&xx_yy_zz));
        // "xx/yy" is a string prefix of "xx/yyy" but not a segment prefix.
        assert!(!xx_yy.is_prefix_of(&xx_yyy));
        assert!(!xx_yy_zz.is_prefix_of(&xx_yy));
    }

    #[test]
    fn test_route_append_grows_in_place() {
        let mut route = Route::new("aa/bb").unwrap();
        route.append(&Route::new("cc/dd").unwrap()).unwrap();
        assert_eq!(route.as_str(), "aa/bb/cc/dd");
    }

    #[test]
    fn test_route_append_rejects_over_limit_and_keeps_original() {
        let mut route = Route::new(&vec!["a"; MAX_SEGMENTS - 1].join("/")).unwrap();
        let err = route.append(&Route::new("b/c").unwrap()).unwrap_err();
        assert!(matches!(err, PathError::TooManySegments(_)));
        assert_eq!(route.depth(), MAX_SEGMENTS - 1);
    }

    // -- ordering tests --

    #[test]
    fn test_route_orders_by_segment_not_raw_string() {
        let dashed = Route::new("aa-b").unwrap();
        let nested = Route::new("aa/b").unwrap();
        // Raw strings would order the other way because '-' < '/'.
        assert!(dashed.as_str() < nested.as_str());
        assert!(dashed > nested);
    }

    #[test]
    fn test_route_order_is_total_and_consistent() {
        let mut routes = vec![
            Route::new("bb").unwrap(),
            Route::new("aa/cc").unwrap(),
            Route::new("aa").unwrap(),
            Route::new("aa/bb/cc").unwrap(),
        ];
        routes.sort();
        let raw: Vec<&str> = routes.iter().map(Route::as_str).collect();
        assert_eq!(raw, vec!["aa", "aa/bb/cc", "aa/cc", "bb"]);
    }
}
