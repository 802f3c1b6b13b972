//! Scope-aware configuration keys.
//!
//! A [`Route`] names a configuration entry (`"carriers/dhl/enabled"`); a
//! [`Path`] is a route bound to a [`Scope`] and scope id. The bound form has
//! a canonical fully-qualified string representation,
//! `<scope>/<id>/<route>` (for example `leaf/987/xx/yy/zz`), which storage
//! backends use verbatim as their key. Binding rules keep that string form
//! injective: the default scope always carries id 0 and every other scope a
//! positive id, so two distinct paths can never render to the same key.
//!
//! Validation happens at construction only. Code holding a `Route` or `Path`
//! never needs to re-check it.

use std::cmp::Ordering;
use std::fmt;

mod route;
mod scope;

pub use route::{Prefixes, Route, MAX_ROUTE_LEN, MAX_SEGMENTS, MAX_SEGMENT_LEN, SEPARATOR};
pub use scope::Scope;

/// Errors raised while validating routes, scope bindings or fully-qualified
/// keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The route string was empty.
    #[error("route must not be empty")]
    EmptyRoute,
    /// A segment between separators was empty.
    #[error("route {0:?} contains an empty segment")]
    EmptySegment(String),
    /// A segment contained a character outside `[A-Za-z0-9_-]`.
    #[error("segment {segment:?} contains invalid character {ch:?}")]
    InvalidChar {
        /// Offending segment.
        segment: String,
        /// First invalid character in the segment.
        ch: char,
    },
    /// A segment exceeded [`MAX_SEGMENT_LEN`] bytes.
    #[error("segment {0:?} exceeds the segment length limit")]
    SegmentTooLong(String),
    /// The route had more than [`MAX_SEGMENTS`] segments.
    #[error("route has {0} segments, more than the limit")]
    TooManySegments(usize),
    /// The route exceeded [`MAX_ROUTE_LEN`] bytes.
    #[error("route is {0} bytes long, more than the limit")]
    RouteTooLong(usize),
    /// A non-default scope was bound with id 0.
    #[error("scope {scope} requires a positive id")]
    ZeroScopeId {
        /// Scope the binding was attempted for.
        scope: Scope,
    },
    /// The default scope was bound with a non-zero id.
    #[error("default scope cannot carry id {0}")]
    DefaultWithId(u32),
    /// A fully-qualified key string did not have the `scope/id/route` shape.
    #[error("malformed fully-qualified key {0:?}")]
    MalformedKey(String),
    /// A fully-qualified key named a scope that does not exist.
    #[error("unknown scope name {0:?}")]
    UnknownScope(String),
}

/// A route bound to a concrete scope: the complete key of one stored value.
///
/// Paths are immutable; binding a [`Route`] or cloning an existing path
/// produces a new value. The `Display` form is the canonical fully-qualified
/// key and [`Path::parse`] is its inverse.
///
/// Paths order by route (segment-wise), then scope rank, then id, which
/// makes sorted key enumerations group all bindings of a route together,
/// broadest scope first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    route: Route,
    scope: Scope,
    id: u32,
}

impl Route {
    /// Binds this route to `scope` with the given scope id, consuming the
    /// route.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::ZeroScopeId`] when a non-default scope is bound
    /// with id 0 and [`PathError::DefaultWithId`] when the default scope is
    /// bound with a non-zero id.
    pub fn bind(self, scope: Scope, id: u32) -> Result<Path, PathError> {
        match scope {
            Scope::Default if id != 0 => Err(PathError::DefaultWithId(id)),
            Scope::Group | Scope::Leaf if id == 0 => Err(PathError::ZeroScopeId { scope }),
            _ => Ok(Path {
                route: self,
                scope,
                id,
            }),
        }
    }
}

impl Path {
    /// Binds `route` to the default scope. Infallible: the default binding
    /// always carries id 0.
    #[must_use]
    pub fn new(route: Route) -> Self {
        Path {
            route,
            scope: Scope::Default,
            id: 0,
        }
    }

    /// Parses a fully-qualified key back into a path; the inverse of the
    /// `Display` form.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the key does not have the
    /// `scope/id/route` shape, names an unknown scope, carries a
    /// non-numeric id, violates the binding rules or embeds an invalid
    /// route.
    pub fn parse(key: &str) -> Result<Self, PathError> {
        let mut parts = key.splitn(3, SEPARATOR);
        let (Some(scope), Some(id), Some(route)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(PathError::MalformedKey(key.to_string()));
        };
        let scope: Scope = scope.parse()?;
        let id: u32 = id
            .parse()
            .map_err(|_| PathError::MalformedKey(key.to_string()))?;
        Route::new(route)?.bind(scope, id)
    }

    /// The route part of this path.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// The scope this path is bound to.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// The scope id; 0 exactly for the default scope.
    #[must_use]
    pub fn scope_id(&self) -> u32 {
        self.id
    }

    /// Whether this path's route is a structural prefix of `other`'s route.
    ///
    /// Scope and id play no part: notification bubbling is purely
    /// route-structural.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        self.route.is_prefix_of(&other.route)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.scope.as_str(),
            self.id,
            self.route
        )
    }
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.route
            .cmp(&other.route)
            .then_with(|| self.scope.cmp(&other.scope))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
