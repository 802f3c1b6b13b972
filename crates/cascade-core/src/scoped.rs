//! Scope-fallback reads over an exact-path getter.
//!
//! A [`Scoped`] view pins a `(group, leaf)` pair and resolves a route by
//! probing the most specific applicable scope first: leaf, then group, then
//! the default scope, then an optional static [`DefaultMap`]. A missing key
//! at one level falls through silently; any other failure stops resolution
//! immediately. The first hit is coerced to the requested type, so "value
//! exists but has the wrong shape" and "no value anywhere" stay
//! distinguishable errors.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::path::{Path, PathError, Route, Scope};
use crate::storage::StorageError;
use crate::value::Value;

/// Exact-path read interface.
///
/// Implemented by the service (backed by its storage engine) and by test
/// doubles. No scope fallback happens here; [`Scoped`] layers that on top.
pub trait Getter: Send + Sync {
    /// Reads the value stored under exactly `path`.
    ///
    /// # Errors
    ///
    /// Returns an error satisfying [`Error::is_not_found`] for an absent
    /// key, other variants for backend failures.
    fn value(&self, path: &Path) -> Result<Value>;
}

/// Static table of fallback values, consulted when every scope level misses.
///
/// Populated by the composition root from whatever metadata ships with the
/// application and handed to the service at build time. Keys are plain
/// routes; scope never applies to table entries.
#[derive(Debug, Clone, Default)]
pub struct DefaultMap {
    entries: BTreeMap<String, Value>,
}

impl DefaultMap {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) the fallback value for `route`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when `route` is not a valid route string.
    pub fn insert(
        &mut self,
        route: &str,
        value: impl Into<Value>,
    ) -> std::result::Result<(), PathError> {
        let route = Route::new(route)?;
        self.entries.insert(route.as_str().to_owned(), value.into());
        Ok(())
    }

    /// Looks up the fallback value for `route`.
    #[must_use]
    pub fn get(&self, route: &Route) -> Option<&Value> {
        self.entries.get(route.as_str())
    }

    /// Number of table entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A `(group, leaf)` view over a [`Getter`] with typed, falling-back reads.
///
/// The view is cheap to construct and copy; middleware can build one per
/// request. A zero id at either level means "no binding there" and skips
/// that probe, so `Scoped::new(g, 0, 0)` reads the default scope only.
#[derive(Clone, Copy)]
pub struct Scoped<'a> {
    root: &'a dyn Getter,
    group_id: u32,
    leaf_id: u32,
    defaults: Option<&'a DefaultMap>,
}

impl<'a> Scoped<'a> {
    /// Creates a view over `root` pinned to the given scope ids.
    #[must_use]
    pub fn new(root: &'a dyn Getter, group_id: u32, leaf_id: u32) -> Self {
        Scoped {
            root,
            group_id,
            leaf_id,
            defaults: None,
        }
    }

    /// Attaches a static fallback table, consulted after all scope levels.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &'a DefaultMap) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Group id this view resolves under; 0 when unbound.
    #[must_use]
    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    /// Leaf id this view resolves under; 0 when unbound.
    #[must_use]
    pub fn leaf_id(&self) -> u32 {
        self.leaf_id
    }

    /// Resolves `route` through the fallback chain and returns the raw
    /// value.
    ///
    /// # Errors
    ///
    /// Returns a structural error for an invalid route, a not-found error
    /// when every level misses, and any backend failure as soon as it
    /// occurs.
    pub fn get(&self, route: &str) -> Result<Value> {
        let route = Route::new(route)?;
        if self.leaf_id > 0 {
            let path = route.clone().bind(Scope::Leaf, self.leaf_id)?;
            match self.root.value(&path) {
                Err(e) if e.is_not_found() => {}
                other => return other,
            }
        }
        if self.group_id > 0 {
            let path = route.clone().bind(Scope::Group, self.group_id)?;
            match self.root.value(&path) {
                Err(e) if e.is_not_found() => {}
                other => return other,
            }
        }
        match self.root.value(&Path::new(route.clone())) {
            Err(e) if e.is_not_found() => {}
            other => return other,
        }
        if let Some(defaults) = self.defaults {
            if let Some(value) = defaults.get(&route) {
                return Ok(value.clone());
            }
        }
        Err(Error::Storage(StorageError::NotFound))
    }

    /// Resolves `route` and coerces to a boolean.
    ///
    /// # Errors
    ///
    /// As [`Scoped::get`], plus a type error when the value will not coerce.
    pub fn get_bool(&self, route: &str) -> Result<bool> {
        Ok(self.get(route)?.to_bool()?)
    }

    /// Resolves `route` and coerces to a signed integer.
    ///
    /// # Errors
    ///
    /// As [`Scoped::get`], plus a type error when the value will not coerce.
    pub fn get_int(&self, route: &str) -> Result<i64> {
        Ok(self.get(route)?.to_int()?)
    }

    /// Resolves `route` and coerces to a float.
    ///
    /// # Errors
    ///
    /// As [`Scoped::get`], plus a type error when the value will not coerce.
    pub fn get_float(&self, route: &str) -> Result<f64> {
        Ok(self.get(route)?.to_float()?)
    }

    /// Resolves `route` and coerces to owned text.
    ///
    /// # Errors
    ///
    /// As [`Scoped::get`], plus a type error when the value will not coerce.
    pub fn get_string(&self, route: &str) -> Result<String> {
        Ok(self.get(route)?.to_str()?)
    }

    /// Resolves `route` and coerces to a UTC timestamp.
    ///
    /// # Errors
    ///
    /// As [`Scoped::get`], plus a type error when the value will not coerce.
    pub fn get_time(&self, route: &str) -> Result<DateTime<Utc>> {
        Ok(self.get(route)?.to_time()?)
    }

    /// Resolves `route` and coerces to raw bytes.
    ///
    /// # Errors
    ///
    /// As [`Scoped::get`], plus a type error when the value will not coerce.
    pub fn get_bytes(&self, route: &str) -> Result<Bytes> {
        Ok(self.get(route)?.to_bytes()?)
    }
}

impl fmt::Debug for Scoped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped")
            .field("group_id", &self.group_id)
            .field("leaf_id", &self.leaf_id)
            .field("defaults", &self.defaults.map(DefaultMap::len))
            .finish_non_exhaustive()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
