//! Canned-data test doubles for the configuration interfaces.
//!
//! Collaborators of the configuration engine depend on the narrow
//! [`Getter`] and [`Writer`] traits, not on the full service. This crate
//! provides stand-ins for both so such code can be tested without spinning
//! up a service or a storage engine: [`MockGetter`] serves values from a
//! canned map (with an optional computed fallback) and [`MockWriter`]
//! records every write it receives.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use cascade_core::{Error, Getter, Path, Result, Scoped, StorageError, Value, Writer};

/// Exact-path getter serving canned values.
///
/// Lookup order matches resolution against a real storage engine: the
/// canned map first, then the optional fallback closure, then a not-found
/// error. Combine with [`MockGetter::scoped`] to test scope-fallback logic
/// against fixed data.
pub struct MockGetter {
    values: HashMap<String, Value>,
    fallback: Option<FallbackFn>,
}

type FallbackFn = Box<dyn Fn(&Path) -> Option<Value> + Send + Sync>;

impl MockGetter {
    /// Starts building a getter.
    #[must_use]
    pub fn builder() -> MockGetterBuilder {
        MockGetterBuilder {
            values: HashMap::new(),
            fallback: None,
        }
    }

    /// Creates a scoped view over this getter, as the service would.
    #[must_use]
    pub fn scoped(&self, group_id: u32, leaf_id: u32) -> Scoped<'_> {
        Scoped::new(self, group_id, leaf_id)
    }

    /// Number of canned entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no entries are canned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Getter for MockGetter {
    fn value(&self, path: &Path) -> Result<Value> {
        if let Some(value) = self.values.get(&path.to_string()) {
            return Ok(value.clone());
        }
        if let Some(fallback) = &self.fallback {
            if let Some(value) = fallback(path) {
                return Ok(value);
            }
        }
        Err(Error::Storage(StorageError::NotFound))
    }
}

impl fmt::Debug for MockGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockGetter")
            .field("values", &self.values.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Fluent builder for [`MockGetter`].
pub struct MockGetterBuilder {
    values: HashMap<String, Value>,
    fallback: Option<FallbackFn>,
}

impl MockGetterBuilder {
    /// Cans `value` under the exact `path`.
    #[must_use]
    pub fn value(mut self, path: &Path, value: impl Into<Value>) -> Self {
        self.values.insert(path.to_string(), value.into());
        self
    }

    /// Installs a computed fallback, consulted when a path is not canned.
    #[must_use]
    pub fn fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path) -> Option<Value> + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(f));
        self
    }

    /// Finishes the getter.
    #[must_use]
    pub fn build(self) -> MockGetter {
        MockGetter {
            values: self.values,
            fallback: self.fallback,
        }
    }
}

impl fmt::Debug for MockGetterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockGetterBuilder")
            .field("values", &self.values.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Writer double
// ---------------------------------------------------------------------------

/// Writer double that records every write it receives.
///
/// Writes are recorded even when the double is configured to fail, so tests
/// can assert both what was attempted and how callers handle the failure.
#[derive(Default)]
pub struct MockWriter {
    writes: Mutex<Vec<(Path, Value)>>,
    fail_with: Option<Error>,
}

impl MockWriter {
    /// Creates a writer that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer that records each write and then returns a clone of
    /// `error`.
    #[must_use]
    pub fn failing(error: Error) -> Self {
        MockWriter {
            writes: Mutex::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    /// All recorded writes, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<(Path, Value)> {
        self.writes.lock().clone()
    }

    /// The most recent write, if any.
    #[must_use]
    pub fn last_write(&self) -> Option<(Path, Value)> {
        self.writes.lock().last().cloned()
    }

    /// Number of recorded writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

impl Writer for MockWriter {
    fn write(&self, path: &Path, value: Value) -> Result<()> {
        self.writes.lock().push((path.clone(), value));
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for MockWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockWriter")
            .field("writes", &self.write_count())
            .field("failing", &self.fail_with.is_some())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
