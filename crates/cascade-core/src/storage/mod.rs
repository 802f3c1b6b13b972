//! Storage contract and the in-memory reference backend.
//!
//! A storage engine is a concurrency-safe mapping from fully-qualified path
//! keys to [`Value`]s. Backends are pluggable behind the [`Storage`] trait;
//! the engine attaches no meaning to routes and performs no scope fallback,
//! which is the resolver's job. A missing key is reported as
//! [`StorageError::NotFound`], which callers can test for without matching
//! on rendered messages.

use crate::path::{Path, PathError};
use crate::value::Value;

mod memory;

pub use memory::MemoryStorage;

/// Errors surfaced by storage backends.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// No value is stored under the requested key.
    #[error("configuration key not found")]
    NotFound,
    /// A key failed structural validation inside the backend.
    #[error("invalid storage key: {0}")]
    Path(#[from] PathError),
    /// The backend could not encode or decode a stored value.
    #[error("value serialization failed: {0}")]
    Serialization(String),
    /// Backend-specific failure (connection loss, capacity, corruption).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether this error reports a missing key rather than a failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}

/// Contract every storage backend fulfils.
///
/// Implementations must be safe for concurrent use from multiple threads;
/// all methods take `&self`.
pub trait Storage: Send + Sync {
    /// Stores `value` under the path's fully-qualified key, replacing any
    /// previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend cannot persist the value.
    fn set(&self, path: &Path, value: Value) -> Result<(), StorageError>;

    /// Reads the value stored under exactly this path. No scope fallback.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] for an absent key, other variants
    /// for backend failures.
    fn get(&self, path: &Path) -> Result<Value, StorageError>;

    /// Enumerates every stored path, sorted by route, then scope rank, then
    /// scope id.
    ///
    /// Backends that cannot enumerate their keys return an empty vector.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend fails to enumerate.
    fn all_keys(&self) -> Result<Vec<Path>, StorageError>;
}
