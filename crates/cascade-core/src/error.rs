//! Crate-wide error and result types.

use crate::path::PathError;
use crate::storage::StorageError;
use crate::value::TypeError;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Umbrella error for configuration operations.
///
/// Each concern keeps its own error type ([`PathError`], [`TypeError`],
/// [`StorageError`]); this enum aggregates them at the service boundary and
/// adds the lifecycle failure [`Error::PublisherClosed`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A route, binding or fully-qualified key failed validation.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A stored value could not be coerced to the requested type.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// A storage backend failed or the key was absent.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The notification engine has been closed; writes and further closes
    /// are rejected.
    #[error("publisher is closed")]
    PublisherClosed,
}

impl Error {
    /// Whether this error reports a missing key rather than a failure.
    ///
    /// The scoped resolver uses this to fall through to broader scopes.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Storage(e) if e.is_not_found())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
