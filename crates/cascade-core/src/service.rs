//! Service facade tying storage, scoped resolution and notifications
//! together.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::path::Path;
use crate::pubsub::{BoxError, FnSubscriber, PubSub, Subscriber, SubscriptionId};
use crate::scoped::{DefaultMap, Getter, Scoped};
use crate::storage::{MemoryStorage, Storage};
use crate::value::Value;

/// Write interface collaborators depend on.
///
/// Mirrors [`Getter`] on the mutation side so code that only ever writes can
/// be handed (and tested against) a narrow trait object instead of the whole
/// service.
pub trait Writer: Send + Sync {
    /// Persists `value` under `path` and notifies matching subscriptions.
    ///
    /// # Errors
    ///
    /// Returns storage failures, or [`crate::Error::PublisherClosed`] when the
    /// service has been closed.
    fn write(&self, path: &Path, value: Value) -> Result<()>;
}

/// The configuration service: one storage engine, one notification engine,
/// one static default table.
///
/// All methods take `&self` and are safe to call from multiple threads;
/// share the service behind an [`Arc`] as needed.
///
/// ```
/// use cascade_core::{Route, Scope, Service};
///
/// let service = Service::new();
/// let path = Route::new("shipping/origin/country")?.bind(Scope::Leaf, 2)?;
/// service.write(&path, "DE")?;
///
/// let scoped = service.scoped(1, 2);
/// assert_eq!(scoped.get_string("shipping/origin/country")?, "DE");
/// # Ok::<(), cascade_core::Error>(())
/// ```
pub struct Service {
    storage: Arc<dyn Storage>,
    defaults: DefaultMap,
    pubsub: PubSub,
}

impl Service {
    /// Creates a service over an empty in-memory storage engine with no
    /// default table.
    #[must_use]
    pub fn new() -> Self {
        ServiceBuilder::new().build()
    }

    /// Starts building a service with a custom storage engine or default
    /// table.
    #[must_use]
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    /// Persists `value` under `path`, then notifies every subscription on a
    /// prefix of the written route. Delivery completes before this method
    /// returns; subscriber failures are logged and evicted, never surfaced
    /// here.
    ///
    /// # Errors
    ///
    /// Returns a storage error when persisting fails (nothing is delivered
    /// then), or [`crate::Error::PublisherClosed`] when the service is
    /// closed; the value has still been persisted in that case.
    pub fn write(&self, path: &Path, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        debug!(path = %path, value = %value, "write");
        self.storage.set(path, value)?;
        self.pubsub.publish(path)
    }

    /// Reads the value stored under exactly `path`. No scope fallback; use
    /// [`Service::scoped`] for falling-back reads.
    ///
    /// # Errors
    ///
    /// Returns an error satisfying [`crate::Error::is_not_found`] for an absent
    /// key, other storage variants for backend failures.
    pub fn get(&self, path: &Path) -> Result<Value> {
        Ok(self.storage.get(path)?)
    }

    /// Creates a scoped view resolving leaf, then group, then default, then
    /// the service's default table. Id 0 skips the respective level.
    #[must_use]
    pub fn scoped(&self, group_id: u32, leaf_id: u32) -> Scoped<'_> {
        Scoped::new(self, group_id, leaf_id).with_defaults(&self.defaults)
    }

    /// Registers `subscriber` for every write under the route prefix.
    ///
    /// # Errors
    ///
    /// Returns a structural error when `prefix` is not a valid route.
    pub fn subscribe<S>(&self, prefix: &str, subscriber: S) -> Result<SubscriptionId>
    where
        S: Subscriber + 'static,
    {
        self.pubsub.subscribe(prefix, Arc::new(subscriber))
    }

    /// Registers a closure for every write under the route prefix.
    ///
    /// # Errors
    ///
    /// Returns a structural error when `prefix` is not a valid route.
    pub fn subscribe_fn<F>(&self, prefix: &str, f: F) -> Result<SubscriptionId>
    where
        F: Fn(&Path) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.subscribe(prefix, FnSubscriber(f))
    }

    /// Removes a subscription. Unknown or already-removed ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.pubsub.unsubscribe(id);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.pubsub.subscription_count()
    }

    /// Closes the notification engine. Later writes and closes are rejected
    /// with [`crate::Error::PublisherClosed`]; nothing is delivered by the close
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PublisherClosed`] on every call after the first.
    pub fn close(&self) -> Result<()> {
        self.pubsub.close()?;
        debug!("service closed");
        Ok(())
    }

    /// Whether [`Service::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pubsub.is_closed()
    }

    /// Enumerates every stored path, sorted by route, then scope rank, then
    /// scope id.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backend fails to enumerate.
    pub fn all_keys(&self) -> Result<Vec<Path>> {
        Ok(self.storage.all_keys()?)
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new()
    }
}

impl Getter for Service {
    fn value(&self, path: &Path) -> Result<Value> {
        self.get(path)
    }
}

impl Writer for Service {
    fn write(&self, path: &Path, value: Value) -> Result<()> {
        Service::write(self, path, value)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("defaults", &self.defaults.len())
            .field("subscriptions", &self.subscription_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Service`].
#[derive(Default)]
pub struct ServiceBuilder {
    storage: Option<Arc<dyn Storage>>,
    defaults: DefaultMap,
}

impl ServiceBuilder {
    /// Starts with in-memory storage and an empty default table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `storage` instead of the in-memory reference backend.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Attaches a static default table, consulted by scoped reads after all
    /// storage levels miss.
    #[must_use]
    pub fn defaults(mut self, defaults: DefaultMap) -> Self {
        self.defaults = defaults;
        self
    }

    /// Builds the service.
    #[must_use]
    pub fn build(self) -> Service {
        Service {
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(MemoryStorage::new())),
            defaults: self.defaults,
            pubsub: PubSub::new(),
        }
    }
}

impl fmt::Debug for ServiceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("storage", &self.storage.is_some())
            .field("defaults", &self.defaults.len())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
