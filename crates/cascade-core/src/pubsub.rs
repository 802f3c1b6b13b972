//! Write notifications: prefix subscriptions, bubbling delivery, eviction.
//!
//! Subscriptions attach to a route prefix. Every successful write notifies
//! every subscription whose prefix is a structural prefix of the written
//! route; all matching levels fire, not just the deepest. Delivery is
//! synchronous on the writer's thread, in a deterministic order: deepest
//! prefix first, ascending subscription id within a prefix.
//!
//! Subscribers are fault-isolated. A panic is caught, a returned error is
//! recorded, and either outcome permanently evicts that subscription; the
//! writer never observes a subscriber failure. The registry lock is never
//! held while subscriber code runs, so a slow subscriber cannot block
//! subscribe or unsubscribe calls on other threads.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::path::{Path, Route};

/// Boxed error a subscriber may return from its callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Receives write notifications for a subscribed route prefix.
///
/// Callbacks run synchronously on the writing thread. Returning an error or
/// panicking evicts the subscription permanently; there is no retry.
pub trait Subscriber: Send + Sync {
    /// Called once per matching write with the full written path, scope
    /// binding included.
    ///
    /// # Errors
    ///
    /// Any returned error is logged and evicts this subscription.
    fn on_write(&self, path: &Path) -> std::result::Result<(), BoxError>;
}

/// Identifier of a registered subscription.
///
/// Ids are assigned monotonically starting at 1 and never reused within one
/// engine instance, so a stale id can never address a younger subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Adapter turning a closure into a [`Subscriber`].
pub(crate) struct FnSubscriber<F>(pub(crate) F);

impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(&Path) -> std::result::Result<(), BoxError> + Send + Sync,
{
    fn on_write(&self, path: &Path) -> std::result::Result<(), BoxError> {
        (self.0)(path)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Registry {
    /// Prefix route -> subscriptions in ascending id order.
    by_prefix: HashMap<String, BTreeMap<u64, Arc<dyn Subscriber>>>,
    /// Reverse index for unsubscribe and eviction.
    prefix_of: HashMap<u64, String>,
}

impl Registry {
    fn insert(&mut self, id: u64, prefix: String, subscriber: Arc<dyn Subscriber>) {
        self.by_prefix
            .entry(prefix.clone())
            .or_default()
            .insert(id, subscriber);
        self.prefix_of.insert(id, prefix);
    }

    /// Removes `id`; returns false when it was never registered or already
    /// gone.
    fn remove(&mut self, id: u64) -> bool {
        let Some(prefix) = self.prefix_of.remove(&id) else {
            return false;
        };
        if let Some(subs) = self.by_prefix.get_mut(&prefix) {
            subs.remove(&id);
            if subs.is_empty() {
                self.by_prefix.remove(&prefix);
            }
        }
        true
    }

    fn len(&self) -> usize {
        self.prefix_of.len()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Notification engine owned by the service.
pub(crate) struct PubSub {
    registry: RwLock<Registry>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl PubSub {
    pub(crate) fn new() -> Self {
        PubSub {
            registry: RwLock::new(Registry::default()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Registers `subscriber` under a route prefix.
    pub(crate) fn subscribe(
        &self,
        prefix: &str,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<SubscriptionId> {
        let route = Route::new(prefix)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.registry
            .write()
            .insert(id, route.as_str().to_owned(), subscriber);
        debug!(subscription = id, prefix = %route, "subscription registered");
        Ok(SubscriptionId(id))
    }

    /// Removes a subscription. Unknown or already-removed ids are a no-op.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) {
        if self.registry.write().remove(id.0) {
            debug!(subscription = id.0, "subscription removed");
        }
    }

    /// Marks the engine closed. Only the first call succeeds.
    pub(crate) fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            Err(Error::PublisherClosed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn subscription_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Delivers `path` to every subscription on a prefix of its route.
    ///
    /// The matching set is snapshotted under the read lock and invoked after
    /// releasing it; failed subscriptions are evicted under the write lock
    /// once the pass completes.
    pub(crate) fn publish(&self, path: &Path) -> Result<()> {
        if self.is_closed() {
            return Err(Error::PublisherClosed);
        }

        let matched: Vec<(u64, Arc<dyn Subscriber>)> = {
            let registry = self.registry.read();
            let prefixes: Vec<&str> = path.route().prefixes().collect();
            let mut matched = Vec::new();
            for prefix in prefixes.iter().rev() {
                if let Some(subs) = registry.by_prefix.get(*prefix) {
                    for (id, subscriber) in subs {
                        matched.push((*id, Arc::clone(subscriber)));
                    }
                }
            }
            matched
        };
        if matched.is_empty() {
            return Ok(());
        }

        let mut failed = Vec::new();
        for (id, subscriber) in matched {
            match catch_unwind(AssertUnwindSafe(|| subscriber.on_write(path))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(subscription = id, path = %path, error = %err, "subscriber failed, evicting");
                    failed.push(id);
                }
                Err(panic) => {
                    let msg = panic_message(panic.as_ref());
                    warn!(subscription = id, path = %path, panic = %msg, "subscriber panicked, evicting");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut registry = self.registry.write();
            for id in failed {
                registry.remove(id);
            }
        }
        Ok(())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
