//! Scope-aware configuration engine.
//!
//! Configuration entries are named by a [`Route`] (`"carriers/dhl/enabled"`)
//! and stored under a [`Path`]: a route bound to a [`Scope`] level of the
//! tenant hierarchy (default, group, leaf). Reads go through a [`Scoped`]
//! view that falls back from the most specific scope to the broadest and
//! coerces the stored [`Value`] to the requested type. Writes go through the
//! [`Service`], which persists to a pluggable [`Storage`] engine and then
//! notifies every [`Subscriber`] registered on a prefix of the written
//! route, with per-subscriber panic containment and automatic eviction of
//! failing subscribers.
//!
//! # Quick start
//!
//! ```
//! use cascade_core::{Route, Scope, Service};
//!
//! let service = Service::new();
//!
//! // Global default plus one leaf override.
//! let route = Route::new("carriers/dhl/enabled")?;
//! service.write(&cascade_core::Path::new(route.clone()), false)?;
//! service.write(&route.bind(Scope::Leaf, 3)?, true)?;
//!
//! // Leaf 3 sees its override, every other leaf the default.
//! assert!(service.scoped(1, 3).get_bool("carriers/dhl/enabled")?);
//! assert!(!service.scoped(1, 4).get_bool("carriers/dhl/enabled")?);
//! # Ok::<(), cascade_core::Error>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod path;
pub mod pubsub;
pub mod scoped;
pub mod service;
pub mod storage;
pub mod value;

pub use error::{Error, Result};
pub use path::{Path, PathError, Route, Scope};
pub use pubsub::{BoxError, Subscriber, SubscriptionId};
pub use scoped::{DefaultMap, Getter, Scoped};
pub use service::{Service, ServiceBuilder, Writer};
pub use storage::{MemoryStorage, Storage, StorageError};
pub use value::{TypeError, Value};
