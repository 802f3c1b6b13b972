//! Bounded LRU/TTL byte-cache storage backend.
//!
//! [`CacheStorage`] implements the [`Storage`] contract over a fixed-size
//! slab: values are serialized to bytes on `set`, decoded on `get`, and the
//! least recently used entry is evicted once the slab is full. Entries may
//! additionally carry a time-to-live; an expired entry reads as a missing
//! key and is removed lazily on access.
//!
//! The backend cannot enumerate its keys (entries disappear under eviction
//! and expiry without notice), so [`Storage::all_keys`] reports an empty
//! list rather than an error. Use it as an overlay for hot reads, not as the
//! system of record.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::DateTime;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use rkyv::rancor;
use rkyv::util::AlignedVec;
use tracing::debug;

use cascade_core::{Path, Storage, StorageError, Value};

const SENTINEL: usize = usize::MAX;

/// Tuning knobs for [`CacheStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached entries. A zero capacity is treated as 1.
    pub max_entries: usize,
    /// Time-to-live applied to every entry; `None` disables expiry.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_entries: 1024,
            ttl: None,
        }
    }
}

/// Counter snapshot taken via [`CacheStorage::metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Total `get` calls.
    pub gets: u64,
    /// `get` calls served from a live entry.
    pub hits: u64,
    /// Entries displaced by capacity pressure.
    pub evictions: u64,
    /// Entries removed because their time-to-live had passed.
    pub expirations: u64,
}

impl CacheMetrics {
    /// Fraction of `get` calls that hit, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            return 0.0;
        }
        self.hits as f64 / self.gets as f64
    }
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

/// Serialized shape of a cached value. Timestamps travel as epoch
/// microseconds; `chrono` types have no archived form of their own.
#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
enum Wire {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    TimeMicros(i64),
    Bytes(Vec<u8>),
}

fn encode(value: &Value) -> Result<AlignedVec, StorageError> {
    let wire = match value {
        Value::Bool(b) => Wire::Bool(*b),
        Value::Int(n) => Wire::Int(*n),
        Value::Float(f) => Wire::Float(*f),
        Value::Str(s) => Wire::Str(s.clone()),
        Value::Time(t) => Wire::TimeMicros(t.timestamp_micros()),
        Value::Bytes(b) => Wire::Bytes(b.to_vec()),
    };
    rkyv::to_bytes::<rancor::Error>(&wire).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Value, StorageError> {
    let archived = rkyv::access::<ArchivedWire, rancor::Error>(bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let wire = rkyv::deserialize::<Wire, rancor::Error>(archived)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    match wire {
        Wire::Bool(b) => Ok(Value::Bool(b)),
        Wire::Int(n) => Ok(Value::Int(n)),
        Wire::Float(f) => Ok(Value::Float(f)),
        Wire::Str(s) => Ok(Value::Str(s)),
        Wire::TimeMicros(micros) => DateTime::from_timestamp_micros(micros)
            .map(Value::Time)
            .ok_or_else(|| {
                StorageError::Serialization("stored timestamp out of range".to_string())
            }),
        Wire::Bytes(v) => Ok(Value::Bytes(Bytes::from(v))),
    }
}

// ---------------------------------------------------------------------------
// Slab LRU
// ---------------------------------------------------------------------------

struct Node {
    key: String,
    bytes: AlignedVec,
    expires_at: Option<Instant>,
    prev: usize,
    next: usize,
}

#[derive(Default)]
struct Inner {
    /// Key -> slab index.
    index: FxHashMap<String, usize>,
    slab: Vec<Node>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    gets: u64,
    hits: u64,
    evictions: u64,
    expirations: u64,
}

impl Inner {
    fn new() -> Self {
        Inner {
            head: SENTINEL,
            tail: SENTINEL,
            ..Inner::default()
        }
    }

    /// Unlinks `idx` from the recency list.
    fn detach(&mut self, idx: usize) {
        let prev = self.slab[idx].prev;
        let next = self.slab[idx].next;
        if prev == SENTINEL {
            self.head = next;
        } else {
            self.slab[prev].next = next;
        }
        if next == SENTINEL {
            self.tail = prev;
        } else {
            self.slab[next].prev = prev;
        }
        self.slab[idx].prev = SENTINEL;
        self.slab[idx].next = SENTINEL;
    }

    /// Links `idx` in as the most recently used entry.
    fn push_front(&mut self, idx: usize) {
        self.slab[idx].prev = SENTINEL;
        self.slab[idx].next = self.head;
        if self.head != SENTINEL {
            self.slab[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == SENTINEL {
            self.tail = idx;
        }
    }

    /// Drops the entry at `idx` and recycles its slot.
    fn remove(&mut self, idx: usize) {
        self.detach(idx);
        let key = std::mem::take(&mut self.slab[idx].key);
        self.index.remove(&key);
        self.slab[idx].bytes = AlignedVec::new();
        self.slab[idx].expires_at = None;
        self.free.push(idx);
    }

    fn evict_tail(&mut self) {
        let tail = self.tail;
        if tail == SENTINEL {
            return;
        }
        let key = self.slab[tail].key.clone();
        self.remove(tail);
        self.evictions += 1;
        debug!(key = %key, "cache entry evicted");
    }
}

/// LRU/TTL cache implementing the storage contract.
///
/// Interior mutability: reads update recency, so both `set` and `get` take
/// one short critical section on an internal mutex.
pub struct CacheStorage {
    capacity: usize,
    ttl: Option<Duration>,
    inner: Mutex<Inner>,
}

impl CacheStorage {
    /// Creates a cache with the given configuration.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        CacheStorage {
            capacity: config.max_entries.max(1),
            ttl: config.ttl,
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Number of live entries (expired ones count until touched).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the hit/eviction counters.
    #[must_use]
    pub fn metrics(&self) -> CacheMetrics {
        let inner = self.inner.lock();
        CacheMetrics {
            gets: inner.gets,
            hits: inner.hits,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }
}

impl Default for CacheStorage {
    fn default() -> Self {
        CacheStorage::new(CacheConfig::default())
    }
}

impl std::fmt::Debug for CacheStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStorage")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

impl Storage for CacheStorage {
    fn set(&self, path: &Path, value: Value) -> Result<(), StorageError> {
        let bytes = encode(&value)?;
        let key = path.to_string();
        let expires_at = self.ttl.map(|ttl| Instant::now() + ttl);

        let mut inner = self.inner.lock();
        if let Some(&idx) = inner.index.get(&key) {
            inner.slab[idx].bytes = bytes;
            inner.slab[idx].expires_at = expires_at;
            inner.detach(idx);
            inner.push_front(idx);
            return Ok(());
        }
        if inner.index.len() >= self.capacity {
            inner.evict_tail();
        }
        let node = Node {
            key: key.clone(),
            bytes,
            expires_at,
            prev: SENTINEL,
            next: SENTINEL,
        };
        let idx = if let Some(idx) = inner.free.pop() {
            inner.slab[idx] = node;
            idx
        } else {
            inner.slab.push(node);
            inner.slab.len() - 1
        };
        inner.index.insert(key, idx);
        inner.push_front(idx);
        Ok(())
    }

    fn get(&self, path: &Path) -> Result<Value, StorageError> {
        let key = path.to_string();
        let mut inner = self.inner.lock();
        inner.gets += 1;
        let Some(&idx) = inner.index.get(&key) else {
            return Err(StorageError::NotFound);
        };
        if let Some(expires_at) = inner.slab[idx].expires_at {
            if Instant::now() >= expires_at {
                inner.remove(idx);
                inner.expirations += 1;
                return Err(StorageError::NotFound);
            }
        }
        inner.hits += 1;
        inner.detach(idx);
        inner.push_front(idx);
        decode(&inner.slab[idx].bytes)
    }

    /// Keys cannot be enumerated; entries vanish under eviction and expiry.
    fn all_keys(&self) -> Result<Vec<Path>, StorageError> {
        Ok(Vec::new())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cascade_core::{Route, Scope, ServiceBuilder};
    use chrono::DateTime;

    use super::*;

    fn leaf(route: &str, id: u32) -> Path {
        Route::new(route).unwrap().bind(Scope::Leaf, id).unwrap()
    }

    fn cache(max_entries: usize) -> CacheStorage {
        CacheStorage::new(CacheConfig {
            max_entries,
            ttl: None,
        })
    }

    // -- round trip tests --

    #[test]
    fn test_cache_round_trips_every_variant() {
        let cache = cache(16);
        let when = DateTime::from_timestamp_micros(1_600_000_000_123_456).unwrap();
        let cases = vec![
            ("vals/flag", Value::Bool(true)),
            ("vals/count", Value::Int(4711)),
            ("vals/price", Value::Float(19.99)),
            ("vals/name", Value::from("DE")),
            ("vals/when", Value::Time(when)),
            ("vals/blob", Value::from(vec![0u8, 1, 2, 255])),
        ];
        for (route, value) in &cases {
            cache.set(&leaf(route, 1), value.clone()).unwrap();
        }
        for (route, value) in &cases {
            assert_eq!(&cache.get(&leaf(route, 1)).unwrap(), value, "{route}");
        }
    }

    #[test]
    fn test_cache_get_absent_is_not_found() {
        let cache = cache(4);
        assert!(cache.get(&leaf("xx/yy", 1)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_cache_set_replaces_in_place() {
        let cache = cache(2);
        let path = leaf("aa/bb", 1);
        cache.set(&path, Value::Int(1)).unwrap();
        cache.set(&path, Value::Int(2)).unwrap();
        cache.set(&leaf("aa/cc", 1), Value::Int(3)).unwrap();

        // The replacement did not consume a second slot.
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&path).unwrap(), Value::Int(2));
        assert_eq!(cache.metrics().evictions, 0);
    }

    // -- eviction tests --

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let cache = cache(2);
        cache.set(&leaf("k/a", 1), Value::Int(1)).unwrap();
        cache.set(&leaf("k/b", 1), Value::Int(2)).unwrap();
        cache.set(&leaf("k/c", 1), Value::Int(3)).unwrap();

        assert!(cache.get(&leaf("k/a", 1)).unwrap_err().is_not_found());
        assert_eq!(cache.get(&leaf("k/b", 1)).unwrap(), Value::Int(2));
        assert_eq!(cache.get(&leaf("k/c", 1)).unwrap(), Value::Int(3));
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn test_cache_get_refreshes_recency() {
        let cache = cache(2);
        cache.set(&leaf("k/a", 1), Value::Int(1)).unwrap();
        cache.set(&leaf("k/b", 1), Value::Int(2)).unwrap();
        // Touch a so that b becomes the eviction candidate.
        cache.get(&leaf("k/a", 1)).unwrap();
        cache.set(&leaf("k/c", 1), Value::Int(3)).unwrap();

        assert_eq!(cache.get(&leaf("k/a", 1)).unwrap(), Value::Int(1));
        assert!(cache.get(&leaf("k/b", 1)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_cache_zero_capacity_behaves_as_one() {
        let cache = cache(0);
        cache.set(&leaf("k/a", 1), Value::Int(1)).unwrap();
        assert_eq!(cache.get(&leaf("k/a", 1)).unwrap(), Value::Int(1));
        cache.set(&leaf("k/b", 1), Value::Int(2)).unwrap();
        assert_eq!(cache.len(), 1);
    }

    // -- expiry tests --

    #[test]
    fn test_cache_ttl_expires_entries() {
        let cache = CacheStorage::new(CacheConfig {
            max_entries: 4,
            ttl: Some(Duration::from_millis(5)),
        });
        let path = leaf("k/a", 1);
        cache.set(&path, Value::Int(1)).unwrap();
        assert_eq!(cache.get(&path).unwrap(), Value::Int(1));

        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get(&path).unwrap_err().is_not_found());
        assert_eq!(cache.metrics().expirations, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_set_resets_ttl() {
        let cache = CacheStorage::new(CacheConfig {
            max_entries: 4,
            ttl: Some(Duration::from_millis(30)),
        });
        let path = leaf("k/a", 1);
        cache.set(&path, Value::Int(1)).unwrap();
        std::thread::sleep(Duration::from_millis(15));
        cache.set(&path, Value::Int(2)).unwrap();
        std::thread::sleep(Duration::from_millis(15));
        // 30ms after the first set, but only 15ms after the refresh.
        assert_eq!(cache.get(&path).unwrap(), Value::Int(2));
    }

    // -- contract tests --

    #[test]
    fn test_cache_all_keys_reports_empty() {
        let cache = cache(4);
        cache.set(&leaf("k/a", 1), Value::Int(1)).unwrap();
        assert!(cache.all_keys().unwrap().is_empty());
    }

    #[test]
    fn test_cache_metrics_hit_rate() {
        let cache = cache(4);
        cache.set(&leaf("k/a", 1), Value::Int(1)).unwrap();
        cache.get(&leaf("k/a", 1)).unwrap();
        cache.get(&leaf("k/b", 1)).unwrap_err();

        let metrics = cache.metrics();
        assert_eq!(metrics.gets, 2);
        assert_eq!(metrics.hits, 1);
        assert!((metrics.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cache_backs_a_service() {
        let storage = Arc::new(cache(16));
        let service = ServiceBuilder::new()
            .storage(Arc::clone(&storage) as Arc<dyn Storage>)
            .build();

        let path = leaf("carriers/dhl/enabled", 3);
        service.write(&path, true).unwrap();
        assert!(service.scoped(1, 3).get_bool("carriers/dhl/enabled").unwrap());
        // Enumeration is a documented capability gap for this backend.
        assert!(service.all_keys().unwrap().is_empty());
    }
}
