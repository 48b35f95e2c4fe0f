//! Named caches for memoizing expensive computations.
//!
//! A [`CacheRegistry`] owns caches keyed by call-site name. Each [`Cache`]
//! maps a [`Fingerprint`] of the call arguments to a type-erased value that is
//! retrieved typed. Caches are independent: clearing one never touches
//! another, and keys never collide across caches.
//!
//! # Concurrency
//! Every cache sits behind its own `parking_lot::RwLock`. Lookups take the
//! read lock and record recency with atomics, so readers never contend with
//! each other. Population is last-writer-wins: two threads missing on the same
//! key may both run the producer and the later insert replaces the earlier
//! one. Producers are expected to be pure.
//!
//! # Growth
//! Entries are only evicted by an explicit clear or by the cache's
//! [`CachePolicy`]. [`CachePolicy::Unbounded`] never evicts; callers using it
//! must clear caches themselves when the data behind them changes.

use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use ndarray::{Array, Dimension};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{TinctError, TinctResult};
use crate::verbose::usage_warning;

// ---------------------------------------------------------------------------
// Fingerprints
// ---------------------------------------------------------------------------

/// Deterministic key derived from a function's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn builder() -> FingerprintBuilder {
        FingerprintBuilder {
            hasher: DefaultHasher::new(),
        }
    }

    pub fn of_str(value: &str) -> Self {
        Self::builder().with_str(value).finish()
    }

    pub fn of_f64s(values: &[f64]) -> Self {
        Self::builder().with_f64s(values).finish()
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Incrementally hashes arguments into a [`Fingerprint`].
///
/// Every component is tagged with its kind, so `("ab", "c")` and
/// `("a", "bc")` or a shape and an equal-looking integer list never collide
/// by construction. Floats hash by value: `-0.0` equals `0.0` and every NaN
/// equals every other NaN.
pub struct FingerprintBuilder {
    hasher: DefaultHasher,
}

impl FingerprintBuilder {
    #[must_use]
    pub fn with_f64(mut self, value: f64) -> Self {
        0_u8.hash(&mut self.hasher);
        canonical_bits(value).hash(&mut self.hasher);
        self
    }

    #[must_use]
    pub fn with_f64s(mut self, values: &[f64]) -> Self {
        1_u8.hash(&mut self.hasher);
        values.len().hash(&mut self.hasher);
        for value in values {
            canonical_bits(*value).hash(&mut self.hasher);
        }
        self
    }

    #[must_use]
    pub fn with_i64(mut self, value: i64) -> Self {
        2_u8.hash(&mut self.hasher);
        value.hash(&mut self.hasher);
        self
    }

    #[must_use]
    pub fn with_str(mut self, value: &str) -> Self {
        3_u8.hash(&mut self.hasher);
        value.hash(&mut self.hasher);
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: &[usize]) -> Self {
        4_u8.hash(&mut self.hasher);
        shape.hash(&mut self.hasher);
        self
    }

    /// Hash an array's shape followed by its values in logical order.
    #[must_use]
    pub fn with_array<D: Dimension>(self, array: &Array<f64, D>) -> Self {
        let mut builder = self.with_shape(array.shape());
        5_u8.hash(&mut builder.hasher);
        for value in array.iter() {
            canonical_bits(*value).hash(&mut builder.hasher);
        }
        builder
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.hasher.finish())
    }
}

fn canonical_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

// ---------------------------------------------------------------------------
// Policy & statistics
// ---------------------------------------------------------------------------

/// Eviction strategy of a single cache.
///
/// Recency is tracked with per-entry atomics so lookups stay on the read
/// lock. Picking a victim therefore scans every entry: an insert into a full
/// `Lru` or `Fifo` cache costs O(capacity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CachePolicy {
    /// Never evict. Memory grows until the cache is cleared.
    #[default]
    Unbounded,
    /// Keep at most `capacity` entries, evicting the least recently used.
    Lru { capacity: usize },
    /// Keep at most `capacity` entries, evicting the oldest insertion.
    Fifo { capacity: usize },
}

impl CachePolicy {
    pub const fn capacity(&self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Lru { capacity } | Self::Fifo { capacity } => Some(*capacity),
        }
    }
}

/// Counters for a single cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    inserted: u64,
    last_used: AtomicU64,
}

/// A named memoization table.
pub struct Cache {
    name: String,
    policy: CachePolicy,
    entries: RwLock<HashMap<Fingerprint, Entry>>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Cache {
    pub fn new(name: impl Into<String>, policy: CachePolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            entries: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Look up `key`. Returns `None` when the key is absent or holds a value
    /// of another type.
    pub fn get<T: Any + Send + Sync>(&self, key: &Fingerprint) -> Option<Arc<T>> {
        let entries = self.entries.read();
        let found = entries.get(key).and_then(|entry| {
            entry.last_used.store(self.tick(), Ordering::Relaxed);
            Arc::clone(&entry.value).downcast::<T>().ok()
        });
        drop(entries);

        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Like [`Cache::get`], with a miss reported as [`TinctError::KeyNotFound`].
    pub fn try_get<T: Any + Send + Sync>(&self, key: &Fingerprint) -> TinctResult<Arc<T>> {
        self.get(key).ok_or_else(|| TinctError::KeyNotFound {
            cache: self.name.clone(),
            key: *key,
        })
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&self, key: Fingerprint, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.insert_arc(key, Arc::clone(&value));
        value
    }

    pub fn insert_arc<T: Any + Send + Sync>(&self, key: Fingerprint, value: Arc<T>) {
        if self.policy.capacity() == Some(0) {
            return;
        }

        let stamp = self.tick();
        let mut entries = self.entries.write();
        if !entries.contains_key(&key) {
            if let Some(capacity) = self.policy.capacity() {
                while entries.len() >= capacity {
                    let Some(victim) = self.victim(&entries) else {
                        break;
                    };
                    entries.remove(&victim);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        entries.insert(
            key,
            Entry {
                value,
                inserted: stamp,
                last_used: AtomicU64::new(stamp),
            },
        );
    }

    /// Return the cached value for `key` or compute, store and return it.
    ///
    /// The producer runs without holding the lock. When caching is disabled
    /// (see [`set_caching_enable`]) the producer always runs and nothing is
    /// stored.
    pub fn get_or_insert_with<T, F>(&self, key: Fingerprint, producer: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        if !is_caching_enabled() {
            return Arc::new(producer());
        }
        if let Some(value) = self.get::<T>(&key) {
            return value;
        }
        self.insert(key, producer())
    }

    /// Fallible variant of [`Cache::get_or_insert_with`]; errors are not cached.
    pub fn get_or_try_insert_with<T, E, F>(&self, key: Fingerprint, producer: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, E>,
    {
        if !is_caching_enabled() {
            return producer().map(Arc::new);
        }
        if let Some(value) = self.get::<T>(&key) {
            return Ok(value);
        }
        Ok(self.insert(key, producer()?))
    }

    pub fn remove(&self, key: &Fingerprint) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        drop(entries);
        tracing::debug!("cleared cache {:?} ({count} entries)", self.name);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn victim(&self, entries: &HashMap<Fingerprint, Entry>) -> Option<Fingerprint> {
        let stamp = |entry: &Entry| match self.policy {
            CachePolicy::Fifo { .. } => entry.inserted,
            CachePolicy::Lru { .. } | CachePolicy::Unbounded => {
                entry.last_used.load(Ordering::Relaxed)
            }
        };
        entries
            .iter()
            .min_by_key(|(_, entry)| stamp(entry))
            .map(|(key, _)| *key)
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("entries", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry of named caches.
#[derive(Default)]
pub struct CacheRegistry {
    caches: RwLock<BTreeMap<String, Arc<Cache>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static CacheRegistry {
        static REGISTRY: OnceLock<CacheRegistry> = OnceLock::new();
        REGISTRY.get_or_init(CacheRegistry::new)
    }

    /// Return the cache named `name`, creating an unbounded one if needed.
    pub fn register_cache(&self, name: &str) -> Arc<Cache> {
        if let Some(cache) = self.cache(name) {
            return cache;
        }
        self.register(name, CachePolicy::Unbounded)
    }

    /// Return the cache named `name`, creating it with `policy` if needed.
    ///
    /// An existing cache keeps its original policy.
    pub fn register_cache_with_policy(&self, name: &str, policy: CachePolicy) -> Arc<Cache> {
        if let Some(cache) = self.cache(name) {
            if cache.policy() != policy {
                usage_warning(format_args!(
                    "cache {name:?} is already registered with {:?}; ignoring {policy:?}",
                    cache.policy()
                ));
            }
            return cache;
        }
        self.register(name, policy)
    }

    fn register(&self, name: &str, policy: CachePolicy) -> Arc<Cache> {
        let mut caches = self.caches.write();
        // Another thread may have registered between the read and the write.
        let cache = caches
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!("registered cache {name:?} ({policy:?})");
                Arc::new(Cache::new(name, policy))
            });
        Arc::clone(cache)
    }

    pub fn unregister_cache(&self, name: &str) -> Option<Arc<Cache>> {
        self.caches.write().remove(name)
    }

    pub fn cache(&self, name: &str) -> Option<Arc<Cache>> {
        self.caches.read().get(name).cloned()
    }

    /// Registered cache names in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        self.caches.read().keys().cloned().collect()
    }

    /// Clear the cache named `name`. Returns whether such a cache exists.
    pub fn clear_cache(&self, name: &str) -> bool {
        match self.cache(name) {
            Some(cache) => {
                cache.clear();
                true
            }
            None => false,
        }
    }

    pub fn clear_all_caches(&self) {
        for cache in self.caches.read().values() {
            cache.clear();
        }
    }
}

impl fmt::Display for CacheRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let caches = self.caches.read();
        write!(f, "{{")?;
        for (i, (name, cache)) in caches.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name:?}: {} item(s)", cache.len())?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Caching switch
// ---------------------------------------------------------------------------

static CACHING_ENABLED: AtomicBool = AtomicBool::new(true);

pub fn is_caching_enabled() -> bool {
    CACHING_ENABLED.load(Ordering::Acquire)
}

/// Enable or disable memoization through [`Cache::get_or_insert_with`],
/// returning the previous setting.
pub fn set_caching_enable(enable: bool) -> bool {
    let previous = CACHING_ENABLED.swap(enable, Ordering::AcqRel);
    if previous != enable {
        tracing::debug!("caching enabled: {enable}");
    }
    previous
}

/// Scope guard returned by [`caching_enable`].
#[must_use = "the caching switch reverts when the guard is dropped"]
pub struct CachingGuard {
    previous: bool,
}

impl Drop for CachingGuard {
    fn drop(&mut self) {
        set_caching_enable(self.previous);
    }
}

/// Set the caching switch until the returned guard is dropped.
pub fn caching_enable(enable: bool) -> CachingGuard {
    CachingGuard {
        previous: set_caching_enable(enable),
    }
}
