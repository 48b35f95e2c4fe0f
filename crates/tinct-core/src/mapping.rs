//! Ordered mappings with case-insensitive string keys.
//!
//! Keys are folded with [`str::to_lowercase`] for lookup while the spelling
//! used at insertion is kept for iteration and display. Iteration follows
//! insertion order. Re-inserting a key that folds to an existing entry keeps
//! the entry's position and replaces both the stored spelling and the value.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use crate::error::{TinctError, TinctResult};

fn fold(key: &str) -> String {
    key.to_lowercase()
}

/// An insertion-ordered mapping whose keys compare case-insensitively.
#[derive(Clone)]
pub struct CaseInsensitiveMapping<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> CaseInsensitiveMapping<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert `value` under `key`, returning the value previously stored under
    /// any case variant of `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let folded = fold(&key);
        match self.index.get(&folded) {
            Some(&slot) => {
                let (stored_key, stored_value) = &mut self.entries[slot];
                *stored_key = key;
                Some(std::mem::replace(stored_value, value))
            }
            None => {
                self.index.insert(folded, self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.slot(key).map(|slot| &self.entries[slot].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.slot(key).map(|slot| &mut self.entries[slot].1)
    }

    /// Returns the key as spelled at insertion together with its value.
    pub fn get_key_value(&self, key: &str) -> Option<(&str, &V)> {
        self.slot(key).map(|slot| {
            let (k, v) = &self.entries[slot];
            (k.as_str(), v)
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slot(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let slot = self.index.remove(&fold(key))?;
        let (_, value) = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order, keys as spelled at insertion.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Entries in insertion order with case-folded keys.
    pub fn lower_items(&self) -> impl Iterator<Item = (String, &V)> {
        self.entries.iter().map(|(k, v)| (fold(k), v))
    }

    fn slot(&self, key: &str) -> Option<usize> {
        self.index.get(&fold(key)).copied()
    }
}

impl<V> Default for CaseInsensitiveMapping<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> PartialEq for CaseInsensitiveMapping<V> {
    /// Equality ignores both key case and insertion order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl<V: Eq> Eq for CaseInsensitiveMapping<V> {}

impl<V: fmt::Debug> fmt::Debug for CaseInsensitiveMapping<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CaseInsensitiveMapping(")?;
        f.debug_map().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}

impl<V> Index<&str> for CaseInsensitiveMapping<V> {
    type Output = V;

    fn index(&self, key: &str) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry for key {key:?}"),
        }
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for CaseInsensitiveMapping<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        mapping.extend(iter);
        mapping
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for CaseInsensitiveMapping<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

// ---------------------------------------------------------------------------
// Lazy values
// ---------------------------------------------------------------------------

type Producer<V> = Box<dyn Fn() -> V + Send + Sync>;

struct LazyValue<V> {
    cell: OnceCell<V>,
    producer: Option<Producer<V>>,
}

/// A [`CaseInsensitiveMapping`] whose values may be produced on first access.
///
/// Produced values are memoized; the producer runs at most once per entry.
pub struct LazyCaseInsensitiveMapping<V> {
    inner: CaseInsensitiveMapping<LazyValue<V>>,
}

impl<V> LazyCaseInsensitiveMapping<V> {
    pub fn new() -> Self {
        Self {
            inner: CaseInsensitiveMapping::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let cell = OnceCell::new();
        let _ = cell.set(value);
        self.inner.insert(
            key,
            LazyValue {
                cell,
                producer: None,
            },
        );
    }

    pub fn insert_with<F>(&mut self, key: impl Into<String>, producer: F)
    where
        F: Fn() -> V + Send + Sync + 'static,
    {
        self.inner.insert(
            key,
            LazyValue {
                cell: OnceCell::new(),
                producer: Some(Box::new(producer)),
            },
        );
    }

    /// Returns the value for `key`, running its producer if needed.
    pub fn get(&self, key: &str) -> Option<&V> {
        let slot = self.inner.get(key)?;
        if let Some(value) = slot.cell.get() {
            return Some(value);
        }
        let producer = slot.producer.as_ref()?;
        Some(slot.cell.get_or_init(|| producer()))
    }

    /// Whether the value for `key` exists and has already been produced.
    pub fn is_evaluated(&self, key: &str) -> bool {
        self.inner
            .get(key)
            .is_some_and(|slot| slot.cell.get().is_some())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys()
    }
}

impl<V> Default for LazyCaseInsensitiveMapping<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for LazyCaseInsensitiveMapping<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazyCaseInsensitiveMapping(")?;
        f.debug_map()
            .entries(self.inner.iter().map(|(k, slot)| (k, slot.cell.get())))
            .finish()?;
        f.write_str(")")
    }
}

// ---------------------------------------------------------------------------
// Reverse lookup
// ---------------------------------------------------------------------------

/// An insertion-ordered mapping with exact string keys that can also be
/// searched by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<V> {
    entries: Vec<(String, V)>,
}

impl<V> Lookup<V> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(stored, _)| *stored == key) {
            Some((_, stored)) => Some(std::mem::replace(stored, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(stored, _)| stored == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<V: PartialEq> Lookup<V> {
    /// Every key whose value equals `value`, in insertion order.
    pub fn keys_from_value(&self, value: &V) -> Vec<&str> {
        self.iter()
            .filter(|(_, stored)| *stored == value)
            .map(|(key, _)| key)
            .collect()
    }

    /// The first key, in insertion order, whose value equals `value`.
    pub fn first_key_from_value(&self, value: &V) -> TinctResult<&str>
    where
        V: fmt::Debug,
    {
        self.iter()
            .find(|(_, stored)| *stored == value)
            .map(|(key, _)| key)
            .ok_or_else(|| TinctError::NoKeyForValue(format!("{value:?}")))
    }
}

impl<V> Default for Lookup<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for Lookup<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for (key, value) in iter {
            lookup.insert(key, value);
        }
        lookup
    }
}

/// Resolve `method` case-insensitively against `valid`, returning the
/// canonical spelling.
pub fn validate_method(method: &str, valid: &[&'static str]) -> TinctResult<&'static str> {
    let folded = fold(method);
    valid
        .iter()
        .find(|candidate| fold(candidate) == folded)
        .copied()
        .ok_or_else(|| TinctError::InvalidMethod {
            method: method.to_string(),
            valid: valid.to_vec(),
        })
}
