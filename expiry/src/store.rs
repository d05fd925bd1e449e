use crate::time;

use core::fmt;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

struct Slot<V> {
  value: V,
  /// Set once when the entry is created; access does not extend it.
  expire_at: Option<Instant>,
}

/// A fixed-capacity, least-recently-used map whose entries also expire a fixed
/// time after they were created.
///
/// Every operation takes a single mutex, so `get_or_insert_with` is an atomic
/// get-or-create: the factory runs at most once per absent key.
pub(crate) struct ExpiringLru<K, V, H> {
  inner: Mutex<LruCache<K, Slot<V>, H>>,
  capacity: NonZeroUsize,
  entry_ttl: Duration,
}

impl<K, V, H> fmt::Debug for ExpiringLru<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExpiringLru")
      .field("capacity", &self.capacity)
      .field("entry_ttl", &self.entry_ttl)
      .finish_non_exhaustive()
  }
}

impl<K, V, H> ExpiringLru<K, V, H>
where
  K: Hash + Eq,
  V: Clone,
  H: BuildHasher,
{
  pub(crate) fn with_hasher(capacity: NonZeroUsize, entry_ttl: Duration, hasher: H) -> Self {
    Self {
      inner: Mutex::new(LruCache::with_hasher(capacity, hasher)),
      capacity,
      entry_ttl,
    }
  }

  pub(crate) fn entry_ttl(&self) -> Duration {
    self.entry_ttl
  }

  pub(crate) fn capacity(&self) -> usize {
    self.capacity.get()
  }

  /// Resident entries, including expired ones that have not been touched since
  /// they expired.
  pub(crate) fn len(&self) -> usize {
    self.inner.lock().len()
  }

  /// Returns the live value for `key`, promoting it to most-recently-used.
  ///
  /// An expired entry is dropped and reported as absent.
  pub(crate) fn get<Q>(&self, key: &Q, now: Instant) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let mut lru = self.inner.lock();
    let expired = match lru.get(key) {
      Some(slot) if !time::is_expired(slot.expire_at, now) => return Some(slot.value.clone()),
      Some(_) => true,
      None => false,
    };
    if expired {
      lru.pop(key);
      tracing::trace!("expiring lru dropped an expired entry");
    }
    None
  }

  /// Returns the live value for `key`, or inserts the one produced by `factory`.
  ///
  /// If the store is full, inserting evicts the least-recently-used entry.
  pub(crate) fn get_or_insert_with<F>(&self, key: K, now: Instant, factory: F) -> V
  where
    F: FnOnce() -> V,
  {
    let mut lru = self.inner.lock();
    let expired = match lru.get(&key) {
      Some(slot) if !time::is_expired(slot.expire_at, now) => return slot.value.clone(),
      Some(_) => true,
      None => false,
    };
    if expired {
      lru.pop(&key);
      tracing::trace!("expiring lru replacing an expired entry");
    }

    let value = factory();
    let slot = Slot {
      value: value.clone(),
      expire_at: time::deadline(now, self.entry_ttl),
    };
    if lru.push(key, slot).is_some() {
      tracing::trace!(capacity = self.capacity.get(), "expiring lru evicted least-recently-used entry");
    }
    value
  }

  /// Removes `key`, returning whether it was resident.
  pub(crate) fn remove<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.inner.lock().pop(key).is_some()
  }
}
