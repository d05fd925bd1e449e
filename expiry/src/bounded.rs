use crate::cell::ExpiryCell;
use crate::lookup::Lookup;
use crate::store::ExpiringLru;

use core::fmt;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A size-bounded cache holding one [`ExpiryCell`] per key.
///
/// Two clocks are in play. The store's `entry_ttl` and its LRU order decide
/// whether a key still owns a cell at all; the cell's `time_to_live` decides
/// whether the value inside it is fresh. An entry can outlive its value (the
/// next access recomputes) or be evicted while its value was still fresh.
pub struct BoundedExpiryCache<K, V, H = ahash::RandomState> {
  cells: ExpiringLru<K, Arc<ExpiryCell<V>>, H>,
  time_to_live: Duration,
}

impl<K, V, H> fmt::Debug for BoundedExpiryCache<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BoundedExpiryCache")
      .field("time_to_live", &self.time_to_live)
      .field("cells", &self.cells)
      .finish()
  }
}

impl<K, V> BoundedExpiryCache<K, V>
where
  K: Hash + Eq,
{
  /// Creates a cache holding at most `capacity` keys, whose values and entries
  /// both live for `time_to_live`.
  pub fn new(capacity: NonZeroUsize, time_to_live: Duration) -> Self {
    Self::with_hasher(capacity, time_to_live, time_to_live, ahash::RandomState::new())
  }
}

impl<K, V, H> BoundedExpiryCache<K, V, H>
where
  K: Hash + Eq,
  H: BuildHasher,
{
  pub(crate) fn with_hasher(
    capacity: NonZeroUsize,
    time_to_live: Duration,
    entry_ttl: Duration,
    hasher: H,
  ) -> Self {
    Self {
      cells: ExpiringLru::with_hasher(capacity, entry_ttl, hasher),
      time_to_live,
    }
  }

  /// How long a computed value stays fresh.
  pub fn time_to_live(&self) -> Duration {
    self.time_to_live
  }

  /// How long a key keeps its cell before the store drops it.
  pub fn entry_ttl(&self) -> Duration {
    self.cells.entry_ttl()
  }

  /// Maximum number of keys resident at once.
  pub fn capacity(&self) -> usize {
    self.cells.capacity()
  }

  /// Number of resident keys. Entries whose TTL lapsed are only dropped
  /// when next looked up, so they may still be counted here.
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  /// `true` if no key is resident; like [`len`](Self::len), TTL-lapsed entries still count.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the fresh value for `key` without computing or creating anything.
  ///
  /// A hit on the key's entry counts as an access for LRU purposes.
  pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.get_at(key, Instant::now())
  }

  /// Same as [`get`](Self::get), evaluated at `now`.
  pub fn get_at<Q>(&self, key: &Q, now: Instant) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.cells.get(key, now)?.get_at(now)
  }

  /// Returns the fresh value for `key`, or runs `compute` to refresh it.
  ///
  /// The key's entry is created if absent (possibly evicting the
  /// least-recently-used key) and marked as most recently used. The store's
  /// lock is released before `compute` runs.
  pub fn get_or_update<F, E>(&self, key: K, compute: F) -> Result<Lookup<V>, E>
  where
    F: FnOnce() -> Result<V, E>,
  {
    self.get_or_update_at(key, Instant::now(), compute)
  }

  /// Same as [`get_or_update`](Self::get_or_update), evaluated at `now`.
  pub fn get_or_update_at<F, E>(&self, key: K, now: Instant, compute: F) -> Result<Lookup<V>, E>
  where
    F: FnOnce() -> Result<V, E>,
  {
    let time_to_live = self.time_to_live;
    let cell = self
      .cells
      .get_or_insert_with(key, now, || Arc::new(ExpiryCell::new(time_to_live)));
    cell.get_or_update_at(now, compute)
  }

  /// Removes `key` and its cell, returning whether it was resident.
  ///
  /// The next `get_or_update` for the key starts from an empty cell.
  pub fn invalidate<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let removed = self.cells.remove(key);
    if removed {
      tracing::trace!("bounded expiry cache invalidated a key");
    }
    removed
  }
}
