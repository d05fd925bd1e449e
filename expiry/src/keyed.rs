use crate::cell::ExpiryCell;
use crate::lookup::Lookup;

use core::fmt;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// A cache holding one [`ExpiryCell`] per key.
///
/// Cells are created on first use and are never removed, so the key space
/// must be bounded by the caller (for example, a fixed set of backend nodes).
/// Keys never contend with each other beyond the map's own shard locks, which
/// are released before any computation starts.
pub struct KeyedExpiryCache<K, V, H = ahash::RandomState> {
  cells: DashMap<K, Arc<ExpiryCell<V>>, H>,
  time_to_live: Duration,
}

impl<K, V, H> fmt::Debug for KeyedExpiryCache<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("KeyedExpiryCache")
      .field("time_to_live", &self.time_to_live)
      .field("len", &self.cells.len())
      .finish_non_exhaustive()
  }
}

impl<K, V> KeyedExpiryCache<K, V>
where
  K: Eq + Hash,
{
  /// Creates an empty cache whose values stay fresh for `time_to_live`.
  pub fn new(time_to_live: Duration) -> Self {
    Self::with_hasher(time_to_live, ahash::RandomState::new())
  }
}

impl<K, V, H> KeyedExpiryCache<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  pub(crate) fn with_hasher(time_to_live: Duration, hasher: H) -> Self {
    Self {
      cells: DashMap::with_hasher(hasher),
      time_to_live,
    }
  }

  /// The time-to-live given to every per-key cell.
  pub fn time_to_live(&self) -> Duration {
    self.time_to_live
  }

  /// Number of keys that own a cell.
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  /// `true` if no key has a cell yet.
  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  /// Returns the fresh value for `key` without computing or creating anything.
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
    let cell = self.cells.get(key).map(|entry| entry.value().clone())?;
    cell.get_at(now)
  }

  /// Returns the fresh value for `key`, or runs `compute` to refresh it.
  ///
  /// Concurrent callers for the same key share one computation; see
  /// [`ExpiryCell::get_or_update`].
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
    self.cell_for(key).get_or_update_at(now, compute)
  }

  /// Finds the cell for `key`, creating it if this is the first use.
  ///
  /// The returned `Arc` is cloned out so no shard lock outlives this call.
  fn cell_for(&self, key: K) -> Arc<ExpiryCell<V>> {
    // Optimistic shared lookup first.
    if let Some(cell) = self.cells.get(&key).map(|entry| entry.value().clone()) {
      return cell;
    }

    // Creation goes through the entry API, which holds the shard's write lock
    // so only one cell can ever be inserted for a key.
    let time_to_live = self.time_to_live;
    self
      .cells
      .entry(key)
      .or_insert_with(|| Arc::new(ExpiryCell::new(time_to_live)))
      .value()
      .clone()
  }
}
