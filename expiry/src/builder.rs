use crate::bounded::BoundedExpiryCache;
use crate::cell::ExpiryCell;
use crate::error::BuildError;
use crate::keyed::KeyedExpiryCache;

use core::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::time::Duration;

/// A builder for [`ExpiryCell`], [`KeyedExpiryCache`] and [`BoundedExpiryCache`].
pub struct ExpiryCacheBuilder<K, V, H = ahash::RandomState> {
  pub(crate) time_to_live: Option<Duration>,
  pub(crate) entry_ttl: Option<Duration>,
  pub(crate) capacity: Option<usize>,
  hasher: H,
  _key_marker: PhantomData<K>,
  _value_marker: PhantomData<V>,
}

impl<K, V, H> fmt::Debug for ExpiryCacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExpiryCacheBuilder")
      .field("time_to_live", &self.time_to_live)
      .field("entry_ttl", &self.entry_ttl)
      .field("capacity", &self.capacity)
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
impl<K, V, H> ExpiryCacheBuilder<K, V, H> {
  /// Sets how long a computed value stays fresh. Required.
  pub fn time_to_live(mut self, duration: Duration) -> Self {
    self.time_to_live = Some(duration);
    self
  }

  /// Sets how long a key keeps its entry in a bounded cache, independently of
  /// the freshness of its value.
  ///
  /// Defaults to the `time_to_live`. Ignored by unbounded caches.
  pub fn entry_ttl(mut self, duration: Duration) -> Self {
    self.entry_ttl = Some(duration);
    self
  }

  /// Sets the maximum number of keys a bounded cache holds.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = Some(capacity);
    self
  }

  /// Replaces the hasher used by the keyed caches.
  pub fn hasher<H2>(self, hasher: H2) -> ExpiryCacheBuilder<K, V, H2> {
    ExpiryCacheBuilder {
      time_to_live: self.time_to_live,
      entry_ttl: self.entry_ttl,
      capacity: self.capacity,
      hasher,
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }

  fn require_time_to_live(&self) -> Result<Duration, BuildError> {
    self.time_to_live.ok_or(BuildError::MissingTimeToLive)
  }

  /// Builds a single cell. Capacity and hasher settings are ignored.
  pub fn build_cell(self) -> Result<ExpiryCell<V>, BuildError> {
    Ok(ExpiryCell::new(self.require_time_to_live()?))
  }
}

// --- Default Constructor ---
impl<K, V, H: Default> ExpiryCacheBuilder<K, V, H> {
  /// Creates a new builder with no time-to-live and no capacity set.
  pub fn new() -> Self {
    Self {
      time_to_live: None,
      entry_ttl: None,
      capacity: None,
      hasher: H::default(),
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }
}

impl<K, V> Default for ExpiryCacheBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<K, V, H> ExpiryCacheBuilder<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  /// Builds a cache that creates one cell per key and never removes them.
  pub fn build_keyed(self) -> Result<KeyedExpiryCache<K, V, H>, BuildError> {
    let time_to_live = self.require_time_to_live()?;
    Ok(KeyedExpiryCache::with_hasher(time_to_live, self.hasher))
  }

  /// Builds a cache bounded to `capacity` keys with LRU eviction.
  pub fn build_bounded(self) -> Result<BoundedExpiryCache<K, V, H>, BuildError> {
    let time_to_live = self.require_time_to_live()?;
    let capacity = self.capacity.ok_or(BuildError::MissingCapacity)?;
    let capacity = NonZeroUsize::new(capacity).ok_or(BuildError::ZeroCapacity)?;
    let entry_ttl = self.entry_ttl.unwrap_or(time_to_live);
    Ok(BoundedExpiryCache::with_hasher(
      capacity,
      time_to_live,
      entry_ttl,
      self.hasher,
    ))
  }
}
