use crate::lookup::Lookup;
use crate::time;

use core::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

/// A value together with the instant it stops being fresh.
///
/// The pair is immutable and replaced as a unit, so a reader never sees a
/// value next to someone else's expiry.
struct Stamped<V> {
  value: Arc<V>,
  /// `None` if the deadline overflowed `Instant`; such a value never expires.
  expire_at: Option<Instant>,
}

/// A single cached value with a fixed time-to-live.
///
/// Reads load the current `(value, expiry)` pair without locking. When the
/// value is absent or expired, `get_or_update` serializes callers on a
/// per-cell mutex and re-checks under it, so one computation serves every
/// caller that raced into the miss.
///
/// The compute closure runs with the mutex held and is not bounded by any
/// timeout: a computation that never returns blocks every caller waiting on
/// this cell.
pub struct ExpiryCell<V> {
  slot: ArcSwapOption<Stamped<V>>,
  timeout: Duration,
  refresh: Mutex<()>,
}

impl<V> fmt::Debug for ExpiryCell<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExpiryCell")
      .field("timeout", &self.timeout)
      .field("populated", &self.slot.load().is_some())
      .finish_non_exhaustive()
  }
}

impl<V> ExpiryCell<V> {
  /// Creates an empty cell whose values stay fresh for `timeout`.
  pub fn new(timeout: Duration) -> Self {
    Self {
      slot: ArcSwapOption::empty(),
      timeout,
      refresh: Mutex::new(()),
    }
  }

  /// The time-to-live applied to every value installed in this cell.
  #[inline]
  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  /// Returns the value if it is fresh right now.
  #[inline]
  pub fn get(&self) -> Option<Arc<V>> {
    self.get_at(Instant::now())
  }

  /// Returns the value if it is fresh at `now`.
  ///
  /// Never blocks and never mutates. `None` if nothing was ever stored or if
  /// the stored value expired strictly before `now`.
  pub fn get_at(&self, now: Instant) -> Option<Arc<V>> {
    let guard = self.slot.load();
    match &*guard {
      Some(stamped) if !time::is_expired(stamped.expire_at, now) => Some(stamped.value.clone()),
      _ => None,
    }
  }

  /// Returns the fresh value, or runs `compute` to produce and cache a new one.
  pub fn get_or_update<F, E>(&self, compute: F) -> Result<Lookup<V>, E>
  where
    F: FnOnce() -> Result<V, E>,
  {
    self.get_or_update_at(Instant::now(), compute)
  }

  /// Same as [`get_or_update`](Self::get_or_update), evaluated at `now`.
  ///
  /// On success the new value expires at `now + timeout`. If `compute` fails
  /// its error is returned as-is and the cell is left untouched, so the next
  /// caller tries again.
  pub fn get_or_update_at<F, E>(&self, now: Instant, compute: F) -> Result<Lookup<V>, E>
  where
    F: FnOnce() -> Result<V, E>,
  {
    // Fast path, no lock.
    if let Some(value) = self.get_at(now) {
      return Ok(Lookup::Cached(value));
    }

    let _refresh = self.refresh.lock();

    // Another caller may have refreshed the cell while we waited.
    if let Some(value) = self.get_at(now) {
      return Ok(Lookup::Cached(value));
    }

    tracing::trace!(timeout = ?self.timeout, "expiry cell miss, computing value");
    let value = match compute() {
      Ok(value) => Arc::new(value),
      Err(err) => {
        tracing::debug!("expiry cell compute failed, cell left unchanged");
        return Err(err);
      }
    };

    let expire_at = time::deadline(now, self.timeout);
    self.slot.store(Some(Arc::new(Stamped {
      value: value.clone(),
      expire_at,
    })));
    tracing::trace!(?expire_at, "expiry cell refreshed");

    Ok(Lookup::Computed(value))
  }
}
