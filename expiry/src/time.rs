use std::time::{Duration, Instant};

/// Computes the instant at which something stamped at `now` stops being fresh.
///
/// `None` means the deadline is past what `Instant` can represent, which is
/// treated as "never expires".
#[inline]
pub(crate) fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
  now.checked_add(ttl)
}

/// A stamp is expired only once its deadline lies strictly before `now`.
#[inline]
pub(crate) fn is_expired(deadline: Option<Instant>, now: Instant) -> bool {
  match deadline {
    Some(at) => at < now,
    None => false,
  }
}
