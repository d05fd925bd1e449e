use std::sync::Arc;

/// The outcome of a successful `get_or_update`.
///
/// Both variants carry the value; the variant records whether it was served
/// from the cell or produced by running the compute closure on this call.
#[derive(Debug)]
pub enum Lookup<V> {
  /// The value was already fresh in the cell.
  Cached(Arc<V>),
  /// This call ran the compute closure and installed its result.
  Computed(Arc<V>),
}

impl<V> Lookup<V> {
  /// Returns a reference to the value.
  #[inline]
  pub fn value(&self) -> &Arc<V> {
    match self {
      Lookup::Cached(value) | Lookup::Computed(value) => value,
    }
  }

  /// Consumes the lookup, returning the value.
  #[inline]
  pub fn into_value(self) -> Arc<V> {
    match self {
      Lookup::Cached(value) | Lookup::Computed(value) => value,
    }
  }

  /// `true` if no computation happened for this call.
  #[inline]
  pub fn is_cached(&self) -> bool {
    matches!(self, Lookup::Cached(_))
  }
}

impl<V> Clone for Lookup<V> {
  fn clone(&self) -> Self {
    match self {
      Lookup::Cached(value) => Lookup::Cached(value.clone()),
      Lookup::Computed(value) => Lookup::Computed(value.clone()),
    }
  }
}
