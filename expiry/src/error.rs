use thiserror::Error;

/// Errors that can occur when building a cell or cache.
///
/// Failures of the compute closure are not represented here; they are
/// returned to the caller exactly as the closure produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// No time-to-live was configured for cached values.
  #[error("a time-to-live is required")]
  MissingTimeToLive,

  /// A bounded cache was requested without a capacity.
  #[error("a bounded cache requires a capacity")]
  MissingCapacity,

  /// A bounded cache was configured with a capacity of zero. Use
  /// `build_keyed()` for a cache without a size limit.
  #[error("bounded cache capacity cannot be zero")]
  ZeroCapacity,

  /// A configuration value could not be parsed.
  #[error("invalid configuration value for '{field}': {message}")]
  InvalidConfigValue { field: String, message: String },
}
