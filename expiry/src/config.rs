use crate::builder::ExpiryCacheBuilder;
use crate::error::BuildError;

use std::time::Duration;

use serde::Deserialize;

/// Deserializable settings for an expiry cache.
///
/// Durations are human-readable strings such as `"500ms"`, `"30s"` or `"2m"`.
///
/// ```yaml
/// time_to_live: 3s
/// entry_ttl: 1m
/// capacity: 1024
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExpiryConfig {
  pub time_to_live: String,
  #[serde(default)]
  pub entry_ttl: Option<String>,
  #[serde(default)]
  pub capacity: Option<usize>,
}

impl ExpiryConfig {
  /// Validates the settings and turns them into a builder.
  pub fn into_builder<K, V>(self) -> Result<ExpiryCacheBuilder<K, V>, BuildError> {
    self.apply(ExpiryCacheBuilder::new())
  }

  /// Validates the settings and applies them on top of `builder`.
  pub fn apply<K, V, H>(
    self,
    builder: ExpiryCacheBuilder<K, V, H>,
  ) -> Result<ExpiryCacheBuilder<K, V, H>, BuildError> {
    let mut builder = builder.time_to_live(parse_duration(&self.time_to_live, "time_to_live")?);
    if let Some(entry_ttl) = &self.entry_ttl {
      builder = builder.entry_ttl(parse_duration(entry_ttl, "entry_ttl")?);
    }
    if let Some(capacity) = self.capacity {
      if capacity == 0 {
        return Err(BuildError::InvalidConfigValue {
          field: "capacity".to_string(),
          message: "capacity must be greater than zero".to_string(),
        });
      }
      builder = builder.capacity(capacity);
    }
    Ok(builder)
  }
}

fn parse_duration(value: &str, field: &str) -> Result<Duration, BuildError> {
  humantime::parse_duration(value.trim()).map_err(|err| BuildError::InvalidConfigValue {
    field: field.to_string(),
    message: format!("invalid duration '{}': {}", value, err),
  })
}
