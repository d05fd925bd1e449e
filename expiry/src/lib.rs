//! Time-bounded value cells with single-flight refresh, and keyed caches
//! built on top of them.
//!
//! # Overview
//! - [`ExpiryCell`]: one value plus its expiry. Reads are lock-free; a miss
//!   takes a per-cell lock so concurrent callers trigger at most one
//!   computation.
//! - [`KeyedExpiryCache`]: one cell per key, created lazily, never removed.
//! - [`BoundedExpiryCache`]: one cell per key inside a fixed-capacity LRU
//!   store whose entries also expire on their own TTL.
//!
//! Values are handed out as `Arc<V>`, so `V` does not need to be `Clone`.
//! Errors returned by the compute closure are passed back untouched and are
//! never cached.

// Public modules that form the API
pub mod bounded;
pub mod builder;
pub mod cell;
pub mod error;
pub mod keyed;
pub mod lookup;

#[cfg(feature = "serde")]
pub mod config;

// Internal, crate-only modules
mod store;
mod time;

pub use bounded::BoundedExpiryCache;
pub use builder::ExpiryCacheBuilder;
pub use cell::ExpiryCell;
pub use error::BuildError;
pub use keyed::KeyedExpiryCache;
pub use lookup::Lookup;

#[cfg(feature = "serde")]
pub use config::ExpiryConfig;
