//! Dual-tier key/value caching for the compass routing layer.
//!
//! A durable networked store backs the cache whenever it is reachable; a
//! bounded in-process map takes over transparently on any connection
//! failure. Entries carry per-category time-to-live values and reports
//! support dependency-based invalidation.

/// Cache key construction and category TTLs.
pub mod keys;
/// Bounded in-process store.
pub mod local;
/// HTTP client for the durable store.
pub mod remote;
/// The fallback-aware cache service.
pub mod service;
/// The store abstraction shared by both tiers.
pub mod store;

pub use keys::{cache_key, content_digest, CacheCategory};
pub use local::LocalStore;
pub use remote::RemoteStore;
pub use service::{CacheService, ReportEntry};
pub use store::CacheStore;
