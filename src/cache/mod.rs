//! Cache module for deduplicating upstream search queries
//!
//! This module provides an in-memory response cache keyed by a normalized query
//! signature. Entries carry an expiry timestamp and are dropped lazily once a
//! lookup sees them past their TTL. Nothing is persisted across restarts.

mod response;

pub use response::{CacheStats, ResponseCache, DEFAULT_TTL_SECS};
