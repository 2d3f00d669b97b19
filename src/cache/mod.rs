//! Fingerprinted memoization of document operations.

pub mod fingerprint;
pub mod ops;

pub use fingerprint::{Fingerprint, StableHasher};
pub use ops::{CacheStats, OpCache, OpCacheOpts};
