//! # Adapters Layer
//!
//! Stateful infrastructure around the pure domain:
//! - [`rules_cache`]: single-flight TTL cache for the verified rules container

pub mod rules_cache;

pub use rules_cache::{CacheStatus, FetchOutcome, RulesContainerCache, SingleFlightCache};
