//! Element reference cache.
//!
//! Hands out process-unique keys for matched UI nodes and turns them back
//! into live handles on later commands.

pub mod cache;
pub mod errors;

pub use cache::{CachedElement, ElementCache, DEFAULT_MAX_ENUMERATION};
pub use errors::CacheError;
