//! In-memory caching of fetched backend data.
//!
//! `CachedData` wraps a value with the time it was last replaced. Nothing
//! here touches disk: cached data lives exactly as long as the process.

pub mod cached;

pub use cached::CachedData;
