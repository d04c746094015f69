//! Local persistence for fetched posts.

mod cache;

pub use cache::{
    cache_key, Cache, CacheEntry, CacheLookup, FileCache, MemoryCache, DEFAULT_TTL,
};
