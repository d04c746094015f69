//! Research client for X (Twitter) API v2 recent search.
//!
//! This crate provides:
//! - Authenticated recent search with multi-page pagination
//! - Normalization of raw API payloads into flat `Post` records
//! - Thread, profile and single-post lookups
//! - A TTL query cache with file and in-memory backends
//! - Sorting, engagement filtering and deduplication of results

pub mod config;
pub mod error;
pub mod processing;
pub mod storage;
pub mod twitter;

// Re-export main types
pub use config::{BearerToken, ClientConfig, CredentialSources};
pub use error::{XError, XResult};
pub use processing::{dedupe, extract_post_id, filter_engagement, sort_by, EngagementFilter};
pub use storage::{Cache, CacheLookup, FileCache, MemoryCache, DEFAULT_TTL};
pub use twitter::{
    Metric, Metrics, Post, Profile, ProfileOptions, RootStatus, SearchOptions, SortOrder, Thread,
    ThreadOptions, User, XApi, XClient,
};
