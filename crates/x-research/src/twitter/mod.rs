//! X API v2 access.
//!
//! Provides the HTTP client, response normalization, pagination and the
//! composed query operations built on them.

mod api;
mod client;
mod normalizer;
mod paginator;
pub mod raw;
mod types;

pub use api::{
    profile_query, Profile, ProfileOptions, RootStatus, Thread, ThreadOptions, XApi,
    DEFAULT_PROFILE_COUNT, DEFAULT_THREAD_PAGES,
};
pub use client::{RateLimitInfo, XClient, TWEET_FIELDS, USER_FIELDS};
pub use normalizer::{Normalizer, Page};
pub use paginator::{
    format_start_time, parse_since, Paginator, SearchOptions, SortOrder, MAX_RESULTS_PER_PAGE,
    MIN_RESULTS_PER_PAGE,
};
pub use types::{Metric, Metrics, Post, User, UNKNOWN_AUTHOR};
