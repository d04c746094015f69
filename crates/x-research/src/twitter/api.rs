//! Composed X queries: search, threads, profiles and single lookups.

use std::sync::Arc;
use std::time::Duration;

use super::client::XClient;
use super::normalizer::Normalizer;
use super::paginator::{Paginator, SearchOptions, SortOrder, MAX_RESULTS_PER_PAGE};
use super::raw::{RawResponse, RawUserResponse};
use super::types::{Post, User};
use crate::config::ClientConfig;
use crate::error::{XError, XResult};
use crate::storage::{Cache, CacheLookup};

/// Pages fetched for a thread when not specified.
pub const DEFAULT_THREAD_PAGES: u32 = 2;

/// Posts fetched for a profile when not specified.
pub const DEFAULT_PROFILE_COUNT: u32 = 20;

/// Options for [`XApi::thread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadOptions {
    /// Max search pages.
    pub pages: u32,
}

impl Default for ThreadOptions {
    fn default() -> Self {
        Self {
            pages: DEFAULT_THREAD_PAGES,
        }
    }
}

/// Options for [`XApi::profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileOptions {
    /// Posts to request, capped at 100. Zero means the default of 20.
    pub count: u32,
    /// Keep the user's replies in the timeline.
    pub include_replies: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_PROFILE_COUNT,
            include_replies: false,
        }
    }
}

impl ProfileOptions {
    /// Page size for the timeline search. Zero means the default count.
    #[must_use]
    pub fn max_results(&self) -> u32 {
        let count = if self.count == 0 {
            DEFAULT_PROFILE_COUNT
        } else {
            self.count
        };
        count.min(MAX_RESULTS_PER_PAGE)
    }
}

/// What happened to the root post of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootStatus {
    /// Root fetched and placed first.
    Included,
    /// Provider returned no data for the root (deleted or protected).
    NotFound,
    /// Root lookup failed; the thread is returned without it.
    Failed(String),
}

/// A reconstructed conversation.
#[derive(Debug, Clone)]
pub struct Thread {
    /// Root first when available, then search results newest first.
    pub posts: Vec<Post>,
    /// Outcome of the root lookup.
    pub root: RootStatus,
}

/// A user and their recent posts.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub posts: Vec<Post>,
}

/// Search query for a user's own recent posts.
#[must_use]
pub fn profile_query(username: &str, include_replies: bool) -> String {
    let mut query = format!("from:{username} -is:retweet");
    if !include_replies {
        query.push_str(" -is:reply");
    }
    query
}

/// Entry point for X queries.
#[derive(Clone)]
pub struct XApi {
    paginator: Paginator,
    cache: Option<Arc<dyn Cache>>,
}

impl std::fmt::Debug for XApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XApi")
            .field("paginator", &self.paginator)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

impl XApi {
    /// Build a client and paginator from configuration.
    pub fn new(config: &ClientConfig) -> XResult<Self> {
        let client = XClient::new(config)?;
        Ok(Self::from_paginator(Paginator::new(client, config.page_delay)))
    }

    #[must_use]
    pub fn from_paginator(paginator: Paginator) -> Self {
        Self {
            paginator,
            cache: None,
        }
    }

    /// Memoize [`XApi::cached_search`] results in `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    fn client(&self) -> &XClient {
        self.paginator.client()
    }

    /// Search recent posts.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> XResult<Vec<Post>> {
        self.paginator.search(query, options).await
    }

    /// Search, answering from the cache when a fresh entry exists.
    ///
    /// Without a configured cache this is plain [`XApi::search`]. Failing to
    /// store the result is logged, not returned.
    pub async fn cached_search(
        &self,
        query: &str,
        options: &SearchOptions,
        ttl: Duration,
    ) -> XResult<Vec<Post>> {
        let Some(cache) = &self.cache else {
            return self.search(query, options).await;
        };

        let params = options.cache_params();
        match cache.get(query, &params, ttl).await {
            CacheLookup::Hit(posts) => {
                tracing::debug!(query, count = posts.len(), "Serving search from cache");
                return Ok(posts);
            }
            CacheLookup::Malformed(reason) => {
                tracing::debug!(query, reason, "Ignoring malformed cache entry");
            }
            CacheLookup::Miss | CacheLookup::Expired => {}
        }

        let posts = self.search(query, options).await?;
        if let Err(e) = cache.set(query, &params, &posts).await {
            tracing::warn!(query, error = %e, "Failed to cache search results");
        }
        Ok(posts)
    }

    /// Fetch a conversation by its root post ID.
    ///
    /// The root lookup is best effort: its failure is reported in
    /// [`Thread::root`] and never fails the call.
    pub async fn thread(&self, conversation_id: &str, options: ThreadOptions) -> XResult<Thread> {
        let search_options = SearchOptions::default()
            .with_pages(options.pages)
            .with_sort_order(SortOrder::Recency);
        let mut posts = self
            .search(&format!("conversation_id:{conversation_id}"), &search_options)
            .await?;

        let root = match self.get_tweet(conversation_id).await {
            Ok(Some(root)) => {
                posts.insert(0, root);
                RootStatus::Included
            }
            Ok(None) => {
                tracing::debug!(conversation_id, "Thread root not returned");
                RootStatus::NotFound
            }
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "Thread root lookup failed");
                RootStatus::Failed(e.to_string())
            }
        };

        tracing::info!(conversation_id, count = posts.len(), root = ?root, "Fetched thread");
        Ok(Thread { posts, root })
    }

    /// Fetch a user and their recent original posts.
    pub async fn profile(&self, username: &str, options: ProfileOptions) -> XResult<Profile> {
        let username = username.trim_start_matches('@');
        let url = self.client().user_by_username_url(username);
        let raw: RawUserResponse = self.client().get(&url).await?;
        let user = Normalizer::normalize_user(&raw)
            .ok_or_else(|| XError::UserNotFound(username.to_string()))?;

        tokio::time::sleep(self.paginator.page_delay()).await;

        let search_options = SearchOptions::default()
            .with_max_results(options.max_results())
            .with_sort_order(SortOrder::Recency);
        let posts = self
            .search(&profile_query(username, options.include_replies), &search_options)
            .await?;

        Ok(Profile { user, posts })
    }

    /// Fetch a single post; `None` when the provider returns no data.
    pub async fn get_tweet(&self, id: &str) -> XResult<Option<Post>> {
        let raw: RawResponse = self.client().get(&self.client().tweet_url(id)).await?;
        Ok(Normalizer::normalize(&raw).into_iter().next())
    }
}
