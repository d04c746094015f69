//! Raw X API v2 payload schema.
//!
//! Every field is optional; defaults are applied only by the normalizer.

use serde::Deserialize;

/// `data` is an array for searches and an object for single lookups.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// List-of-items response
    Many(Vec<T>),
    /// Single-item response
    One(T),
}

/// Tweet search / lookup response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResponse {
    /// Primary data
    #[serde(default)]
    pub data: Option<OneOrMany<RawTweet>>,

    /// Side-loaded expansions
    #[serde(default)]
    pub includes: Option<RawIncludes>,

    /// Pagination metadata
    #[serde(default)]
    pub meta: Option<RawMeta>,

    /// Partial errors
    #[serde(default)]
    pub errors: Option<Vec<serde_json::Value>>,

    /// Item fields when the provider returns a tweet without a `data` wrapper
    #[serde(flatten)]
    pub top_level: RawTweet,
}

/// User lookup response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUserResponse {
    /// The user, absent when not found
    #[serde(default)]
    pub data: Option<RawUser>,

    /// Lookup errors ("Could not find user ...")
    #[serde(default)]
    pub errors: Option<Vec<serde_json::Value>>,
}

/// Side-loaded expansions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIncludes {
    /// Authors referenced by `author_id`
    #[serde(default)]
    pub users: Option<Vec<RawUser>>,
}

/// Pagination metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMeta {
    /// Continuation token
    #[serde(default)]
    pub next_token: Option<String>,

    /// Items on this page
    #[serde(default)]
    pub result_count: Option<u64>,
}

/// Tweet object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTweet {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub public_metrics: Option<RawTweetMetrics>,
    #[serde(default)]
    pub entities: Option<RawEntities>,
}

/// Tweet engagement counters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTweetMetrics {
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub retweet_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub quote_count: Option<u64>,
    #[serde(default)]
    pub impression_count: Option<u64>,
    #[serde(default)]
    pub bookmark_count: Option<u64>,
}

/// Entity annotations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntities {
    #[serde(default)]
    pub urls: Option<Vec<RawUrlEntity>>,
    #[serde(default)]
    pub mentions: Option<Vec<RawMentionEntity>>,
    #[serde(default)]
    pub hashtags: Option<Vec<RawHashtagEntity>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUrlEntity {
    #[serde(default)]
    pub expanded_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMentionEntity {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHashtagEntity {
    #[serde(default)]
    pub tag: Option<String>,
}

/// User object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub public_metrics: Option<RawUserMetrics>,
}

/// User counters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUserMetrics {
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub following_count: Option<u64>,
    #[serde(default)]
    pub tweet_count: Option<u64>,
    #[serde(default)]
    pub listed_count: Option<u64>,
}
