//! Normalized X data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for author fields when the author was not side-loaded.
pub const UNKNOWN_AUTHOR: &str = "?";

/// A normalized post (tweet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique post ID.
    pub id: String,
    /// Post text content.
    pub text: String,
    /// Author user ID.
    pub author_id: String,
    /// Author handle (without @), or [`UNKNOWN_AUTHOR`].
    pub username: String,
    /// Author display name, or [`UNKNOWN_AUTHOR`].
    pub display_name: String,
    /// When the post was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Root post ID of the thread this post belongs to.
    pub conversation_id: String,
    /// Engagement counters.
    #[serde(default)]
    pub metrics: Metrics,
    /// Expanded URLs, in provider order.
    #[serde(default)]
    pub urls: Vec<String>,
    /// Mentioned handles, in provider order.
    #[serde(default)]
    pub mentions: Vec<String>,
    /// Hashtags, in provider order.
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl Post {
    /// Create a post with no metrics, entities or author record.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            conversation_id: id.clone(),
            id,
            text: text.into(),
            author_id: String::new(),
            username: UNKNOWN_AUTHOR.to_string(),
            display_name: UNKNOWN_AUTHOR.to_string(),
            created_at: None,
            metrics: Metrics::default(),
            urls: Vec::new(),
            mentions: Vec::new(),
            hashtags: Vec::new(),
        }
    }

    /// Canonical link to the post.
    #[must_use]
    pub fn permalink(&self) -> String {
        format!("https://x.com/{}/status/{}", self.username, self.id)
    }

    /// Whether the author record was missing from the payload.
    #[must_use]
    pub fn has_unknown_author(&self) -> bool {
        self.username == UNKNOWN_AUTHOR
    }

    /// Get external URLs (excluding X/Twitter links).
    #[must_use]
    pub fn external_urls(&self) -> Vec<&str> {
        self.urls
            .iter()
            .filter(|url| !is_platform_url(url))
            .map(String::as_str)
            .collect()
    }
}

fn is_platform_url(url: &str) -> bool {
    let host = url
        .split("://")
        .nth(1)
        .unwrap_or(url)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_start_matches("www.");
    matches!(host, "x.com" | "twitter.com" | "t.co" | "mobile.twitter.com")
}

/// Engagement counters; absent counters are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub likes: u64,
    pub reshares: u64,
    pub replies: u64,
    pub quotes: u64,
    pub impressions: u64,
    pub bookmarks: u64,
}

impl Metrics {
    /// Value of a single counter.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Likes => self.likes,
            Metric::Reshares => self.reshares,
            Metric::Replies => self.replies,
            Metric::Quotes => self.quotes,
            Metric::Impressions => self.impressions,
            Metric::Bookmarks => self.bookmarks,
        }
    }
}

/// A named engagement counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Like count.
    #[default]
    Likes,
    /// Retweet count.
    #[serde(alias = "retweets")]
    Reshares,
    /// Reply count.
    Replies,
    /// Quote count.
    Quotes,
    /// Impression count.
    Impressions,
    /// Bookmark count.
    Bookmarks,
}

/// A normalized user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: String,
    /// Handle (without @).
    pub username: String,
    /// Display name.
    pub name: String,
    /// Bio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Account creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub tweets: u64,
    #[serde(default)]
    pub listed: u64,
}

impl User {
    /// Get the handle with @ prefix.
    #[must_use]
    pub fn at_handle(&self) -> String {
        format!("@{}", self.username)
    }
}
