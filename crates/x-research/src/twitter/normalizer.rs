//! Raw payload to [`Post`] normalization.
//!
//! This is the only place that reads the raw provider schema.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::raw::{
    OneOrMany, RawEntities, RawResponse, RawTweet, RawTweetMetrics, RawUser, RawUserResponse,
};
use super::types::{Metrics, Post, User, UNKNOWN_AUTHOR};

/// One normalized page of results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Posts in payload order.
    pub posts: Vec<Post>,
    /// Continuation token, if the provider has more.
    pub next_token: Option<String>,
}

/// Converts raw X API payloads into normalized records.
pub struct Normalizer;

impl Normalizer {
    /// Normalize every item in a payload, preserving order.
    ///
    /// Accepts a `data` array, a single `data` object, or a bare tweet at the
    /// top level, which is treated as a one-element list.
    pub fn normalize(raw: &RawResponse) -> Vec<Post> {
        let authors: HashMap<&str, &RawUser> = raw
            .includes
            .iter()
            .filter_map(|includes| includes.users.as_ref())
            .flatten()
            .filter_map(|user| user.id.as_deref().map(|id| (id, user)))
            .collect();

        let items: Vec<&RawTweet> = match &raw.data {
            Some(OneOrMany::Many(items)) => items.iter().collect(),
            Some(OneOrMany::One(item)) => vec![item],
            None if raw.top_level.id.is_some() => {
                tracing::debug!("Tweet returned without a data wrapper");
                vec![&raw.top_level]
            }
            None => Vec::new(),
        };

        items
            .into_iter()
            .filter_map(|item| Self::normalize_item(item, &authors))
            .collect()
    }

    /// Normalize a payload and pull out its continuation token.
    pub fn normalize_page(raw: &RawResponse) -> Page {
        Page {
            posts: Self::normalize(raw),
            next_token: raw
                .meta
                .as_ref()
                .and_then(|meta| meta.next_token.clone())
                .filter(|token| !token.is_empty()),
        }
    }

    /// Normalize a user lookup; `None` when the provider returned no data.
    pub fn normalize_user(raw: &RawUserResponse) -> Option<User> {
        let user = raw.data.as_ref()?;
        let Some(id) = user.id.clone() else {
            tracing::debug!("User record missing id, treating as not found");
            return None;
        };
        let metrics = user.public_metrics.clone().unwrap_or_default();

        Some(User {
            id,
            username: user.username.clone().unwrap_or_default(),
            name: user.name.clone().unwrap_or_default(),
            description: user.description.clone(),
            created_at: user.created_at.as_deref().and_then(parse_timestamp),
            followers: metrics.followers_count.unwrap_or(0),
            following: metrics.following_count.unwrap_or(0),
            tweets: metrics.tweet_count.unwrap_or(0),
            listed: metrics.listed_count.unwrap_or(0),
        })
    }

    fn normalize_item(item: &RawTweet, authors: &HashMap<&str, &RawUser>) -> Option<Post> {
        let Some(id) = item.id.clone() else {
            tracing::debug!("Tweet missing id, skipping");
            return None;
        };

        let author_id = item.author_id.clone().unwrap_or_default();
        let author = authors.get(author_id.as_str());
        let username = author
            .and_then(|u| u.username.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let display_name = author
            .and_then(|u| u.name.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        let (urls, mentions, hashtags) = extract_entities(item.entities.as_ref());

        Some(Post {
            conversation_id: item.conversation_id.clone().unwrap_or_else(|| id.clone()),
            id,
            text: item.text.clone().unwrap_or_default(),
            author_id,
            username,
            display_name,
            created_at: item.created_at.as_deref().and_then(parse_timestamp),
            metrics: extract_metrics(item.public_metrics.as_ref()),
            urls,
            mentions,
            hashtags,
        })
    }
}

fn extract_metrics(raw: Option<&RawTweetMetrics>) -> Metrics {
    let Some(m) = raw else {
        return Metrics::default();
    };
    Metrics {
        likes: m.like_count.unwrap_or(0),
        reshares: m.retweet_count.unwrap_or(0),
        replies: m.reply_count.unwrap_or(0),
        quotes: m.quote_count.unwrap_or(0),
        impressions: m.impression_count.unwrap_or(0),
        bookmarks: m.bookmark_count.unwrap_or(0),
    }
}

fn extract_entities(raw: Option<&RawEntities>) -> (Vec<String>, Vec<String>, Vec<String>) {
    let Some(entities) = raw else {
        return (Vec::new(), Vec::new(), Vec::new());
    };

    let urls = entities
        .urls
        .iter()
        .flatten()
        .filter_map(|u| u.expanded_url.clone())
        .collect();
    let mentions = entities
        .mentions
        .iter()
        .flatten()
        .filter_map(|m| m.username.clone())
        .collect();
    let hashtags = entities
        .hashtags
        .iter()
        .flatten()
        .filter_map(|h| h.tag.clone())
        .collect();

    (urls, mentions, hashtags)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(value, error = %e, "Unparsable timestamp");
            None
        }
    }
}
