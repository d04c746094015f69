//! Multi-page recent search.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::client::{XClient, TWEET_FIELDS};
use super::normalizer::Normalizer;
use super::raw::RawResponse;
use super::types::Post;
use crate::error::XResult;

/// Provider bounds for `max_results` on recent search.
pub const MIN_RESULTS_PER_PAGE: u32 = 10;
pub const MAX_RESULTS_PER_PAGE: u32 = 100;

static SHORTHAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(m|h|d)$").expect("Invalid since shorthand pattern"));

/// Result ordering requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Provider relevance ranking.
    #[default]
    Relevancy,
    /// Newest first.
    Recency,
}

impl SortOrder {
    /// Wire value for `sort_order`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevancy => "relevancy",
            Self::Recency => "recency",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`Paginator::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Results per page, clamped to [10, 100].
    pub max_results: u32,
    /// Max pages to fetch.
    pub pages: u32,
    /// Result ordering.
    pub sort_order: SortOrder,
    /// ISO 8601 timestamp or shorthand like "30m", "2h", "1d".
    pub since: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS_PER_PAGE,
            pages: 1,
            sort_order: SortOrder::Relevancy,
            since: None,
        }
    }
}

impl SearchOptions {
    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = pages;
        self
    }

    #[must_use]
    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    #[must_use]
    pub fn with_since(mut self, since: impl Into<String>) -> Self {
        self.since = Some(since.into());
        self
    }

    /// `max_results` within provider bounds.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.max_results.clamp(MIN_RESULTS_PER_PAGE, MAX_RESULTS_PER_PAGE)
    }

    /// Page budget; zero means one page.
    #[must_use]
    pub fn page_budget(&self) -> u32 {
        self.pages.max(1)
    }

    /// Stable disambiguator for caching results of these options.
    #[must_use]
    pub fn cache_params(&self) -> String {
        format!(
            "max={}&pages={}&sort={}&since={}",
            self.page_size(),
            self.page_budget(),
            self.sort_order,
            self.since.as_deref().unwrap_or_default()
        )
    }
}

/// Resolve a `since` value to an absolute start time.
///
/// Shorthand (`<n>m`, `<n>h`, `<n>d`) is subtracted from `now`. Values that
/// look like dates are parsed as RFC 3339, a naive UTC datetime, or a bare
/// date at midnight UTC. Anything else yields `None`.
pub fn parse_since(since: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let since = since.trim();

    if let Some(caps) = SHORTHAND.captures(since) {
        let amount: i64 = caps[1].parse().ok()?;
        let delta = match &caps[2] {
            "m" => TimeDelta::try_minutes(amount)?,
            "h" => TimeDelta::try_hours(amount)?,
            _ => TimeDelta::try_days(amount)?,
        };
        return now.checked_sub_signed(delta);
    }

    if since.contains('T') || since.contains('-') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(since) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(since, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        if let Ok(date) = NaiveDate::parse_from_str(since, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Canonical `start_time` rendering, e.g. `2026-01-15T10:30:00.000Z`.
#[must_use]
pub fn format_start_time(start: DateTime<Utc>) -> String {
    start.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Drives recent search across pages, following continuation tokens.
#[derive(Debug, Clone)]
pub struct Paginator {
    client: XClient,
    page_delay: Duration,
}

impl Paginator {
    /// Create a paginator that pauses `page_delay` between pages.
    #[must_use]
    pub fn new(client: XClient, page_delay: Duration) -> Self {
        Self { client, page_delay }
    }

    /// The underlying HTTP client.
    #[must_use]
    pub fn client(&self) -> &XClient {
        &self.client
    }

    /// Pause applied between consecutive requests.
    #[must_use]
    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }

    /// Build the encoded recent-search URL for one page.
    #[must_use]
    pub fn search_url(
        &self,
        query: &str,
        options: &SearchOptions,
        start_time: Option<&str>,
        pagination_token: Option<&str>,
    ) -> String {
        let mut url = format!(
            "{}?query={}&max_results={}&{}&sort_order={}",
            self.client.endpoint("tweets/search/recent"),
            urlencoding::encode(query),
            options.page_size(),
            TWEET_FIELDS,
            options.sort_order,
        );
        if let Some(start) = start_time {
            url.push_str("&start_time=");
            url.push_str(&urlencoding::encode(start));
        }
        if let Some(token) = pagination_token {
            url.push_str("&pagination_token=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    /// Search recent posts (last 7 days).
    ///
    /// Pages are fetched strictly in sequence and concatenated in fetch
    /// order. Stops early when the provider returns no continuation token.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> XResult<Vec<Post>> {
        let start_time = options.since.as_deref().and_then(|since| {
            let resolved = parse_since(since, Utc::now()).map(format_start_time);
            if resolved.is_none() {
                tracing::debug!(since, "Ignoring unparsable since value");
            }
            resolved
        });

        let pages = options.page_budget();
        let mut posts = Vec::new();
        let mut next_token: Option<String> = None;

        for page in 0..pages {
            let url = self.search_url(query, options, start_time.as_deref(), next_token.as_deref());
            let raw: RawResponse = self.client.get(&url).await?;
            let normalized = Normalizer::normalize_page(&raw);

            tracing::debug!(
                page = page + 1,
                count = normalized.posts.len(),
                has_more = normalized.next_token.is_some(),
                "Fetched search page"
            );

            posts.extend(normalized.posts);
            next_token = normalized.next_token;

            if next_token.is_none() {
                break;
            }
            if page + 1 < pages {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        tracing::info!(query, count = posts.len(), "Search complete");
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BearerToken, ClientConfig};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_shorthand_hours_and_days() {
        let now = now();
        let two_hours = parse_since("2h", now).unwrap();
        assert_eq!((now - two_hours).num_milliseconds(), 7_200_000);

        let one_day = parse_since("1d", now).unwrap();
        assert_eq!((now - one_day).num_milliseconds(), 86_400_000);

        let minutes = parse_since("15m", now).unwrap();
        assert_eq!((now - minutes).num_milliseconds(), 900_000);
    }

    #[test]
    fn test_iso_passes_through_canonically() {
        let parsed = parse_since("2026-03-01T08:30:00Z", now()).unwrap();
        assert_eq!(format_start_time(parsed), "2026-03-01T08:30:00.000Z");

        let offset = parse_since("2026-03-01T10:30:00+02:00", now()).unwrap();
        assert_eq!(format_start_time(offset), "2026-03-01T08:30:00.000Z");

        let date_only = parse_since("2026-03-01", now()).unwrap();
        assert_eq!(format_start_time(date_only), "2026-03-01T00:00:00.000Z");
    }

    #[test]
    fn test_unparsable_since_is_none() {
        assert!(parse_since("yesterday", now()).is_none());
        assert!(parse_since("2w", now()).is_none());
        assert!(parse_since("not-a-date", now()).is_none());
        assert!(parse_since("99999999999999999999d", now()).is_none());
    }

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(SearchOptions::default().with_max_results(3).page_size(), 10);
        assert_eq!(SearchOptions::default().with_max_results(500).page_size(), 100);
        assert_eq!(SearchOptions::default().with_max_results(42).page_size(), 42);
        assert_eq!(SearchOptions::default().with_pages(0).page_budget(), 1);
    }

    #[test]
    fn test_cache_params_distinguish_options() {
        let base = SearchOptions::default();
        let recency = base.clone().with_sort_order(SortOrder::Recency);
        assert_ne!(base.cache_params(), recency.cache_params());
        assert_eq!(base.cache_params(), "max=100&pages=1&sort=relevancy&since=");
    }

    #[test]
    fn test_search_url_encoding() {
        let config = ClientConfig::new(BearerToken::new("t")).with_api_url("https://api.x.com");
        let paginator = Paginator::new(XClient::new(&config).unwrap(), Duration::ZERO);
        let options = SearchOptions::default()
            .with_max_results(10)
            .with_sort_order(SortOrder::Recency);

        let url = paginator.search_url(
            "from:ferris -is:retweet",
            &options,
            Some("2026-03-01T00:00:00.000Z"),
            Some("next+1"),
        );

        assert!(url.starts_with(
            "https://api.x.com/2/tweets/search/recent?query=from%3Aferris%20-is%3Aretweet&max_results=10&tweet.fields="
        ));
        assert!(url.contains("&expansions=author_id&"));
        assert!(url.contains("&sort_order=recency"));
        assert!(url.contains("&start_time=2026-03-01T00%3A00%3A00.000Z"));
        assert!(url.ends_with("&pagination_token=next%2B1"));
    }
}
