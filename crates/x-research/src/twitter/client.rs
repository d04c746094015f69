//! Authenticated X API v2 HTTP client.
//!
//! Classifies every response as success, rate-limited or error. Nothing here
//! retries: a 429 becomes [`XError::RateLimited`] carrying the wait hint.

use chrono::Utc;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::{BearerToken, ClientConfig};
use crate::error::{XError, XResult};

/// Field selection sent with every tweet search and lookup.
pub const TWEET_FIELDS: &str = "tweet.fields=created_at,public_metrics,author_id,conversation_id,entities&expansions=author_id&user.fields=username,name,public_metrics";

/// Field selection for user lookups.
pub const USER_FIELDS: &str = "user.fields=public_metrics,description,created_at";

/// Rate limit information from X API headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests allowed in the window
    pub limit: Option<u32>,
    /// Requests left in the window
    pub remaining: Option<u32>,
    /// Unix timestamp when the window resets
    pub reset: Option<i64>,
}

impl RateLimitInfo {
    /// Parse rate limit info from response headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        }

        Self {
            limit: header(headers, "x-rate-limit-limit"),
            remaining: header(headers, "x-rate-limit-remaining"),
            reset: header(headers, "x-rate-limit-reset"),
        }
    }

    /// Seconds until the window resets, never less than 1.
    #[must_use]
    pub fn wait_secs(&self, now_unix: i64) -> Option<u64> {
        self.reset
            .map(|reset| reset.saturating_sub(now_unix).max(1) as u64)
    }
}

/// X API REST client using app-only bearer auth.
#[derive(Debug, Clone)]
pub struct XClient {
    client: Client,
    base_url: String,
    token: BearerToken,
    rate_limit_fallback_secs: u64,
    error_excerpt_chars: usize,
}

impl XClient {
    /// Create a new client from configuration.
    pub fn new(config: &ClientConfig) -> XResult<Self> {
        let client = Client::builder()
            .user_agent(format!("x-research/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.bearer_token.clone(),
            rate_limit_fallback_secs: config.rate_limit_fallback_secs,
            error_excerpt_chars: config.error_excerpt_chars,
        })
    }

    /// Absolute URL for a v2 path such as `tweets/search/recent`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/2/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Single-post lookup URL with the standard field selection.
    #[must_use]
    pub fn tweet_url(&self, id: &str) -> String {
        format!(
            "{}?{}",
            self.endpoint(&format!("tweets/{}", urlencoding::encode(id))),
            TWEET_FIELDS
        )
    }

    /// By-username user lookup URL.
    #[must_use]
    pub fn user_by_username_url(&self, username: &str) -> String {
        format!(
            "{}?{}",
            self.endpoint(&format!("users/by/username/{}", urlencoding::encode(username))),
            USER_FIELDS
        )
    }

    /// Make an authenticated GET request and decode the raw payload.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> XResult<T> {
        tracing::debug!(url = %url, "GET request");

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token.expose()))
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> XResult<T> {
        let status = response.status();
        let rate_limit = RateLimitInfo::from_headers(response.headers());
        tracing::debug!(
            status = status.as_u16(),
            limit = ?rate_limit.limit,
            remaining = ?rate_limit.remaining,
            reset = ?rate_limit.reset,
            "X API response"
        );

        if status == StatusCode::TOO_MANY_REQUESTS {
            let wait_secs = rate_limit
                .wait_secs(Utc::now().timestamp())
                .unwrap_or(self.rate_limit_fallback_secs);
            tracing::warn!(wait_secs, "Rate limited by X API");
            return Err(XError::RateLimited { wait_secs });
        }

        let body = response.text().await?;

        if !status.is_success() {
            let body = excerpt(&body, self.error_excerpt_chars);
            tracing::warn!(status = status.as_u16(), body = %body, "X API request failed");
            return Err(XError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse X API response");
            XError::Json(e)
        })
    }
}

/// First `max_chars` characters of `body`.
fn excerpt(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::raw::RawResponse;
    use reqwest::header::HeaderValue;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    async fn test_client(mock_server: &MockServer) -> XClient {
        let config = ClientConfig::new(BearerToken::new("test_bearer_token"))
            .with_api_url(mock_server.uri());
        XClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_sends_bearer_and_returns_raw_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2/tweets/123"))
            .and(header("Authorization", "Bearer test_bearer_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"id": "123", "text": "hello"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server).await;
        let raw: RawResponse = client.get(&client.endpoint("tweets/123")).await.unwrap();
        assert!(raw.data.is_some());
    }

    #[tokio::test]
    async fn test_rate_limited_uses_reset_header() {
        let mock_server = MockServer::start().await;
        let reset = Utc::now().timestamp() + 120;

        Mock::given(method("GET"))
            .and(path("/2/tweets/search/recent"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("x-rate-limit-reset", reset.to_string()),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server).await;
        let err = client
            .get::<RawResponse>(&client.endpoint("tweets/search/recent"))
            .await
            .unwrap_err();

        match err {
            XError::RateLimited { wait_secs } => assert!((110..=120).contains(&wait_secs)),
            other => panic!("expected rate limit, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limited_without_header_falls_back() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server).await;
        let err = client
            .get::<RawResponse>(&client.endpoint("tweets/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, XError::RateLimited { wait_secs: 60 }));
    }

    #[tokio::test]
    async fn test_api_error_body_is_truncated() {
        let mock_server = MockServer::start().await;
        let long_body = "x".repeat(500);

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string(long_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server).await;
        let err = client
            .get::<RawResponse>(&client.endpoint("tweets/1"))
            .await
            .unwrap_err();

        match err {
            XError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body.chars().count(), 200);
            }
            other => panic!("expected api error, got {other}"),
        }
    }

    #[test]
    fn test_wait_secs_floor() {
        let info = RateLimitInfo {
            reset: Some(1_000),
            ..Default::default()
        };
        assert_eq!(info.wait_secs(900), Some(100));
        assert_eq!(info.wait_secs(5_000), Some(1));
        assert_eq!(RateLimitInfo::default().wait_secs(0), None);
    }

    #[test]
    fn test_wait_secs_extreme_reset() {
        let info = RateLimitInfo {
            reset: Some(i64::MIN),
            ..Default::default()
        };
        assert_eq!(info.wait_secs(1_700_000_000), Some(1));

        let far_future = RateLimitInfo {
            reset: Some(i64::MAX),
            ..Default::default()
        };
        assert_eq!(far_future.wait_secs(-5), Some(i64::MAX as u64));
    }

    #[tokio::test]
    async fn test_rate_limited_with_extreme_reset_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("x-rate-limit-reset", i64::MIN.to_string()),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server).await;
        let err = client
            .get::<RawResponse>(&client.endpoint("tweets/search/recent"))
            .await
            .unwrap_err();
        assert!(matches!(err, XError::RateLimited { wait_secs: 1 }));
    }

    #[test]
    fn test_rate_limit_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-limit", HeaderValue::from_static("450"));
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("not-a-number"));

        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(info.limit, Some(450));
        assert_eq!(info.remaining, Some(0));
        assert_eq!(info.reset, None);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo wörld", 4), "héll");
        assert_eq!(excerpt("short", 200), "short");
    }

    #[test]
    fn test_lookup_urls() {
        let config = ClientConfig::new(BearerToken::new("t")).with_api_url("https://api.x.com");
        let client = XClient::new(&config).unwrap();

        assert_eq!(
            client.tweet_url("123"),
            format!("https://api.x.com/2/tweets/123?{TWEET_FIELDS}")
        );
        assert_eq!(
            client.user_by_username_url("ferris"),
            "https://api.x.com/2/users/by/username/ferris?user.fields=public_metrics,description,created_at"
        );
        assert!(client
            .user_by_username_url("a b")
            .starts_with("https://api.x.com/2/users/by/username/a%20b?"));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ClientConfig::new(BearerToken::new("t")).with_api_url("https://api.x.com/");
        let client = XClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("/users/by/username/ferris"),
            "https://api.x.com/2/users/by/username/ferris"
        );
    }
}
