//! Client configuration and bearer credential resolution.
//!
//! Credentials are resolved once, up front, and handed to [`crate::XClient`]
//! inside a [`ClientConfig`]. Resolution order:
//!
//! 1. an explicit token (e.g. from a CLI flag)
//! 2. the `X_BEARER_TOKEN` environment variable
//! 3. a fallback env-style file, `$HOME/.config/env/global.env` by default

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{XError, XResult};

/// Environment variable holding the bearer token.
pub const TOKEN_ENV_VAR: &str = "X_BEARER_TOKEN";

/// Default X API host.
pub const DEFAULT_API_URL: &str = "https://api.x.com";

/// Opaque bearer credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Resolve a token from the default sources.
    pub fn resolve() -> XResult<Self> {
        CredentialSources::default().resolve()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Where to look for a bearer token, in order.
#[derive(Debug, Clone)]
pub struct CredentialSources {
    /// Value supplied directly by the caller.
    pub explicit: Option<String>,
    /// Environment variable to consult.
    pub env_var: String,
    /// Env-style file to consult last.
    pub fallback_file: Option<PathBuf>,
}

impl Default for CredentialSources {
    fn default() -> Self {
        Self {
            explicit: None,
            env_var: TOKEN_ENV_VAR.to_string(),
            fallback_file: default_env_file(),
        }
    }
}

impl CredentialSources {
    /// Use an explicit token ahead of the other sources.
    #[must_use]
    pub fn with_explicit(mut self, token: impl Into<String>) -> Self {
        self.explicit = Some(token.into());
        self
    }

    /// Override the fallback file.
    #[must_use]
    pub fn with_fallback_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_file = Some(path.into());
        self
    }

    /// Walk the sources and return the first non-empty token.
    pub fn resolve(&self) -> XResult<BearerToken> {
        if let Some(token) = self.explicit.as_deref().and_then(non_empty) {
            tracing::debug!("Using explicitly supplied bearer token");
            return Ok(BearerToken::new(token));
        }

        if let Some(token) = std::env::var(&self.env_var).ok().as_deref().and_then(non_empty) {
            tracing::debug!(var = %self.env_var, "Using bearer token from environment");
            return Ok(BearerToken::new(token));
        }

        if let Some(path) = &self.fallback_file {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    if let Some(token) = token_from_env_file(&content, &self.env_var) {
                        tracing::debug!(path = %path.display(), "Using bearer token from file");
                        return Ok(BearerToken::new(token));
                    }
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Credential file unreadable");
                }
            }
        }

        Err(XError::CredentialMissing {
            searched: self.describe(),
        })
    }

    fn describe(&self) -> String {
        let mut searched = vec![format!("env {}", self.env_var)];
        if let Some(path) = &self.fallback_file {
            searched.push(path.display().to_string());
        }
        searched.join(", ")
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn default_env_file() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| Path::new(&home).join(".config").join("env").join("global.env"))
}

/// Pull `VAR=value` out of an env-style file. A file holding nothing but a
/// single token is accepted as-is.
fn token_from_env_file(content: &str, var: &str) -> Option<String> {
    let pattern = format!(
        r#"(?m)^\s*(?:export\s+)?{}\s*=\s*["']?([^"'\n]+)"#,
        regex::escape(var)
    );
    let re = Regex::new(&pattern).ok()?;
    if let Some(caps) = re.captures(content) {
        return caps.get(1).and_then(|m| non_empty(m.as_str()));
    }

    let trimmed = content.trim();
    if !trimmed.is_empty() && !trimmed.contains(char::is_whitespace) && !trimmed.contains('=') {
        return Some(trimmed.to_string());
    }
    None
}

/// Configuration for [`crate::XClient`] and the paginator built on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Bearer credential sent on every request
    pub bearer_token: BearerToken,

    /// API host (default: https://api.x.com)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Pause between consecutive requests of one operation
    #[serde(default = "default_page_delay", with = "duration_millis")]
    pub page_delay: Duration,

    /// Wait hint used when a 429 carries no reset header
    #[serde(default = "default_rate_limit_fallback_secs")]
    pub rate_limit_fallback_secs: u64,

    /// Max characters of an error body kept for diagnostics
    #[serde(default = "default_error_excerpt_chars")]
    pub error_excerpt_chars: usize,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// 450 requests / 15 minutes
fn default_page_delay() -> Duration {
    Duration::from_millis(350)
}

fn default_rate_limit_fallback_secs() -> u64 {
    60
}

fn default_error_excerpt_chars() -> usize {
    200
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl ClientConfig {
    /// Config with default endpoints and pacing.
    #[must_use]
    pub fn new(bearer_token: BearerToken) -> Self {
        Self {
            bearer_token,
            api_url: default_api_url(),
            page_delay: default_page_delay(),
            rate_limit_fallback_secs: default_rate_limit_fallback_secs(),
            error_excerpt_chars: default_error_excerpt_chars(),
        }
    }

    /// Resolve the token from the default sources and build a config.
    pub fn from_env() -> XResult<Self> {
        Ok(Self::new(BearerToken::resolve()?))
    }

    /// Point the client at another host (mock servers, proxies).
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Override the inter-request pause.
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const UNSET_VAR: &str = "X_RESEARCH_TEST_TOKEN_NEVER_SET";

    fn sources(file: Option<PathBuf>) -> CredentialSources {
        CredentialSources {
            explicit: None,
            env_var: UNSET_VAR.to_string(),
            fallback_file: file,
        }
    }

    #[test]
    fn test_explicit_token_wins() {
        let token = sources(None).with_explicit("abc").resolve().unwrap();
        assert_eq!(token.expose(), "abc");
    }

    #[test]
    fn test_blank_explicit_token_is_ignored() {
        let err = sources(None).with_explicit("   ").resolve().unwrap_err();
        assert!(matches!(err, XError::CredentialMissing { .. }));
    }

    #[test]
    fn test_token_from_fallback_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("global.env");
        std::fs::write(
            &path,
            format!("OTHER=1\nexport {UNSET_VAR}=\"from-file\"\n"),
        )
        .unwrap();

        let token = sources(Some(path)).resolve().unwrap();
        assert_eq!(token.expose(), "from-file");
    }

    #[test]
    fn test_bare_token_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x_bearer_token");
        std::fs::write(&path, "AAAA%2Fbare\n").unwrap();

        let token = sources(Some(path)).resolve().unwrap();
        assert_eq!(token.expose(), "AAAA%2Fbare");
    }

    #[test]
    fn test_missing_everywhere() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.env");

        let err = sources(Some(path.clone())).resolve().unwrap_err();
        match err {
            XError::CredentialMissing { searched } => {
                assert!(searched.contains(UNSET_VAR));
                assert!(searched.contains(&path.display().to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = BearerToken::new("secret-value");
        assert!(!format!("{token:?}").contains("secret-value"));
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"bearer_token": "t"}"#).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.page_delay, Duration::from_millis(350));
        assert_eq!(config.rate_limit_fallback_secs, 60);
        assert_eq!(config.error_excerpt_chars, 200);
    }
}
