//! Configuration types for the Strava SDK.

use std::fmt;
use std::time::Duration;
use url::Url;

/// Default base URL of the Strava v3 API.
pub const DEFAULT_BASE_URL: &str = "https://www.strava.com/api/v3/";

/// Default OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://www.strava.com/oauth/token";

/// Configuration for the Strava client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API. Always ends with a slash so relative paths join below it.
    pub base_url: Url,
    /// OAuth token endpoint used for the refresh-token grant.
    pub token_url: Url,
    /// Application credentials and tokens.
    pub credentials: Credentials,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry_config: RetryConfig,
}

impl ClientConfig {
    /// Create a new configuration for the given API and token endpoints.
    pub fn new(base_url: Url, token_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            token_url,
            credentials: Credentials::default(),
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }
}

/// `Url::join` replaces the last path segment unless the base ends with `/`.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// OAuth application credentials plus the tokens issued for the athlete.
#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// Pre-issued access token, used until `expires_at`.
    pub access_token: Option<String>,
    /// Expiry of `access_token` as Unix seconds.
    pub expires_at: i64,
}

impl Credentials {
    /// True when a refresh-token grant can be performed.
    pub fn can_refresh(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }
}

// Secrets never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// HTTP status codes to retry on.
    pub retry_on_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            retry_on_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate backoff duration for a given attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }

    /// Delay before the next attempt, honoring a server supplied `Retry-After`
    /// as long as it stays under `max_backoff`.
    pub fn delay_for_attempt(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        match retry_after_secs {
            Some(secs) => std::cmp::min(Duration::from_secs(secs), self.max_backoff),
            None => self.backoff_for_attempt(attempt),
        }
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status_codes.contains(&status)
    }
}
