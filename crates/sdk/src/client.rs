//! Main client for the Strava SDK.

use crate::api::*;
use crate::config::{ClientConfig, Credentials, RetryConfig, DEFAULT_BASE_URL, DEFAULT_TOKEN_URL};
use crate::error::{StravaError, StravaResult};
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use strava_mcp_core::api::{ApiResult, StravaApi};
use strava_mcp_core::types::{
    Activity, ActivityQuery, Athlete, AthleteStats, Lap, StreamResolution, StreamSet, StreamType,
};
use url::Url;

/// Main client for the Strava API.
#[derive(Clone)]
pub struct StravaClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl StravaClient {
    /// Create a new client builder.
    pub fn builder() -> StravaClientBuilder {
        StravaClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> StravaResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the athletes API.
    pub fn athletes(&self) -> AthletesApi<'_> {
        AthletesApi::new(self)
    }

    /// Get the activities API.
    pub fn activities(&self) -> ActivitiesApi<'_> {
        ActivitiesApi::new(self)
    }

    /// Get the streams API.
    pub fn streams(&self) -> StreamsApi<'_> {
        StreamsApi::new(self)
    }
}

#[async_trait::async_trait]
impl StravaApi for StravaClient {
    async fn get_athlete(&self) -> ApiResult<Athlete> {
        Ok(self.athletes().current().await?)
    }

    async fn get_athlete_stats(&self, athlete_id: u64) -> ApiResult<AthleteStats> {
        Ok(self.athletes().stats(athlete_id).await?)
    }

    async fn get_activities(&self, query: &ActivityQuery) -> ApiResult<Vec<Activity>> {
        Ok(self.activities().list(query).await?)
    }

    async fn get_activity(&self, activity_id: u64) -> ApiResult<Activity> {
        Ok(self.activities().get(activity_id).await?)
    }

    async fn get_activity_laps(&self, activity_id: u64) -> ApiResult<Vec<Lap>> {
        Ok(self.activities().laps(activity_id).await?)
    }

    async fn get_activity_streams(
        &self,
        activity_id: u64,
        types: Option<&[StreamType]>,
        resolution: Option<StreamResolution>,
    ) -> ApiResult<StreamSet> {
        Ok(self.streams().get(activity_id, types, resolution).await?)
    }
}

/// Builder for creating a StravaClient.
pub struct StravaClientBuilder {
    base_url: Option<String>,
    token_url: Option<String>,
    credentials: Credentials,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl StravaClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            token_url: None,
            credentials: Credentials::default(),
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }

    /// Set the API base URL. Defaults to the public Strava v3 API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the OAuth token endpoint.
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Set the OAuth application client ID.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.credentials.client_id = Some(id.into());
        self
    }

    /// Set the OAuth application client secret.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.credentials.client_secret = Some(secret.into());
        self
    }

    /// Set the refresh token issued for the athlete.
    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.credentials.refresh_token = Some(token.into());
        self
    }

    /// Use an already issued access token until `expires_at` (Unix seconds).
    pub fn access_token(mut self, token: impl Into<String>, expires_at: i64) -> Self {
        self.credentials.access_token = Some(token.into());
        self.credentials.expires_at = expires_at;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> StravaResult<StravaClient> {
        let base_url = parse_http_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let token_url = parse_http_url(self.token_url.as_deref().unwrap_or(DEFAULT_TOKEN_URL))?;

        let mut config = ClientConfig::new(base_url, token_url);
        config.credentials = self.credentials;
        config.timeout = self.timeout;
        config.retry_config = self.retry_config;

        StravaClient::from_config(config)
    }
}

fn parse_http_url(raw: &str) -> StravaResult<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(StravaError::Config(format!(
            "Only HTTP/HTTPS URLs are supported, got: {}",
            other
        ))),
    }
}

impl Default for StravaClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
