//! OAuth access-token management.
//!
//! Strava access tokens live for six hours. The manager hands out the cached
//! token and performs the refresh-token grant once the token is within
//! [`REFRESH_BUFFER_SECS`] of expiring. Strava rotates refresh tokens, so the
//! one returned by each grant replaces the previous one.

use crate::config::Credentials;
use crate::error::{StravaError, StravaResult, AUTH_FAILED_MESSAGE};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{error, info};
use url::Url;

/// Refresh this many seconds before the token actually expires.
pub const REFRESH_BUFFER_SECS: i64 = 300;

/// Successful response of the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_at: i64,
}

/// Caches the access token and refreshes it when needed.
#[derive(Debug)]
pub struct TokenManager {
    http: Client,
    token_url: Url,
    // Held across the refresh so concurrent callers wait for a single grant
    state: Mutex<Credentials>,
}

impl TokenManager {
    pub fn new(http: Client, token_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            token_url,
            state: Mutex::new(credentials),
        }
    }

    /// Return a valid access token, refreshing it first if it is about to expire.
    ///
    /// Failures are logged in full and reported with a generic message.
    pub async fn access_token(&self) -> StravaResult<String> {
        let mut state = self.state.lock().await;

        if let Some(token) = &state.access_token {
            if !needs_refresh(state.expires_at, Utc::now().timestamp()) {
                return Ok(token.clone());
            }
        }

        match self.refresh(&mut state).await {
            Ok(token) => Ok(token),
            Err(e) => {
                error!(error = %e, "Auth error while refreshing Strava access token");
                Err(StravaError::Authentication(AUTH_FAILED_MESSAGE.to_string()))
            }
        }
    }

    /// Forget the cached token so the next call performs a refresh.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.expires_at = 0;
    }

    async fn refresh(&self, state: &mut Credentials) -> StravaResult<String> {
        if !state.can_refresh() {
            return Err(StravaError::Config(
                "STRAVA_CLIENT_ID, STRAVA_CLIENT_SECRET and STRAVA_REFRESH_TOKEN must be set"
                    .to_string(),
            ));
        }

        info!("Refreshing Strava access token");

        let params = [
            ("client_id", state.client_id.as_deref().unwrap_or_default()),
            ("client_secret", state.client_secret.as_deref().unwrap_or_default()),
            ("grant_type", "refresh_token"),
            ("refresh_token", state.refresh_token.as_deref().unwrap_or_default()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StravaError::from_response(status.as_u16(), &body, None));
        }

        let token: TokenResponse = response.json().await?;

        state.access_token = Some(token.access_token.clone());
        if let Some(rotated) = token.refresh_token {
            state.refresh_token = Some(rotated);
        }
        state.expires_at = token.expires_at;

        info!(expires_at = token.expires_at, "Token refreshed successfully");
        Ok(token.access_token)
    }
}

fn needs_refresh(expires_at: i64, now: i64) -> bool {
    now > expires_at - REFRESH_BUFFER_SECS
}
