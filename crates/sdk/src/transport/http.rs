//! HTTP transport layer for the Strava SDK.

use crate::auth::TokenManager;
use crate::config::ClientConfig;
use crate::error::{StravaError, StravaResult};
use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP transport for making authenticated API requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
    auth: Arc<TokenManager>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> StravaResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("strava-mcp/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        let auth = Arc::new(TokenManager::new(
            client.clone(),
            config.token_url.clone(),
            config.credentials.clone(),
        ));

        Ok(Self {
            client,
            config,
            auth,
        })
    }

    /// Build a URL for the given path, relative to the API base.
    fn build_url(&self, path: &str) -> StravaResult<url::Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(StravaError::InvalidUrl)
    }

    /// Execute an authenticated GET with retries.
    ///
    /// A 401 invalidates the cached token and is retried once with a fresh one.
    async fn execute_with_retry<Q>(&self, url: url::Url, query: &Q) -> StravaResult<Response>
    where
        Q: Serialize + ?Sized,
    {
        let retry_config = &self.config.retry_config;
        let mut attempts = 0;
        let mut reauthenticated = false;

        loop {
            let token = self.auth.access_token().await?;
            let request = self.client.get(url.clone()).bearer_auth(token).query(query);

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    if status == 401 && !reauthenticated {
                        warn!("Access token rejected, refreshing");
                        self.auth.invalidate().await;
                        reauthenticated = true;
                        continue;
                    }

                    let retry_after = retry_after_secs(&response);

                    if attempts < retry_config.max_retries
                        && retry_config.should_retry_status(status)
                    {
                        let backoff = retry_config.delay_for_attempt(attempts, retry_after);
                        warn!(
                            status = status,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(StravaError::from_response(status, &body, retry_after));
                }
                Err(e) => {
                    let err = if e.is_timeout() {
                        StravaError::Timeout
                    } else {
                        StravaError::Http(e)
                    };
                    if attempts < retry_config.max_retries && err.is_retryable() {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            error = %err,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> StravaResult<T> {
        self.get_with_query(path, &[] as &[(&str, String)]).await
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> StravaResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self.execute_with_retry(url, query).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, RetryConfig};
    use serde::Deserialize;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestResponse {
        message: String,
        value: i32,
    }

    fn create_config(server: &MockServer, retry_config: RetryConfig) -> Arc<ClientConfig> {
        Arc::new(ClientConfig {
            base_url: url::Url::parse(&format!("{}/api/v3/", server.uri())).unwrap(),
            token_url: url::Url::parse(&format!("{}/oauth/token", server.uri())).unwrap(),
            credentials: Credentials {
                client_id: Some("1".to_string()),
                client_secret: Some("secret".to_string()),
                refresh_token: Some("refresh".to_string()),
                access_token: None,
                expires_at: 0,
            },
            timeout: Duration::from_secs(5),
            retry_config,
        })
    }

    async fn mount_token(server: &MockServer, access_token: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": access_token,
                "refresh_token": "refresh",
                "expires_at": chrono::Utc::now().timestamp() + 21600
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let server = MockServer::start().await;
        mount_token(&server, "tok-1").await;

        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .and(header("Authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "hello",
                "value": 42
            })))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server, RetryConfig::no_retry())).unwrap();
        let result: TestResponse = transport.get("athlete").await.unwrap();
        assert_eq!(result.message, "hello");
        assert_eq!(result.value, 42);
    }

    #[tokio::test]
    async fn test_get_with_query() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/api/v3/athlete/activities"))
            .and(query_param("per_page", "10"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "page",
                "value": 2
            })))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server, RetryConfig::no_retry())).unwrap();
        let query = [("per_page", "10".to_string()), ("page", "2".to_string())];
        let result: TestResponse = transport
            .get_with_query("/athlete/activities", &query)
            .await
            .unwrap();
        assert_eq!(result.value, 2);
    }

    #[tokio::test]
    async fn test_not_found_maps_to_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/api/v3/activities/1"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"message":"Record Not Found","errors":[]}"#),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server, RetryConfig::no_retry())).unwrap();
        let result: StravaResult<TestResponse> = transport.get("activities/1").await;
        assert!(matches!(result, Err(StravaError::NotFound(m)) if m == "Record Not Found"));
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "recovered",
                "value": 1
            })))
            .mount(&server)
            .await;

        let retry = RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        let transport = HttpTransport::new(create_config(&server, retry)).unwrap();
        let result: TestResponse = transport.get("athlete").await.unwrap();
        assert_eq!(result.message, "recovered");
    }

    #[tokio::test]
    async fn test_rate_limit_waits_for_retry_after() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "after limit",
                "value": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        // Exponential backoff alone would wait 1ms
        let retry = RetryConfig {
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        let transport = HttpTransport::new(create_config(&server, retry)).unwrap();

        let started = std::time::Instant::now();
        let result: TestResponse = transport.get("athlete").await.unwrap();
        assert_eq!(result.message, "after limit");
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rate_limit_without_retries_left() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "15"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server, RetryConfig::no_retry())).unwrap();
        let result: StravaResult<TestResponse> = transport.get("athlete").await;
        assert!(matches!(
            result,
            Err(StravaError::RateLimited { retry_after_secs: Some(15) })
        ));
    }

    #[tokio::test]
    async fn test_rejected_token_is_refreshed_once() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "ok",
                "value": 7
            })))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server, RetryConfig::no_retry())).unwrap();
        let result: TestResponse = transport.get("athlete").await.unwrap();
        assert_eq!(result.value, 7);
    }

    #[tokio::test]
    async fn test_persistent_unauthorized_is_authentication_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"message":"Authorization Error","errors":[]}"#),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server, RetryConfig::no_retry())).unwrap();
        let result: StravaResult<TestResponse> = transport.get("athlete").await;
        assert!(matches!(result, Err(StravaError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_build_url_keeps_api_prefix() {
        let server = MockServer::start().await;
        let transport = HttpTransport::new(create_config(&server, RetryConfig::no_retry())).unwrap();

        let url = transport.build_url("/activities/5/laps").unwrap();
        assert_eq!(url.path(), "/api/v3/activities/5/laps");
    }
}
