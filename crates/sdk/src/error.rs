//! Error types for the Strava SDK.

use serde::{Deserialize, Serialize};
use strava_mcp_core::ApiError;

/// Result type for SDK operations.
pub type StravaResult<T> = Result<T, StravaError>;

/// Message returned to callers whenever authentication fails. Details only go to the logs.
pub const AUTH_FAILED_MESSAGE: &str = "Failed to authenticate with Strava. Check server logs.";

/// Error types that can occur when using the Strava SDK.
#[derive(Debug, thiserror::Error)]
pub enum StravaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Connection timeout.
    #[error("Request timed out")]
    Timeout,

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl StravaError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Create an error from a non-success status code and response body.
    pub fn from_response(status: u16, body: &str, retry_after_secs: Option<u64>) -> Self {
        let (message, details) = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(response) => {
                let details = if response.errors.is_empty() {
                    None
                } else {
                    Some(
                        response
                            .errors
                            .iter()
                            .map(|e| e.to_string())
                            .collect::<Vec<_>>()
                            .join("; "),
                    )
                };
                (response.message, details)
            }
            Err(_) => (body.to_string(), None),
        };

        match status {
            401 | 403 => Self::Authentication(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited { retry_after_secs },
            _ => Self::Api {
                status,
                message,
                details,
            },
        }
    }
}

impl From<StravaError> for ApiError {
    fn from(err: StravaError) -> Self {
        match err {
            // Credential problems never carry their details past this point
            StravaError::Authentication(_) => ApiError::Authentication(AUTH_FAILED_MESSAGE.to_string()),
            StravaError::NotFound(message) => ApiError::NotFound(message),
            StravaError::RateLimited { retry_after_secs } => ApiError::RateLimited { retry_after_secs },
            StravaError::InvalidInput(message) => ApiError::InvalidInput(message),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

/// Error body returned by the Strava API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

/// One entry of the `errors` array of a Strava error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub code: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.resource, self.field, self.code)
    }
}
