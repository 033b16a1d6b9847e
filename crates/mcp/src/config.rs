// Server configuration: TOML file, then environment overrides

use crate::analysis::{AnalysisLimits, MAX_CODE_LEN_CEILING};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use strava_sdk::{RetryConfig, StravaClient};

pub const ENV_CLIENT_ID: &str = "STRAVA_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "STRAVA_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "STRAVA_REFRESH_TOKEN";
pub const ENV_API_BASE_URL: &str = "STRAVA_API_BASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub strava: StravaConfig,

    #[serde(default)]
    pub server: TransportConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StravaConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_base_url() -> String {
    strava_sdk::config::DEFAULT_BASE_URL.to_string()
}

fn default_token_url() -> String {
    strava_sdk::config::DEFAULT_TOKEN_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for StravaConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            refresh_token: None,
            api_base_url: default_api_base_url(),
            token_url: default_token_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

// Secrets never reach the logs
impl std::fmt::Debug for StravaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StravaConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl StravaConfig {
    /// Names of the credential settings that are missing or blank.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        [
            (ENV_CLIENT_ID, &self.client_id),
            (ENV_CLIENT_SECRET, &self.client_secret),
            (ENV_REFRESH_TOKEN, &self.refresh_token),
        ]
        .into_iter()
        .filter(|(_, value)| non_blank(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Build the API client. Missing credentials are not an error here; every
    /// call then fails with the authentication message.
    pub fn build_client(&self) -> Result<StravaClient> {
        let mut builder = StravaClient::builder()
            .base_url(&self.api_base_url)
            .token_url(&self.token_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .retry_config(RetryConfig {
                max_retries: self.max_retries,
                ..Default::default()
            });

        if let Some(id) = non_blank(&self.client_id) {
            builder = builder.client_id(id);
        }
        if let Some(secret) = non_blank(&self.client_secret) {
            builder = builder.client_secret(secret);
        }
        if let Some(token) = non_blank(&self.refresh_token) {
            builder = builder.refresh_token(token);
        }

        builder.build().context("Failed to create Strava client")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Http,
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" => Ok(Transport::Http),
            other => Err(format!("Unknown transport: {} (expected stdio or http)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub transport: Transport,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl TransportConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_code_len")]
    pub max_code_len: usize,
}

fn default_analysis_timeout_ms() -> u64 {
    2000
}

fn default_max_code_len() -> usize {
    10_000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_analysis_timeout_ms(),
            max_code_len: default_max_code_len(),
        }
    }
}

impl AnalysisConfig {
    pub fn limits(&self) -> AnalysisLimits {
        AnalysisLimits {
            timeout: Duration::from_millis(self.timeout_ms),
            max_code_len: self.max_code_len,
            ..Default::default()
        }
    }
}

impl ServerConfig {
    /// Load the config file if it exists, then apply environment overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!(path = %config_path.display(), "Configuration file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read configuration file {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {}", config_path.display()))
    }

    /// Override Strava settings from variables looked up through `lookup`.
    /// Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(id) = get(ENV_CLIENT_ID) {
            self.strava.client_id = Some(id);
        }
        if let Some(secret) = get(ENV_CLIENT_SECRET) {
            self.strava.client_secret = Some(secret);
        }
        if let Some(token) = get(ENV_REFRESH_TOKEN) {
            self.strava.refresh_token = Some(token);
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            self.strava.api_base_url = url;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.strava.timeout_secs == 0 {
            bail!("strava.timeout_secs must be greater than zero");
        }
        if self.analysis.timeout_ms == 0 {
            bail!("analysis.timeout_ms must be greater than zero");
        }
        if self.analysis.max_code_len == 0 || self.analysis.max_code_len > MAX_CODE_LEN_CEILING {
            bail!(
                "analysis.max_code_len must be between 1 and {}",
                MAX_CODE_LEN_CEILING
            );
        }
        Ok(())
    }
}
