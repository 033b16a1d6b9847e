//! # Strava SDK
//!
//! Async client for the Strava v3 API, covering the read endpoints the MCP
//! server needs: the athlete, their stats, activities, laps and streams.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strava_sdk::{StravaClient, StravaResult};
//!
//! #[tokio::main]
//! async fn main() -> StravaResult<()> {
//!     let client = StravaClient::builder()
//!         .client_id("12345")
//!         .client_secret("secret")
//!         .refresh_token("refresh-token")
//!         .build()?;
//!
//!     let athlete = client.athletes().current().await?;
//!     println!("Hello, {:?}", athlete.firstname);
//!
//!     let activities = client
//!         .activities()
//!         .list(&strava_sdk::ActivityQuery::recent(5))
//!         .await?;
//!     println!("Found {} activities", activities.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! Access tokens are refreshed transparently through the OAuth refresh-token
//! grant. [`StravaClient`] also implements [`strava_mcp_core::StravaApi`], so it
//! can be handed to anything written against that trait.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::{StravaClient, StravaClientBuilder};
pub use config::{ClientConfig, Credentials, RetryConfig};
pub use error::{StravaError, StravaResult};

pub use strava_mcp_core::types::{
    Activity, ActivityQuery, Athlete, AthleteStats, Lap, Stream, StreamResolution, StreamSet,
    StreamType,
};
