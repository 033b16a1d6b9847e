//! Athlete endpoints.

use crate::client::StravaClient;
use crate::error::StravaResult;
use strava_mcp_core::types::{Athlete, AthleteStats};

/// Athlete API for the authenticated athlete's profile and totals.
pub struct AthletesApi<'a> {
    client: &'a StravaClient,
}

impl<'a> AthletesApi<'a> {
    pub(crate) fn new(client: &'a StravaClient) -> Self {
        Self { client }
    }

    /// Get the authenticated athlete.
    pub async fn current(&self) -> StravaResult<Athlete> {
        self.client.http.get("athlete").await
    }

    /// Get recent, year-to-date and all-time totals for an athlete.
    pub async fn stats(&self, athlete_id: u64) -> StravaResult<AthleteStats> {
        self.client
            .http
            .get(&format!("athletes/{}/stats", athlete_id))
            .await
    }
}
