// Seam between the tool layer and whatever talks to the Strava API

use crate::types::{
    Activity, ActivityQuery, Athlete, AthleteStats, Lap, StreamResolution, StreamSet, StreamType,
};

/// Failure of a call against the fitness API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Credentials missing or rejected. The message is safe to show to the agent.
    #[error("{0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited by the Strava API")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Strava API error: {0}")]
    Upstream(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Read access to the authenticated athlete's Strava data
#[async_trait::async_trait]
pub trait StravaApi: Send + Sync {
    /// Profile of the authenticated athlete
    async fn get_athlete(&self) -> ApiResult<Athlete>;

    /// Recent, year-to-date and all-time totals for an athlete
    async fn get_athlete_stats(&self, athlete_id: u64) -> ApiResult<AthleteStats>;

    /// Activities of the authenticated athlete, newest first
    async fn get_activities(&self, query: &ActivityQuery) -> ApiResult<Vec<Activity>>;

    /// Detailed representation of one activity
    async fn get_activity(&self, activity_id: u64) -> ApiResult<Activity>;

    async fn get_activity_laps(&self, activity_id: u64) -> ApiResult<Vec<Lap>>;

    /// Raw data streams of an activity. `None` for `types` requests every type.
    async fn get_activity_streams(
        &self,
        activity_id: u64,
        types: Option<&[StreamType]>,
        resolution: Option<StreamResolution>,
    ) -> ApiResult<StreamSet>;
}
