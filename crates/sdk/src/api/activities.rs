//! Activity endpoints.

use crate::client::StravaClient;
use crate::error::StravaResult;
use strava_mcp_core::types::{Activity, ActivityQuery, Lap};
use tracing::debug;

/// Largest page size the list endpoint accepts.
pub const MAX_PER_PAGE: usize = 200;

/// Activities API for listing and reading activities.
pub struct ActivitiesApi<'a> {
    client: &'a StravaClient,
}

impl<'a> ActivitiesApi<'a> {
    pub(crate) fn new(client: &'a StravaClient) -> Self {
        Self { client }
    }

    /// List the authenticated athlete's activities, newest first.
    ///
    /// Pages through the endpoint until `query.limit` activities are collected
    /// or the athlete has no more.
    pub async fn list(&self, query: &ActivityQuery) -> StravaResult<Vec<Activity>> {
        let mut activities = Vec::new();
        if query.limit == 0 {
            return Ok(activities);
        }

        let per_page = query.limit.min(MAX_PER_PAGE);
        let mut page = 1;

        loop {
            let params = page_params(query, page, per_page);
            let batch: Vec<Activity> = self
                .client
                .http
                .get_with_query("athlete/activities", &params)
                .await?;

            let received = batch.len();
            activities.extend(batch);
            debug!(page, received, total = activities.len(), "Fetched activity page");

            if received < per_page || activities.len() >= query.limit {
                break;
            }
            page += 1;
        }

        activities.truncate(query.limit);
        Ok(activities)
    }

    /// Get the detailed representation of an activity.
    pub async fn get(&self, activity_id: u64) -> StravaResult<Activity> {
        self.client
            .http
            .get(&format!("activities/{}", activity_id))
            .await
    }

    /// Get the laps of an activity.
    pub async fn laps(&self, activity_id: u64) -> StravaResult<Vec<Lap>> {
        self.client
            .http
            .get(&format!("activities/{}/laps", activity_id))
            .await
    }
}

fn page_params(query: &ActivityQuery, page: usize, per_page: usize) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", page.to_string()),
        ("per_page", per_page.to_string()),
    ];
    if let Some(before) = query.before {
        params.push(("before", before.timestamp().to_string()));
    }
    if let Some(after) = query.after {
        params.push(("after", after.timestamp().to_string()));
    }
    params
}
