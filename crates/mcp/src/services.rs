// Service functions behind the tools: one API call each, reshaped for the agent

use strava_mcp_core::search::{parse_date, ActivityFilter};
use strava_mcp_core::shape;
use strava_mcp_core::{
    ActivityDetails, ActivityQuery, ActivityStreams, ActivitySummary, ApiResult,
    AthleteStatsSummary, LapSummary, StravaApi, StreamResolution, StreamType,
};
use tracing::{debug, warn};

/// Upper bound for any number of activities requested in one call.
pub const MAX_LIMIT: usize = 200;

pub const DEFAULT_LIST_LIMIT: i64 = 5;
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Clamp a requested limit into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(1, MAX_LIMIT as i64) as usize
}

/// Statistics of the authenticated athlete.
pub async fn athlete_stats(api: &dyn StravaApi) -> ApiResult<AthleteStatsSummary> {
    let athlete = api.get_athlete().await?;
    let stats = api.get_athlete_stats(athlete.id).await?;
    Ok(shape::athlete_stats(&athlete, &stats))
}

/// Most recent activities, newest first.
pub async fn list_activities(api: &dyn StravaApi, limit: i64) -> ApiResult<Vec<ActivitySummary>> {
    let query = ActivityQuery::recent(clamp_limit(limit));
    let activities = api.get_activities(&query).await?;
    Ok(activities.iter().map(shape::activity_summary).collect())
}

/// Criteria of an activity search.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub filter: ActivityFilter,
    /// ISO 8601; only activities starting after this instant are fetched
    pub after: Option<String>,
    /// ISO 8601; only activities starting before this instant are fetched
    pub before: Option<String>,
    /// How many activities to fetch before filtering
    pub limit: i64,
}

/// Fetch up to `limit` activities in the date window, then filter them client-side.
///
/// A date that cannot be parsed is logged and ignored rather than failing the search.
pub async fn search_activities(
    api: &dyn StravaApi,
    criteria: &SearchCriteria,
) -> ApiResult<Vec<ActivitySummary>> {
    let query = ActivityQuery {
        after: date_bound("after", criteria.after.as_deref()),
        before: date_bound("before", criteria.before.as_deref()),
        limit: clamp_limit(criteria.limit),
    };

    let activities = api.get_activities(&query).await?;
    let fetched = activities.len();
    let summaries = activities.iter().map(shape::activity_summary).collect();
    let matched = criteria.filter.apply(summaries);

    debug!(fetched, matched = matched.len(), "Searched activities");
    Ok(matched)
}

fn date_bound(name: &str, value: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    let parsed = parse_date(value);
    if parsed.is_none() {
        warn!(bound = name, value, "Ignoring invalid date");
    }
    parsed
}

pub async fn activity_details(api: &dyn StravaApi, activity_id: u64) -> ApiResult<ActivityDetails> {
    let activity = api.get_activity(activity_id).await?;
    Ok(shape::activity_details(&activity))
}

pub async fn activity_laps(api: &dyn StravaApi, activity_id: u64) -> ApiResult<Vec<LapSummary>> {
    let laps = api.get_activity_laps(activity_id).await?;
    Ok(laps.iter().map(shape::lap_summary).collect())
}

/// Raw streams of an activity. An empty `types` slice requests every type.
pub async fn activity_streams(
    api: &dyn StravaApi,
    activity_id: u64,
    types: &[StreamType],
    resolution: Option<StreamResolution>,
) -> ApiResult<ActivityStreams> {
    let types = if types.is_empty() { None } else { Some(types) };
    let streams = api.get_activity_streams(activity_id, types, resolution).await?;
    let shaped = shape::activity_streams(&streams);
    if shaped.is_empty() {
        debug!(activity_id, "Activity has no usable streams");
    }
    Ok(shaped)
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::sync::Mutex;
    use strava_mcp_core::{
        Activity, ActivityQuery, ApiError, ApiResult, Athlete, AthleteStats, Lap, StravaApi,
        StreamResolution, StreamSet, StreamType,
    };

    /// In-memory `StravaApi` that records the queries it receives.
    #[derive(Default)]
    pub struct MockApi {
        pub athlete: Athlete,
        pub stats: AthleteStats,
        pub activities: Vec<Activity>,
        pub laps: Vec<Lap>,
        pub streams: StreamSet,
        pub failure: Option<ApiError>,
        pub queries: Mutex<Vec<ActivityQuery>>,
        pub stream_requests: Mutex<Vec<(Option<Vec<StreamType>>, Option<StreamResolution>)>>,
    }

    impl MockApi {
        pub fn failing(error: ApiError) -> Self {
            Self {
                failure: Some(error),
                ..Default::default()
            }
        }

        fn check(&self) -> ApiResult<()> {
            match &self.failure {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }

        pub fn last_query(&self) -> Option<ActivityQuery> {
            self.queries.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl StravaApi for MockApi {
        async fn get_athlete(&self) -> ApiResult<Athlete> {
            self.check()?;
            Ok(self.athlete.clone())
        }

        async fn get_athlete_stats(&self, _athlete_id: u64) -> ApiResult<AthleteStats> {
            self.check()?;
            Ok(self.stats.clone())
        }

        async fn get_activities(&self, query: &ActivityQuery) -> ApiResult<Vec<Activity>> {
            self.queries.lock().unwrap().push(query.clone());
            self.check()?;
            Ok(self.activities.iter().take(query.limit).cloned().collect())
        }

        async fn get_activity(&self, activity_id: u64) -> ApiResult<Activity> {
            self.check()?;
            self.activities
                .iter()
                .find(|a| a.id == activity_id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound("Record Not Found".to_string()))
        }

        async fn get_activity_laps(&self, _activity_id: u64) -> ApiResult<Vec<Lap>> {
            self.check()?;
            Ok(self.laps.clone())
        }

        async fn get_activity_streams(
            &self,
            _activity_id: u64,
            types: Option<&[StreamType]>,
            resolution: Option<StreamResolution>,
        ) -> ApiResult<StreamSet> {
            self.stream_requests
                .lock()
                .unwrap()
                .push((types.map(|t| t.to_vec()), resolution));
            self.check()?;
            Ok(self.streams.clone())
        }
    }

    pub fn activity(id: u64, name: &str, activity_type: &str, distance: f64) -> Activity {
        Activity {
            id,
            name: Some(name.to_string()),
            activity_type: Some(activity_type.to_string()),
            distance: Some(distance),
            moving_time: Some(1800),
            ..Default::default()
        }
    }
}
