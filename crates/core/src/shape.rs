// Reshapes API records into the flat records returned to the agent.
//
// Missing values fall back to zero / empty string, except for optional
// metrics which stay `None`.

use crate::models::{
    ActivityDetails, ActivityStreams, ActivitySummary, ActivityTotalsSummary, AthleteStatsSummary,
    LapSummary,
};
use crate::types::{Activity, ActivityTotals, Athlete, AthleteStats, Lap, StreamSet, StreamType};
use serde::de::DeserializeOwned;

pub fn athlete_stats(athlete: &Athlete, stats: &AthleteStats) -> AthleteStatsSummary {
    let recent_run = totals_or_default(stats.recent_run_totals.as_ref());
    let all_run = totals_or_default(stats.all_run_totals.as_ref());
    let recent_ride = totals_or_default(stats.recent_ride_totals.as_ref());

    AthleteStatsSummary {
        firstname: athlete.firstname.clone().unwrap_or_default(),
        lastname: athlete.lastname.clone().unwrap_or_default(),
        recent_run_totals: ActivityTotalsSummary {
            distance: recent_run.distance.unwrap_or(0.0),
            achievement_count: recent_run.achievement_count.unwrap_or(0),
            ..Default::default()
        },
        all_run_totals: ActivityTotalsSummary {
            distance: all_run.distance.unwrap_or(0.0),
            ..Default::default()
        },
        recent_ride_totals: ActivityTotalsSummary {
            distance: recent_ride.distance.unwrap_or(0.0),
            elevation_gain: recent_ride.elevation_gain.unwrap_or(0.0),
            ..Default::default()
        },
    }
}

fn totals_or_default(totals: Option<&ActivityTotals>) -> ActivityTotals {
    totals.cloned().unwrap_or_default()
}

/// Activity type label, preferring the legacy `type` over `sport_type`
pub fn activity_type(activity: &Activity) -> String {
    activity
        .activity_type
        .clone()
        .or_else(|| activity.sport_type.clone())
        .unwrap_or_default()
}

pub fn activity_summary(activity: &Activity) -> ActivitySummary {
    ActivitySummary {
        id: activity.id,
        name: activity.name.clone().unwrap_or_default(),
        activity_type: activity_type(activity),
        start_date: activity.start_date.map(|d| d.to_rfc3339()),
        distance: activity.distance.unwrap_or(0.0),
        moving_time: activity.moving_time.unwrap_or(0),
        total_elevation_gain: activity.total_elevation_gain.unwrap_or(0.0),
        average_speed: activity.average_speed.unwrap_or(0.0),
        max_speed: activity.max_speed.unwrap_or(0.0),
    }
}

pub fn activity_details(activity: &Activity) -> ActivityDetails {
    ActivityDetails {
        id: activity.id,
        name: activity.name.clone().unwrap_or_default(),
        description: activity.description.clone(),
        activity_type: activity_type(activity),
        distance: activity.distance.unwrap_or(0.0),
        moving_time: activity.moving_time.unwrap_or(0),
        elapsed_time: activity.elapsed_time.unwrap_or(0),
        total_elevation_gain: activity.total_elevation_gain.unwrap_or(0.0),
        average_speed: activity.average_speed.unwrap_or(0.0),
        max_speed: activity.max_speed.unwrap_or(0.0),
        calories: activity.calories,
        device_name: activity.device_name.clone(),
    }
}

pub fn lap_summary(lap: &Lap) -> LapSummary {
    LapSummary {
        id: lap.id,
        activity_id: lap.activity.as_ref().map(|a| a.id).unwrap_or(0),
        lap_index: lap.lap_index.unwrap_or(0),
        name: lap.name.clone().unwrap_or_default(),
        elapsed_time: lap.elapsed_time.unwrap_or(0),
        moving_time: lap.moving_time.unwrap_or(0),
        distance: lap.distance.unwrap_or(0.0),
        average_speed: lap.average_speed.unwrap_or(0.0),
        max_speed: lap.max_speed.unwrap_or(0.0),
        average_cadence: nonzero(lap.average_cadence),
        average_watts: nonzero(lap.average_watts),
        average_heartrate: nonzero(lap.average_heartrate),
        max_heartrate: nonzero(lap.max_heartrate),
        total_elevation_gain: lap.total_elevation_gain.unwrap_or(0.0),
    }
}

// A zero sensor average means the sensor was not recording
fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

pub fn activity_streams(streams: &StreamSet) -> ActivityStreams {
    ActivityStreams {
        time: stream_data(streams, StreamType::Time),
        latlng: stream_data(streams, StreamType::Latlng),
        distance: stream_data(streams, StreamType::Distance),
        altitude: stream_data(streams, StreamType::Altitude),
        velocity_smooth: stream_data(streams, StreamType::VelocitySmooth),
        heartrate: stream_data(streams, StreamType::Heartrate),
        cadence: stream_data(streams, StreamType::Cadence),
        watts: stream_data(streams, StreamType::Watts),
        temp: stream_data(streams, StreamType::Temp),
        moving: stream_data(streams, StreamType::Moving),
        grade_smooth: stream_data(streams, StreamType::GradeSmooth),
    }
}

fn stream_data<T: DeserializeOwned>(streams: &StreamSet, stream_type: StreamType) -> Option<T> {
    let data = streams.get(stream_type.as_str())?.data.clone()?;
    match serde_json::from_value(data) {
        Ok(values) => Some(values),
        Err(e) => {
            tracing::warn!(stream = %stream_type, error = %e, "Dropping malformed stream");
            None
        }
    }
}
