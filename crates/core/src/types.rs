// Records returned by the Strava v3 API.
//
// Every field the API may leave out is optional; unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The authenticated athlete
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Athlete {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// Rolled-up totals for one sport over one period
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityTotals {
    #[serde(default)]
    pub count: Option<u64>,
    /// Meters
    #[serde(default)]
    pub distance: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub moving_time: Option<u64>,
    /// Seconds
    #[serde(default)]
    pub elapsed_time: Option<u64>,
    /// Meters
    #[serde(default)]
    pub elevation_gain: Option<f64>,
    #[serde(default)]
    pub achievement_count: Option<u64>,
}

/// Response of `GET /athletes/{id}/stats`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteStats {
    #[serde(default)]
    pub biggest_ride_distance: Option<f64>,
    #[serde(default)]
    pub biggest_climb_elevation_gain: Option<f64>,
    #[serde(default)]
    pub recent_run_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub all_run_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub recent_ride_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub all_ride_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub recent_swim_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub all_swim_totals: Option<ActivityTotals>,
}

/// An activity, either the summary form from the list endpoint or the
/// detailed form from `GET /activities/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub sport_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub moving_time: Option<u64>,
    #[serde(default)]
    pub elapsed_time: Option<u64>,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub max_speed: Option<f64>,

    // Only present on the detailed representation
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub device_name: Option<String>,
}

/// Reference to the parent activity carried by a lap
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityRef {
    pub id: u64,
}

/// A lap of an activity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lap {
    pub id: u64,
    #[serde(default)]
    pub activity: Option<ActivityRef>,
    #[serde(default)]
    pub lap_index: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<u64>,
    #[serde(default)]
    pub moving_time: Option<u64>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub max_speed: Option<f64>,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
}

/// One raw data stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stream {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub series_type: Option<String>,
    #[serde(default)]
    pub original_size: Option<u64>,
    #[serde(default)]
    pub resolution: Option<String>,
}

impl Stream {
    pub fn with_data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }
}

/// Streams keyed by type name (`key_by_type=true` response shape)
pub type StreamSet = HashMap<String, Stream>;

/// Kinds of stream an activity may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    Time,
    Latlng,
    Distance,
    Altitude,
    VelocitySmooth,
    Heartrate,
    Cadence,
    Watts,
    Temp,
    Moving,
    GradeSmooth,
}

impl StreamType {
    pub const ALL: [StreamType; 11] = [
        StreamType::Time,
        StreamType::Latlng,
        StreamType::Distance,
        StreamType::Altitude,
        StreamType::VelocitySmooth,
        StreamType::Heartrate,
        StreamType::Cadence,
        StreamType::Watts,
        StreamType::Temp,
        StreamType::Moving,
        StreamType::GradeSmooth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Time => "time",
            StreamType::Latlng => "latlng",
            StreamType::Distance => "distance",
            StreamType::Altitude => "altitude",
            StreamType::VelocitySmooth => "velocity_smooth",
            StreamType::Heartrate => "heartrate",
            StreamType::Cadence => "cadence",
            StreamType::Watts => "watts",
            StreamType::Temp => "temp",
            StreamType::Moving => "moving",
            StreamType::GradeSmooth => "grade_smooth",
        }
    }

    /// Comma separated list of every stream type name
    pub fn all_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown stream type: {}", s))
    }
}

/// Sampling resolution for stream requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamResolution {
    /// 100 points
    Low,
    /// 1000 points
    Medium,
    /// 10000 points
    High,
}

impl StreamResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamResolution::Low => "low",
            StreamResolution::Medium => "medium",
            StreamResolution::High => "high",
        }
    }
}

impl FromStr for StreamResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(StreamResolution::Low),
            "medium" => Ok(StreamResolution::Medium),
            "high" => Ok(StreamResolution::High),
            other => Err(format!(
                "Invalid resolution: {} (expected low, medium or high)",
                other
            )),
        }
    }
}

/// Parameters for listing the athlete's activities
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityQuery {
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl ActivityQuery {
    pub fn recent(limit: usize) -> Self {
        Self {
            before: None,
            after: None,
            limit,
        }
    }
}
