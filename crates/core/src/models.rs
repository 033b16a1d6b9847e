// Shaped records handed back to the agent

use serde::{Deserialize, Serialize};

/// Totals for one sport over one period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTotalsSummary {
    pub distance: f64,
    pub achievement_count: u64,
    pub elevation_gain: f64,
}

/// Statistics for the authenticated athlete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteStatsSummary {
    pub firstname: String,
    pub lastname: String,
    pub recent_run_totals: ActivityTotalsSummary,
    pub all_run_totals: ActivityTotalsSummary,
    pub recent_ride_totals: ActivityTotalsSummary,
}

impl AthleteStatsSummary {
    /// Human readable rendering used by the stats tool
    pub fn to_formatted_string(&self) -> String {
        format!(
            "\nAthlete: {} {}\n\
             Recent Run Totals:\n  \
             Distance: {}\n  \
             Achievement Count: {}\n\
             All-Time Run Totals:\n  \
             Distance: {}\n\
             Recent Ride Totals:\n  \
             Distance: {}\n  \
             Elevation Gain: {}\n",
            self.firstname,
            self.lastname,
            format_float(self.recent_run_totals.distance),
            self.recent_run_totals.achievement_count,
            format_float(self.all_run_totals.distance),
            format_float(self.recent_ride_totals.distance),
            format_float(self.recent_ride_totals.elevation_gain),
        )
    }
}

/// Renders a float that always keeps its decimal point (`1000.0`, not `1000`)
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

/// Summary of an activity as returned by list and search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    /// ISO 8601
    pub start_date: Option<String>,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub moving_time: u64,
    pub total_elevation_gain: f64,
    /// Meters per second
    #[serde(default)]
    pub average_speed: f64,
    #[serde(default)]
    pub max_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDetails {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub distance: f64,
    pub moving_time: u64,
    pub elapsed_time: u64,
    pub total_elevation_gain: f64,
    pub average_speed: f64,
    pub max_speed: f64,
    pub calories: Option<f64>,
    pub device_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapSummary {
    pub id: u64,
    pub activity_id: u64,
    pub lap_index: u32,
    pub name: String,
    pub elapsed_time: u64,
    pub moving_time: u64,
    pub distance: f64,
    pub average_speed: f64,
    pub max_speed: f64,
    pub average_cadence: Option<f64>,
    pub average_watts: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
    pub total_elevation_gain: f64,
}

/// Raw stream data of an activity. Streams that were not returned are
/// left out of the serialized form entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityStreams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latlng: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_smooth: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartrate: Option<Vec<Option<i64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Vec<Option<i64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watts: Option<Vec<Option<i64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<Vec<Option<i64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving: Option<Vec<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_smooth: Option<Vec<f64>>,
}

impl ActivityStreams {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> AthleteStatsSummary {
        AthleteStatsSummary {
            firstname: "Test".to_string(),
            lastname: "Athlete".to_string(),
            recent_run_totals: ActivityTotalsSummary {
                distance: 1000.0,
                achievement_count: 5,
                elevation_gain: 0.0,
            },
            all_run_totals: ActivityTotalsSummary {
                distance: 50000.0,
                ..Default::default()
            },
            recent_ride_totals: ActivityTotalsSummary {
                distance: 2000.0,
                elevation_gain: 100.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_formatted_stats() {
        let formatted = sample_stats().to_formatted_string();

        assert!(formatted.starts_with('\n'));
        assert!(formatted.contains("Athlete: Test Athlete\n"));
        assert!(formatted.contains("Recent Run Totals:\n  Distance: 1000.0\n  Achievement Count: 5\n"));
        assert!(formatted.contains("All-Time Run Totals:\n  Distance: 50000.0\n"));
        assert!(formatted.contains("Recent Ride Totals:\n  Distance: 2000.0\n  Elevation Gain: 100.0\n"));
    }

    #[test]
    fn test_format_float_keeps_decimal_point() {
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(1234.0), "1234.0");
    }

    #[test]
    fn test_summary_serializes_type_key() {
        let summary = ActivitySummary {
            id: 1,
            name: "Run 1".to_string(),
            activity_type: "Run".to_string(),
            start_date: None,
            distance: 5000.0,
            moving_time: 1800,
            total_elevation_gain: 50.0,
            average_speed: 0.0,
            max_speed: 0.0,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "Run");
        assert_eq!(json["id"], 1);
        assert!(json["start_date"].is_null());
    }

    #[test]
    fn test_lap_serializes_missing_metrics_as_null() {
        let lap = LapSummary {
            id: 1,
            activity_id: 123,
            lap_index: 1,
            name: "Lap 1".to_string(),
            elapsed_time: 600,
            moving_time: 580,
            distance: 1000.0,
            average_speed: 2.5,
            max_speed: 3.0,
            average_cadence: Some(85.0),
            average_watts: None,
            average_heartrate: Some(145.0),
            max_heartrate: Some(165.0),
            total_elevation_gain: 50.0,
        };

        let json = serde_json::to_value(&lap).unwrap();
        assert!(json["average_watts"].is_null());
        assert_eq!(json["lap_index"], 1);
    }

    #[test]
    fn test_streams_skip_absent_series() {
        let streams = ActivityStreams {
            time: Some(vec![0, 1, 2]),
            ..Default::default()
        };

        let json = serde_json::to_value(&streams).unwrap();
        assert_eq!(json, serde_json::json!({"time": [0, 1, 2]}));

        let empty = serde_json::to_value(ActivityStreams::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));
        assert!(ActivityStreams::default().is_empty());
    }
}
