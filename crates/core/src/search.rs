// Client-side activity search

use crate::models::ActivitySummary;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses an ISO 8601 date or datetime. Naive values are taken as UTC and a
/// bare date means midnight.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Criteria applied to fetched activities. Every criterion that is set must
/// hold; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    /// Case-insensitive substring of the activity name
    pub query: Option<String>,
    /// Case-insensitive substring of the activity type
    pub activity_type: Option<String>,
    /// Inclusive lower bound in meters
    pub min_distance: Option<f64>,
    /// Inclusive upper bound in meters
    pub max_distance: Option<f64>,
}

impl ActivityFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, activity: &ActivitySummary) -> bool {
        if let Some(query) = non_blank(&self.query) {
            if !contains_ignore_case(&activity.name, query) {
                return false;
            }
        }

        if let Some(activity_type) = non_blank(&self.activity_type) {
            if !contains_ignore_case(&activity.activity_type, activity_type) {
                return false;
            }
        }

        if let Some(min) = self.min_distance {
            if activity.distance < min {
                return false;
            }
        }

        if let Some(max) = self.max_distance {
            if activity.distance > max {
                return false;
            }
        }

        true
    }

    /// Keeps the matching activities, preserving order
    pub fn apply(&self, activities: Vec<ActivitySummary>) -> Vec<ActivitySummary> {
        if self.is_empty() {
            return activities;
        }
        activities.into_iter().filter(|a| self.matches(a)).collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
