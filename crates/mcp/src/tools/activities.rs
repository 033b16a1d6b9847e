// Activity tools: list, search, details and laps

use crate::protocol::{CallToolResult, ToolSchema};
use crate::services::{self, SearchCriteria, DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT};
use crate::tools::{
    api_failure, json_result, json_schema_integer, json_schema_number, json_schema_object,
    json_schema_string, parse_args, Tool,
};
use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;
use strava_mcp_core::search::ActivityFilter;
use strava_mcp_core::StravaApi;

/// Tool listing the most recent activities
pub struct ListActivitiesTool {
    api: Arc<dyn StravaApi>,
}

impl ListActivitiesTool {
    pub fn new(api: Arc<dyn StravaApi>) -> Self {
        Self { api }
    }
}

#[derive(Debug, Deserialize)]
struct ListActivitiesArgs {
    #[serde(default = "default_list_limit")]
    limit: i64,
}

fn default_list_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

#[async_trait::async_trait]
impl Tool for ListActivitiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_activities".to_string(),
            description: "List recent activities for the authenticated athlete, newest first."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "limit": json_schema_integer(
                        "Number of activities to return (1-200)",
                        Some(DEFAULT_LIST_LIMIT)
                    )
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ListActivitiesArgs = parse_args(arguments, "list_activities")?;

        match services::list_activities(self.api.as_ref(), args.limit).await {
            Ok(activities) => Ok(json_result(&activities)),
            Err(e) => Ok(api_failure("list activities", None, e)),
        }
    }
}

/// Tool fetching activities in a date window and filtering them by name, type and distance
pub struct SearchActivitiesTool {
    api: Arc<dyn StravaApi>,
}

impl SearchActivitiesTool {
    pub fn new(api: Arc<dyn StravaApi>) -> Self {
        Self { api }
    }
}

#[derive(Debug, Deserialize)]
struct SearchActivitiesArgs {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    activity_type: Option<String>,
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    before: Option<String>,
    #[serde(default)]
    min_distance: Option<f64>,
    #[serde(default)]
    max_distance: Option<f64>,
    #[serde(default = "default_search_limit")]
    limit: i64,
}

fn default_search_limit() -> i64 {
    DEFAULT_SEARCH_LIMIT
}

impl From<SearchActivitiesArgs> for SearchCriteria {
    fn from(args: SearchActivitiesArgs) -> Self {
        Self {
            filter: ActivityFilter {
                query: args.query,
                activity_type: args.activity_type,
                min_distance: args.min_distance,
                max_distance: args.max_distance,
            },
            after: args.after,
            before: args.before,
            limit: args.limit,
        }
    }
}

#[async_trait::async_trait]
impl Tool for SearchActivitiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_activities".to_string(),
            description: "Search activities with optional filters. Name and type matching \
                          happens after fetching, so keep the limit reasonable."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "query": json_schema_string(
                        "Case-insensitive text to look for in the activity name"
                    ),
                    "activity_type": json_schema_string(
                        "Activity type to match, e.g. Run, Ride, Walk, Hike"
                    ),
                    "after": json_schema_string(
                        "ISO 8601 date, e.g. 2025-01-01. Only activities after this date"
                    ),
                    "before": json_schema_string(
                        "ISO 8601 date, e.g. 2026-01-01. Only activities before this date"
                    ),
                    "min_distance": json_schema_number("Minimum distance in meters"),
                    "max_distance": json_schema_number("Maximum distance in meters"),
                    "limit": json_schema_integer(
                        "Maximum number of activities to fetch before filtering (1-200)",
                        Some(DEFAULT_SEARCH_LIMIT)
                    )
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: SearchActivitiesArgs = parse_args(arguments, "search_activities")?;
        let criteria = SearchCriteria::from(args);

        match services::search_activities(self.api.as_ref(), &criteria).await {
            Ok(activities) => Ok(json_result(&activities)),
            Err(e) => Ok(api_failure("search activities", None, e)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActivityIdArgs {
    activity_id: u64,
}

fn activity_id_schema(description: &str) -> serde_json::Value {
    json_schema_object(
        serde_json::json!({
            "activity_id": json_schema_integer(description, None)
        }),
        vec!["activity_id"],
    )
}

/// Tool returning the detailed representation of one activity
pub struct GetActivityDetailsTool {
    api: Arc<dyn StravaApi>,
}

impl GetActivityDetailsTool {
    pub fn new(api: Arc<dyn StravaApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for GetActivityDetailsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_activity_details".to_string(),
            description: "Get detailed information for a specific activity.".to_string(),
            input_schema: activity_id_schema("The ID of the activity to retrieve"),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ActivityIdArgs = parse_args(arguments, "get_activity_details")?;

        match services::activity_details(self.api.as_ref(), args.activity_id).await {
            Ok(details) => Ok(json_result(&details)),
            Err(e) => Ok(api_failure("fetch activity", Some(args.activity_id), e)),
        }
    }
}

/// Tool returning the laps of one activity
pub struct GetActivityLapsTool {
    api: Arc<dyn StravaApi>,
}

impl GetActivityLapsTool {
    pub fn new(api: Arc<dyn StravaApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for GetActivityLapsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_activity_laps".to_string(),
            description: "Get the lap breakdown of a specific activity.".to_string(),
            input_schema: activity_id_schema("The ID of the activity to retrieve laps for"),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ActivityIdArgs = parse_args(arguments, "get_activity_laps")?;

        match services::activity_laps(self.api.as_ref(), args.activity_id).await {
            Ok(laps) => Ok(json_result(&laps)),
            Err(e) => Ok(api_failure("fetch activity laps", Some(args.activity_id), e)),
        }
    }
}
