// Activity streams tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::services;
use crate::tools::{
    api_failure, json_result, json_schema_array, json_schema_enum, json_schema_integer,
    json_schema_object, parse_args, Tool,
};
use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;
use strava_mcp_core::{StravaApi, StreamResolution, StreamType};

/// Tool returning the raw time series (GPS, heart rate, power, ...) of an activity
pub struct GetActivityStreamsTool {
    api: Arc<dyn StravaApi>,
}

impl GetActivityStreamsTool {
    pub fn new(api: Arc<dyn StravaApi>) -> Self {
        Self { api }
    }
}

#[derive(Debug, Deserialize)]
struct StreamsArgs {
    activity_id: u64,
    #[serde(default)]
    types: Option<Vec<String>>,
    #[serde(default)]
    resolution: Option<String>,
}

impl StreamsArgs {
    fn stream_types(&self) -> Result<Vec<StreamType>, String> {
        self.types
            .iter()
            .flatten()
            .map(|name| name.parse::<StreamType>())
            .collect()
    }

    fn stream_resolution(&self) -> Result<Option<StreamResolution>, String> {
        match self.resolution.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }
}

#[async_trait::async_trait]
impl Tool for GetActivityStreamsTool {
    fn schema(&self) -> ToolSchema {
        let names: Vec<&str> = StreamType::ALL.iter().map(|t| t.as_str()).collect();

        ToolSchema {
            name: "get_activity_streams".to_string(),
            description: "Get raw stream data (GPS, heart rate, power, ...) for a specific \
                          activity. Resolution low, medium and high return about 100, 1000 \
                          and 10000 points; leave it out for every point."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "activity_id": json_schema_integer("The ID of the activity", None),
                    "types": json_schema_array(
                        json_schema_enum(&names, "Stream type"),
                        &format!(
                            "Stream types to fetch, any of: {}. Leave out for all.",
                            StreamType::all_names()
                        )
                    ),
                    "resolution": json_schema_enum(
                        &["low", "medium", "high"],
                        "Number of data points to return"
                    )
                }),
                vec!["activity_id"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: StreamsArgs = parse_args(arguments, "get_activity_streams")?;

        let types = match args.stream_types() {
            Ok(types) => types,
            Err(message) => return Ok(CallToolResult::error(message)),
        };
        let resolution = match args.stream_resolution() {
            Ok(resolution) => resolution,
            Err(message) => return Ok(CallToolResult::error(message)),
        };

        match services::activity_streams(self.api.as_ref(), args.activity_id, &types, resolution)
            .await
        {
            Ok(streams) => Ok(json_result(&streams)),
            Err(e) => Ok(api_failure("fetch activity streams", Some(args.activity_id), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::MockApi;
    use serde_json::json;
    use strava_mcp_core::{Stream, StreamSet};

    fn api_with_streams() -> Arc<MockApi> {
        let mut streams = StreamSet::new();
        streams.insert("time".to_string(), Stream::with_data(json!([0, 1, 2])));
        streams.insert("heartrate".to_string(), Stream::with_data(json!([120, 125, 130])));
        streams.insert("latlng".to_string(), Stream::with_data(json!([[1.0, 2.0], [1.1, 2.1]])));

        Arc::new(MockApi {
            streams,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_streams_returned_by_type() {
        let api = api_with_streams();
        let tool = GetActivityStreamsTool::new(api.clone());

        let result = tool
            .execute(json!({
                "activity_id": 5,
                "types": ["time", "heartrate", "latlng"],
                "resolution": "medium"
            }))
            .await
            .unwrap();

        let streams = result.structured_content.unwrap();
        assert_eq!(streams["time"], json!([0, 1, 2]));
        assert_eq!(streams["heartrate"], json!([120, 125, 130]));
        assert_eq!(streams["latlng"][1], json!([1.1, 2.1]));
        assert!(streams.get("watts").is_none());

        let requests = api.stream_requests.lock().unwrap();
        assert_eq!(
            requests[0],
            (
                Some(vec![StreamType::Time, StreamType::Heartrate, StreamType::Latlng]),
                Some(StreamResolution::Medium)
            )
        );
    }

    #[tokio::test]
    async fn test_no_types_requests_everything() {
        let api = api_with_streams();
        let tool = GetActivityStreamsTool::new(api.clone());

        tool.execute(json!({"activity_id": 5})).await.unwrap();
        assert_eq!(api.stream_requests.lock().unwrap()[0], (None, None));
    }

    #[tokio::test]
    async fn test_unknown_type_is_rejected() {
        let api = api_with_streams();
        let tool = GetActivityStreamsTool::new(api.clone());

        let result = tool
            .execute(json!({"activity_id": 5, "types": ["time", "power"]}))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.text_content(), "Unknown stream type: power");
        assert!(api.stream_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_resolution_is_rejected() {
        let tool = GetActivityStreamsTool::new(api_with_streams());

        let result = tool
            .execute(json!({"activity_id": 5, "resolution": "ultra"}))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(result.text_content().contains("ultra"));
    }
}
