// Athlete statistics tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::services;
use crate::tools::{api_failure, json_schema_object, Tool};
use anyhow::Result;
use std::sync::Arc;
use strava_mcp_core::StravaApi;

/// Tool returning the athlete's recent and all-time totals as formatted text
pub struct GetAthleteStatsTool {
    api: Arc<dyn StravaApi>,
}

impl GetAthleteStatsTool {
    pub fn new(api: Arc<dyn StravaApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for GetAthleteStatsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_athlete_stats".to_string(),
            description: "Get statistics for the authenticated athlete. \
                          Returns recent and all-time run totals and recent ride totals."
                .to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
        match services::athlete_stats(self.api.as_ref()).await {
            Ok(stats) => {
                let mut result = CallToolResult::text(stats.to_formatted_string());
                result.structured_content = Some(serde_json::to_value(&stats)?);
                Ok(result)
            }
            Err(e) => Ok(api_failure("fetch athlete stats", None, e)),
        }
    }
}
