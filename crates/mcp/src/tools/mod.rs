pub mod activities;
pub mod analysis;
pub mod athlete;
pub mod streams;
mod registry;

pub use activities::{
    GetActivityDetailsTool, GetActivityLapsTool, ListActivitiesTool, SearchActivitiesTool,
};
pub use analysis::AnalyzeDataTool;
pub use athlete::GetAthleteStatsTool;
pub use registry::{
    json_schema_array, json_schema_enum, json_schema_integer, json_schema_number,
    json_schema_object, json_schema_string, Tool, ToolRegistry,
};
pub use streams::GetActivityStreamsTool;

use crate::analysis::AnalysisLimits;
use crate::protocol::CallToolResult;
use anyhow::{Context, Result};
use std::sync::Arc;
use strava_mcp_core::{ApiError, StravaApi};
use tracing::error;

/// Registry with every Strava tool bound to `api`.
pub fn strava_tools(api: Arc<dyn StravaApi>, limits: AnalysisLimits) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(GetAthleteStatsTool::new(api.clone())));
    registry.register(Arc::new(ListActivitiesTool::new(api.clone())));
    registry.register(Arc::new(SearchActivitiesTool::new(api.clone())));
    registry.register(Arc::new(GetActivityDetailsTool::new(api.clone())));
    registry.register(Arc::new(GetActivityLapsTool::new(api.clone())));
    registry.register(Arc::new(GetActivityStreamsTool::new(api)));
    registry.register(Arc::new(AnalyzeDataTool::new(limits)));

    registry
}

/// Log a failed API call and turn it into a tool error the agent can read.
///
/// Upstream details stay in the logs; the agent only sees which action failed.
pub(crate) fn api_failure(action: &str, activity_id: Option<u64>, err: ApiError) -> CallToolResult {
    error!(action, activity_id, error = %err, "Strava API call failed");

    let message = match (err, activity_id) {
        (ApiError::Authentication(message), _) | (ApiError::InvalidInput(message), _) => message,
        (ApiError::NotFound(_), Some(id)) => format!("Activity {} not found", id),
        (ApiError::NotFound(_), None) => format!("Failed to {}: not found", action),
        (ApiError::RateLimited { .. }, _) => {
            "Strava rate limit exceeded. Try again later.".to_string()
        }
        (ApiError::Upstream(_), _) => format!("Failed to {}. Check server logs.", action),
    };

    CallToolResult::error(message)
}

/// Render a successful result as JSON, or an error result if it cannot be serialized.
pub(crate) fn json_result<T: serde::Serialize>(value: &T) -> CallToolResult {
    CallToolResult::json(value).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialize tool result");
        CallToolResult::error("Failed to serialize result")
    })
}

/// Deserialize tool arguments. A missing argument object counts as empty.
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(
    arguments: serde_json::Value,
    tool: &str,
) -> Result<T> {
    let arguments = match arguments {
        serde_json::Value::Null => serde_json::json!({}),
        other => other,
    };
    serde_json::from_value(arguments).with_context(|| format!("Invalid arguments for {}", tool))
}
