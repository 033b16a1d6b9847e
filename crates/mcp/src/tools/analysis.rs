// Data analysis tool backed by the expression sandbox

use crate::analysis::{analyze_data, AnalysisLimits};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_result, json_schema_object, json_schema_string, parse_args, Tool};
use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

/// Tool evaluating an expression over data the agent already fetched
pub struct AnalyzeDataTool {
    limits: AnalysisLimits,
}

impl AnalyzeDataTool {
    pub fn new(limits: AnalysisLimits) -> Self {
        Self { limits }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeArgs {
    code: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Data may arrive as a string holding JSON; anything unparseable stays a string.
fn decode_data(data: serde_json::Value) -> serde_json::Value {
    match data {
        serde_json::Value::String(text) => {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        }
        other => other,
    }
}

#[async_trait::async_trait]
impl Tool for AnalyzeDataTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "analyze_data".to_string(),
            description: "Evaluate an expression over data, e.g. the output of another tool. \
                          Object fields are available as data.<field>, list elements as \
                          data.<index>, and for a list of objects data.<field> is the column \
                          of that field. Helpers: sum, mean, median, count, plus min, max, \
                          floor, round and the math:: functions. Example: \
                          mean(data.distance) / 1000"
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "code": json_schema_string("Expression to evaluate"),
                    "data": {
                        "description": "Input data as JSON, or a string containing JSON"
                    }
                }),
                vec!["code"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: AnalyzeArgs = parse_args(arguments, "analyze_data")?;
        let data = decode_data(args.data);

        match analyze_data(&args.code, &data, &self.limits).await {
            Ok(value) => Ok(json_result(&value)),
            Err(e) => {
                warn!(error = %e, "Analysis failed");
                Ok(CallToolResult::error(format!("Error executing code: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool() -> AnalyzeDataTool {
        AnalyzeDataTool::new(AnalysisLimits::default())
    }

    #[tokio::test]
    async fn test_with_object_data() {
        let result = tool()
            .execute(json!({"code": "data.x", "data": {"x": 1}}))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
        assert_eq!(result.text_content(), "1");
        assert_eq!(result.structured_content, Some(json!({"result": 1})));
    }

    #[tokio::test]
    async fn test_with_json_string_data() {
        let result = tool()
            .execute(json!({"code": "data.x + 1", "data": "{\"x\": 1}"}))
            .await
            .unwrap();
        assert_eq!(result.text_content(), "2");
    }

    #[tokio::test]
    async fn test_plain_string_data_is_kept() {
        let result = tool()
            .execute(json!({"code": "data", "data": "not json"}))
            .await
            .unwrap();
        assert_eq!(result.text_content(), "\"not json\"");
    }

    #[tokio::test]
    async fn test_evaluation_error_is_reported() {
        let result = tool()
            .execute(json!({"code": "data.nope * 2", "data": {}}))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(result.text_content().starts_with("Error executing code: "));
    }

    #[tokio::test]
    async fn test_code_is_required() {
        assert!(tool().execute(json!({"data": {}})).await.is_err());
    }

    #[test]
    fn test_decode_data() {
        assert_eq!(decode_data(json!("[1, 2]")), json!([1, 2]));
        assert_eq!(decode_data(json!("abc")), json!("abc"));
        assert_eq!(decode_data(json!({"a": 1})), json!({"a": 1}));
    }
}
