//! Sandboxed evaluation of agent-supplied expressions over fetched data.
//!
//! Expressions are evaluated with [`evalexpr`], which has no I/O, no loops and
//! no access to the host. The JSON input is exposed as variables under the
//! `data` prefix:
//!
//! | input | bound as |
//! |---|---|
//! | scalar | `data` |
//! | object field | `data.<key>` (recursively) |
//! | array | `data.<index>` per element, plus `data` as a tuple when the elements are scalars |
//! | array of objects | `data.<key>` as a column tuple holding that field of every element |
//!
//! So `sum(data.distance)` totals the distance of a list of activities and
//! `mean(data.heartrate)` averages a heart rate stream.
//!
//! The evaluator recurses on nested expressions, so code nesting deeper than
//! [`MAX_NESTING`] is rejected up front and evaluation runs on its own thread
//! with a large stack.

use evalexpr::{
    Context, ContextWithMutableFunctions, ContextWithMutableVariables, EvalexprError, Function,
    HashMapContext, Value,
};
use serde_json::Value as Json;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

/// Deepest bracket or prefix-operator nesting accepted in code.
pub const MAX_NESTING: usize = 256;

/// Largest `max_code_len` a configuration may set.
pub const MAX_CODE_LEN_CEILING: usize = 20_000;

const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Limits applied to every evaluation.
#[derive(Debug, Clone)]
pub struct AnalysisLimits {
    pub timeout: Duration,
    pub max_code_len: usize,
    /// Upper bound on the number of variables created from the input data.
    pub max_bindings: usize,
}

impl Default for AnalysisLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2000),
            max_code_len: 10_000,
            max_bindings: 500_000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("no code given")]
    EmptyCode,

    #[error("code is {len} characters long, the limit is {max}")]
    CodeTooLong { len: usize, max: usize },

    #[error("code nests deeper than {max} levels")]
    NestingTooDeep { max: usize },

    #[error("data is too large: more than {max} values")]
    TooManyBindings { max: usize },

    #[error("{0}")]
    Evaluation(#[from] EvalexprError),

    #[error("evaluation timed out after {0:?}")]
    Timeout(Duration),

    #[error("evaluation task failed: {0}")]
    Task(String),
}

/// Evaluate `code` against `data` within `limits`.
pub async fn analyze_data(
    code: &str,
    data: &Json,
    limits: &AnalysisLimits,
) -> Result<Json, AnalysisError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AnalysisError::EmptyCode);
    }
    let len = code.chars().count();
    if len > limits.max_code_len {
        return Err(AnalysisError::CodeTooLong {
            len,
            max: limits.max_code_len,
        });
    }

    if nesting_depth(code) > MAX_NESTING {
        return Err(AnalysisError::NestingTooDeep { max: MAX_NESTING });
    }

    let owned_code = code.to_string();
    let owned_data = data.clone();
    let max_bindings = limits.max_bindings;
    let (tx, rx) = tokio::sync::oneshot::channel();

    std::thread::Builder::new()
        .name("analysis".to_string())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || {
            // The receiver is gone when the caller already timed out
            let _ = tx.send(evaluate(&owned_code, &owned_data, max_bindings));
        })
        .map_err(|e| AnalysisError::Task(e.to_string()))?;

    // A timed out thread is detached; without loops it still finishes in bounded time
    match tokio::time::timeout(limits.timeout, rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(AnalysisError::Task(
            "evaluation stopped without a result".to_string(),
        )),
        Err(_) => Err(AnalysisError::Timeout(limits.timeout)),
    }
}

/// Deepest nesting of brackets plus runs of prefix operators, ignoring string
/// literals.
fn nesting_depth(code: &str) -> usize {
    let mut max = 0;
    let mut depth = 0usize;
    let mut prefix_run = 0;
    let mut chars = code.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                prefix_run = 0;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '(' => {
                depth += 1;
                prefix_run = 0;
            }
            ')' => {
                depth = depth.saturating_sub(1);
                prefix_run = 0;
            }
            '-' | '!' => prefix_run += 1,
            c if c.is_whitespace() => {}
            _ => prefix_run = 0,
        }
        max = max.max(depth + prefix_run);
    }

    max
}

fn evaluate(code: &str, data: &Json, max_bindings: usize) -> Result<Json, AnalysisError> {
    let mut bindings = Bindings::new(max_bindings);
    bindings.bind("data", data)?;
    debug!(bindings = bindings.count, "Evaluating expression");

    let mut context = bindings.context;
    register_helpers(&mut context)?;

    let value = evalexpr::eval_with_context_mut(code, &mut context)?;
    Ok(to_json(value))
}

struct Bindings {
    context: HashMapContext,
    count: usize,
    max: usize,
}

impl Bindings {
    fn new(max: usize) -> Self {
        Self {
            context: HashMapContext::new(),
            count: 0,
            max,
        }
    }

    // First binding of a name wins
    fn set(&mut self, name: String, value: Value) -> Result<(), AnalysisError> {
        if self.context.get_value(&name).is_some() {
            return Ok(());
        }
        self.count += 1;
        if self.count > self.max {
            return Err(AnalysisError::TooManyBindings { max: self.max });
        }
        self.context.set_value(name, value)?;
        Ok(())
    }

    fn bind(&mut self, prefix: &str, data: &Json) -> Result<(), AnalysisError> {
        match data {
            Json::Object(fields) => {
                for (key, value) in fields {
                    self.bind(&format!("{}.{}", prefix, key), value)?;
                }
            }
            Json::Array(items) => {
                if items.iter().any(Json::is_object) {
                    self.bind_columns(prefix, items)?;
                } else {
                    self.set(prefix.to_string(), to_value(data))?;
                }
                for (index, item) in items.iter().enumerate() {
                    self.bind(&format!("{}.{}", prefix, index), item)?;
                }
            }
            scalar => self.set(prefix.to_string(), to_value(scalar))?,
        }
        Ok(())
    }

    fn bind_columns(&mut self, prefix: &str, items: &[Json]) -> Result<(), AnalysisError> {
        let keys: BTreeSet<&String> = items
            .iter()
            .filter_map(Json::as_object)
            .flat_map(|fields| fields.keys())
            .collect();

        for key in keys {
            let column = items
                .iter()
                .map(|item| item.get(key.as_str()).map(to_value).unwrap_or(Value::Empty))
                .collect();
            self.set(format!("{}.{}", prefix, key), Value::Tuple(column))?;
        }
        Ok(())
    }
}

/// Objects have no expression counterpart and become empty; their fields are
/// reachable through their own bindings.
fn to_value(json: &Json) -> Value {
    match json {
        Json::Null | Json::Object(_) => Value::Empty,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Empty),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Tuple(items.iter().map(to_value).collect()),
    }
}

/// Non-finite floats have no JSON form and become `null`.
fn to_json(value: Value) -> Json {
    match value {
        Value::String(s) => Json::String(s),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Int(i) => Json::from(i),
        Value::Boolean(b) => Json::Bool(b),
        Value::Tuple(items) => Json::Array(items.into_iter().map(to_json).collect()),
        Value::Empty => Json::Null,
    }
}

fn register_helpers(context: &mut HashMapContext) -> Result<(), AnalysisError> {
    context.set_function("sum".to_string(), Function::new(sum))?;
    context.set_function("mean".to_string(), Function::new(mean))?;
    context.set_function("median".to_string(), Function::new(median))?;
    context.set_function("count".to_string(), Function::new(count))?;
    Ok(())
}

// Helpers accept a tuple (or a bare number) and skip empty entries.

fn numbers(argument: &Value, out: &mut Vec<f64>, all_int: &mut bool) -> Result<(), EvalexprError> {
    match argument {
        Value::Int(i) => out.push(*i as f64),
        Value::Float(f) => {
            *all_int = false;
            out.push(*f);
        }
        Value::Empty => {}
        Value::Tuple(items) => {
            for item in items {
                numbers(item, out, all_int)?;
            }
        }
        other => {
            return Err(EvalexprError::CustomMessage(format!(
                "expected numbers, found {}",
                other
            )))
        }
    }
    Ok(())
}

fn collect_numbers(argument: &Value) -> Result<(Vec<f64>, bool), EvalexprError> {
    let mut values = Vec::new();
    let mut all_int = true;
    numbers(argument, &mut values, &mut all_int)?;
    Ok((values, all_int))
}

fn sum(argument: &Value) -> Result<Value, EvalexprError> {
    let (values, all_int) = collect_numbers(argument)?;
    let total: f64 = values.iter().sum();
    if all_int && total.abs() < i64::MAX as f64 {
        Ok(Value::Int(total as i64))
    } else {
        Ok(Value::Float(total))
    }
}

fn mean(argument: &Value) -> Result<Value, EvalexprError> {
    let (values, _) = collect_numbers(argument)?;
    if values.is_empty() {
        return Err(EvalexprError::CustomMessage(
            "mean of an empty sequence".to_string(),
        ));
    }
    Ok(Value::Float(values.iter().sum::<f64>() / values.len() as f64))
}

fn median(argument: &Value) -> Result<Value, EvalexprError> {
    let (mut values, _) = collect_numbers(argument)?;
    if values.is_empty() {
        return Err(EvalexprError::CustomMessage(
            "median of an empty sequence".to_string(),
        ));
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };
    Ok(Value::Float(median))
}

fn count(argument: &Value) -> Result<Value, EvalexprError> {
    let count = match argument {
        Value::Tuple(items) => items.iter().filter(|v| !matches!(v, Value::Empty)).count(),
        Value::Empty => 0,
        _ => 1,
    };
    Ok(Value::Int(count as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(code: &str, data: Json) -> Result<Json, AnalysisError> {
        analyze_data(code, &data, &AnalysisLimits::default()).await
    }

    #[tokio::test]
    async fn test_simple_arithmetic_on_object_field() {
        let result = run("data.x + 1", json!({"x": 10})).await.unwrap();
        assert_eq!(result, json!(11));
    }

    #[tokio::test]
    async fn test_column_sum_over_activity_list() {
        let data = json!([
            {"id": 1, "distance": 1000},
            {"id": 2, "distance": 2000},
            {"id": 3, "distance": 500}
        ]);
        assert_eq!(run("sum(data.distance)", data.clone()).await.unwrap(), json!(3500));
        assert_eq!(run("data.1.distance", data.clone()).await.unwrap(), json!(2000));
        assert_eq!(run("count(data.id)", data).await.unwrap(), json!(3));
    }

    #[tokio::test]
    async fn test_stream_statistics() {
        let data = json!({"heartrate": [120, 130, null, 170], "distance": [0.0, 5.5, 11.0]});
        assert_eq!(run("mean(data.heartrate)", data.clone()).await.unwrap(), json!(140.0));
        assert_eq!(run("median(data.heartrate)", data.clone()).await.unwrap(), json!(130.0));
        assert_eq!(run("count(data.heartrate)", data.clone()).await.unwrap(), json!(3));
        assert_eq!(run("sum(data.distance)", data).await.unwrap(), json!(16.5));
    }

    #[tokio::test]
    async fn test_scalar_array_and_scalar_data() {
        assert_eq!(run("sum(data)", json!([1, 2, 3])).await.unwrap(), json!(6));
        assert_eq!(run("data.2", json!([1, 2, 3])).await.unwrap(), json!(3));
        assert_eq!(run("data * 2", json!(21)).await.unwrap(), json!(42));
    }

    #[tokio::test]
    async fn test_strings_booleans_and_tuples() {
        let data = json!({"name": "Morning Run", "distance": 5000.0});
        assert_eq!(
            run("data.name == \"Morning Run\"", data.clone()).await.unwrap(),
            json!(true)
        );
        assert_eq!(
            run("(data.distance / 1000, data.name)", data).await.unwrap(),
            json!([5.0, "Morning Run"])
        );
    }

    #[tokio::test]
    async fn test_assignments_stay_local() {
        let code = "km = data.distance / 1000.0; km * 2";
        assert_eq!(run(code, json!({"distance": 2500})).await.unwrap(), json!(5.0));
    }

    #[tokio::test]
    async fn test_unknown_variable_is_evaluation_error() {
        let result = run("data.missing + 1", json!({"x": 1})).await;
        assert!(matches!(result, Err(AnalysisError::Evaluation(_))));
    }

    #[tokio::test]
    async fn test_helpers_reject_non_numbers() {
        let result = run("sum(data.name)", json!([{"name": "a"}, {"name": "b"}])).await;
        let message = result.unwrap_err().to_string();
        assert!(message.contains("expected numbers"), "{}", message);

        let result = run("mean(data)", json!([])).await;
        assert!(matches!(result, Err(AnalysisError::Evaluation(_))));
    }

    #[tokio::test]
    async fn test_code_guards() {
        assert!(matches!(run("   ", json!({})).await, Err(AnalysisError::EmptyCode)));

        let limits = AnalysisLimits {
            max_code_len: 5,
            ..Default::default()
        };
        let result = analyze_data("1 + 2 + 3", &json!({}), &limits).await;
        assert!(matches!(result, Err(AnalysisError::CodeTooLong { len: 9, max: 5 })));
    }

    #[tokio::test]
    async fn test_deep_nesting_is_rejected() {
        let code = format!("{}1{}", "(".repeat(4990), ")".repeat(4990));
        let result = run(&code, json!({})).await;
        assert!(matches!(result, Err(AnalysisError::NestingTooDeep { max: MAX_NESTING })));

        let code = format!("{}1", "-".repeat(MAX_NESTING + 1));
        let result = run(&code, json!({})).await;
        assert!(matches!(result, Err(AnalysisError::NestingTooDeep { .. })));
    }

    #[tokio::test]
    async fn test_nesting_within_limit_evaluates() {
        let code = format!("{}data.x{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(run(&code, json!({"x": 7})).await.unwrap(), json!(7));

        let code = vec!["1"; 2000].join(" + ");
        assert_eq!(run(&code, json!({})).await.unwrap(), json!(2000));
    }

    #[test]
    fn test_nesting_depth() {
        assert_eq!(nesting_depth("1 + 2"), 0);
        assert_eq!(nesting_depth("((1) + (2))"), 2);
        assert_eq!(nesting_depth("1 - -2"), 2);
        assert_eq!(nesting_depth("\"(((\" + \"\\\"(\""), 0);
    }

    #[tokio::test]
    async fn test_timeout() {
        let limits = AnalysisLimits {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        let data = Json::Array((0..200_000).map(Json::from).collect());
        let result = analyze_data("sum(data)", &data, &limits).await;
        assert!(matches!(result, Err(AnalysisError::Timeout(d)) if d == Duration::ZERO));
    }

    #[tokio::test]
    async fn test_binding_limit() {
        let limits = AnalysisLimits {
            max_bindings: 3,
            ..Default::default()
        };
        let data = json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let result = analyze_data("sum(data)", &data, &limits).await;
        assert!(matches!(result, Err(AnalysisError::TooManyBindings { max: 3 })));
    }
}
