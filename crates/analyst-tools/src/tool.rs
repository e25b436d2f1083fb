//! Tool trait definition

use crate::{Result, ToolError};
use analyst_llm::ToolDefinition;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Trait for tools the language model can call
///
/// Each tool must provide a name, description, and JSON schema for its input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// # Arguments
    ///
    /// * `params` - Tool input as JSON value (should match input_schema)
    ///
    /// # Returns
    ///
    /// Tool output as JSON value
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry and match the name in ToolDefinition
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description helps the LLM understand when to use this tool
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    fn input_schema(&self) -> Value;

    /// Definition advertised to the language model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Deserialize tool parameters into a typed struct.
///
/// `null` is treated as an empty object so tools without required
/// parameters accept a bare call.
pub fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T> {
    let params = if params.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| ToolError::InvalidParameters {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(default = "default_limit")]
        limit: usize,
    }

    fn default_limit() -> usize {
        10
    }

    #[test]
    fn test_null_params_use_defaults() {
        let params: Params = parse_params("movers", Value::Null).unwrap();
        assert_eq!(params.limit, 10);
    }

    #[test]
    fn test_bad_params_name_the_tool() {
        let err = parse_params::<Params>("movers", json!({"limit": "many"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters { ref tool, .. } if tool == "movers"));
    }
}
