//! # Agent Tools
//!
//! Tools the model may call during a tool-augmented run. Each tool validates
//! its own arguments and reports failures as a [`ToolResult::error`] payload
//! the model can read, rather than failing the agent.

pub mod repo_tools;
pub mod search_tools;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{ToolCall, ToolSpec};

pub use repo_tools::{repo_tools, RepoSandbox};
pub use search_tools::{research_tools, ResearchCapabilities};

/// Outcome of a tool call, fed back to the model verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Value,
}

impl ToolResult {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: json!({ "error": message.into() }),
        }
    }

    /// Message payload for the conversation
    pub fn to_value(&self) -> Value {
        json!({ "success": self.success, "data": self.data })
    }
}

/// A callable tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;

    async fn call(&self, args: Value) -> ToolResult;
}

/// JSON schema for an argument struct
pub fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| json!({ "type": "object" }))
}

/// Deserialize tool arguments, mapping failures to a readable tool error
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolResult> {
    // Some providers send `null` for tools without required arguments
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|e| ToolResult::error(format!("Invalid arguments for '{}': {}", tool, e)))
}

/// Wall-clock limit on a single tool call
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Tools available to one agent run
#[derive(Clone)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
    timeout: Duration,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self {
            tools: Vec::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Definitions advertised to the model
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Dispatch `call`. Unknown tools and calls over the time limit come back
    /// as error results.
    pub async fn call(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.iter().find(|t| t.name() == call.name) else {
            return ToolResult::error(format!("Unknown tool '{}'", call.name));
        };
        match tokio::time::timeout(self.timeout, tool.call(call.arguments.clone())).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    tool = %call.name,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Tool call timed out"
                );
                ToolResult::error(format!(
                    "Tool '{}' timed out after {}ms",
                    call.name,
                    self.timeout.as_millis()
                ))
            }
        }
    }
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (format!("{}\n…[truncated]", &text[..idx]), true),
        None => (text.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the arguments back"
        }

        fn parameters(&self) -> Value {
            json!({ "type": "object" })
        }

        async fn call(&self, args: Value) -> ToolResult {
            ToolResult::success(args)
        }
    }

    #[tokio::test]
    async fn test_toolset_dispatch() {
        let tools = ToolSet::new().with_tool(Echo);
        let call = ToolCall {
            id: "1".into(),
            name: "echo".into(),
            arguments: json!({ "x": 1 }),
        };
        assert_eq!(tools.call(&call).await, ToolResult::success(json!({ "x": 1 })));

        let unknown = ToolCall {
            name: "nope".into(),
            ..call
        };
        assert!(!tools.call(&unknown).await.success);
    }

    struct Stall;

    #[async_trait]
    impl Tool for Stall {
        fn name(&self) -> &'static str {
            "stall"
        }

        fn description(&self) -> &'static str {
            "Never answers in time"
        }

        fn parameters(&self) -> Value {
            json!({ "type": "object" })
        }

        async fn call(&self, _args: Value) -> ToolResult {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ToolResult::success(json!({}))
        }
    }

    #[tokio::test]
    async fn test_slow_tool_times_out() {
        let tools = ToolSet::new()
            .with_tool(Stall)
            .with_timeout(Duration::from_millis(20));
        let call = ToolCall {
            id: "1".into(),
            name: "stall".into(),
            arguments: json!({}),
        };
        let result = tools.call(&call).await;
        assert!(!result.success);
        assert!(result.data["error"].as_str().unwrap().contains("timed out"));
    }

    #[test]
    fn test_specs_expose_definitions() {
        let specs = ToolSet::new().with_tool(Echo).specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "echo");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), ("short".to_string(), false));
        let (cut, truncated) = truncate_chars("abcdef", 3);
        assert!(truncated);
        assert!(cut.starts_with("abc\n"));
    }
}
