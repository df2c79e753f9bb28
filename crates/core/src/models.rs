//! # Models
//!
//! Capability-based language model seam for the pipeline.
//!
//! Provider wiring (API keys, HTTP clients, model names) lives outside this
//! crate. A collaborator implements [`LanguageModel`] with two call shapes:
//!
//! - [`LanguageModel::complete`] - one conversational turn that may request
//!   tool calls. The multi-turn tool loop with its step cap is built on top of
//!   this in [`crate::skills::agent_loop`].
//! - [`LanguageModel::generate_object`] - schema-constrained structured
//!   generation. [`generate_structured`] wraps it with a `schemars` schema and
//!   typed deserialization.
//!
//! ## Example
//! ```rust,ignore
//! use devcontext_core::models::{AgentRole, ModelRegistry};
//!
//! let registry = ModelRegistry::new(default_model)
//!     .with_override(AgentRole::Evaluator, cheaper_model);
//! let evaluator = registry.for_role(AgentRole::Evaluator);
//! ```

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{AgentError, AgentResult};

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back in the tool result message
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        call_id: String,
        name: String,
        content: Value,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }
}

/// Tool definition advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

/// One conversational turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<Message>,
    /// Tools the model may call on this turn (empty = answer in text)
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Model answer for one turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Completion {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// Schema-constrained generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRequest {
    pub system: String,
    pub prompt: String,
    /// Name of the output type, used by providers that require one
    pub schema_name: String,
    pub schema: Value,
}

/// Capability contract with the model provider
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier for logs and events
    fn name(&self) -> &str;

    /// Run a single turn, possibly returning tool calls
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<Completion>;

    /// Return a value already validated against `request.schema`
    async fn generate_object(&self, request: ObjectRequest) -> anyhow::Result<Value>;
}

/// Typed structured generation.
///
/// Errors from the provider map to [`AgentError::Provider`]; a value that does
/// not deserialize into `T` maps to [`AgentError::MalformedOutput`].
pub async fn generate_structured<T>(
    model: &dyn LanguageModel,
    component: &str,
    system: &str,
    prompt: String,
) -> AgentResult<T>
where
    T: JsonSchema + DeserializeOwned,
{
    let schema = serde_json::to_value(schemars::schema_for!(T))
        .map_err(|e| AgentError::malformed(component, format!("schema: {e}")))?;
    let request = ObjectRequest {
        system: system.to_string(),
        prompt,
        schema_name: T::schema_name().to_string(),
        schema,
    };

    let value = model
        .generate_object(request)
        .await
        .map_err(|e| AgentError::provider(component, e))?;

    serde_json::from_value(value).map_err(|e| AgentError::malformed(component, e))
}

/// Model used when no provider is configured. Every call fails, which drives
/// each agent onto its deterministic fallback.
#[derive(Debug, Clone, Default)]
pub struct UnavailableModel;

#[async_trait]
impl LanguageModel for UnavailableModel {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn complete(&self, _request: CompletionRequest) -> anyhow::Result<Completion> {
        anyhow::bail!("no language model provider configured")
    }

    async fn generate_object(&self, _request: ObjectRequest) -> anyhow::Result<Value> {
        anyhow::bail!("no language model provider configured")
    }
}

/// Agents that issue model calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Planner,
    Enricher,
    Researcher,
    Evaluator,
    Optimizer,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Planner => "planner",
            AgentRole::Enricher => "context_enricher",
            AgentRole::Researcher => "tech_researcher",
            AgentRole::Evaluator => "evaluator",
            AgentRole::Optimizer => "optimizer",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default model plus per-agent overrides
#[derive(Clone)]
pub struct ModelRegistry {
    default: Arc<dyn LanguageModel>,
    per_agent: HashMap<AgentRole, Arc<dyn LanguageModel>>,
}

impl ModelRegistry {
    pub fn new(default: Arc<dyn LanguageModel>) -> Self {
        Self {
            default,
            per_agent: HashMap::new(),
        }
    }

    pub fn with_override(mut self, role: AgentRole, model: Arc<dyn LanguageModel>) -> Self {
        self.per_agent.insert(role, model);
        self
    }

    /// Per-agent override -> default
    pub fn for_role(&self, role: AgentRole) -> Arc<dyn LanguageModel> {
        self.per_agent
            .get(&role)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overrides: Vec<_> = self
            .per_agent
            .iter()
            .map(|(role, model)| format!("{role}={}", model.name()))
            .collect();
        f.debug_struct("ModelRegistry")
            .field("default", &self.default.name())
            .field("overrides", &overrides)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockModel;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Verdict {
        score: u8,
    }

    #[test]
    fn test_message_serialization_tags_role() {
        let json = serde_json::to_string(&Message::user("hello")).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_registry_override() {
        let default: Arc<dyn LanguageModel> = Arc::new(UnavailableModel);
        let evaluator: Arc<dyn LanguageModel> = Arc::new(MockModel::new("judge"));
        let registry = ModelRegistry::new(default).with_override(AgentRole::Evaluator, evaluator);

        assert_eq!(registry.for_role(AgentRole::Evaluator).name(), "judge");
        assert_eq!(registry.for_role(AgentRole::Planner).name(), "unavailable");
    }

    #[tokio::test]
    async fn test_generate_structured_typed() {
        let model = MockModel::new("mock").with_object("Verdict", serde_json::json!({"score": 8}));
        let verdict: Verdict = generate_structured(&model, "test", "sys", "rate it".into())
            .await
            .unwrap();
        assert_eq!(verdict.score, 8);
    }

    #[tokio::test]
    async fn test_generate_structured_maps_errors() {
        let err = generate_structured::<Verdict>(&UnavailableModel, "test", "sys", "x".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Provider { .. }));

        let model = MockModel::new("mock").with_object("Verdict", serde_json::json!({"nope": 1}));
        let err = generate_structured::<Verdict>(&model, "test", "sys", "x".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MalformedOutput { .. }));
    }
}
