//! # Agent Loop
//!
//! Free-text generation with tool calling, built on single-turn
//! [`LanguageModel::complete`] calls.
//!
//! The loop counts tool invocations against a budget. Once the budget is
//! spent, tool definitions are withheld so the next turn has to answer in
//! text. A hard cap on turns ends the loop even when the model keeps asking
//! for tools anyway.

use serde::Serialize;
use tracing::debug;

use crate::error::{AgentError, AgentResult};
use crate::models::{CompletionRequest, LanguageModel, Message, ToolCall};
use crate::skills::tools::{ToolResult, ToolSet};

/// Turns allowed beyond the tool budget
const EXTRA_TURNS: usize = 2;

/// One model turn and the tool calls it triggered
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
}

/// Final text plus every turn taken to get there
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedText {
    pub text: String,
    pub steps: Vec<AgentStep>,
}

impl GeneratedText {
    /// Tool invocations that actually ran
    pub fn tool_invocations(&self) -> usize {
        self.steps.iter().map(|s| s.tool_calls.len()).sum()
    }

    /// Non-empty texts, newest first. Used to salvage an answer when the
    /// final turn was unusable.
    pub fn texts_newest_first(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.text.as_str())
            .chain(self.steps.iter().rev().map(|s| s.text.as_str()))
            .filter(|t| !t.trim().is_empty())
    }
}

/// Parameters of one tool-augmented run
pub struct TextRequest<'a> {
    pub component: &'a str,
    pub system: &'a str,
    pub prompt: String,
    pub tools: &'a ToolSet,
    /// Maximum tool invocations across the whole run
    pub max_tool_steps: usize,
}

/// Run the tool loop until the model answers in text or the turn cap is hit.
///
/// Only provider failures are errors. Tool failures are fed back to the model.
pub async fn generate_text(
    model: &dyn LanguageModel,
    request: TextRequest<'_>,
) -> AgentResult<GeneratedText> {
    let TextRequest {
        component,
        system,
        prompt,
        tools,
        max_tool_steps,
    } = request;

    let max_turns = max_tool_steps + EXTRA_TURNS;
    let mut messages = vec![Message::user(prompt)];
    let mut steps: Vec<AgentStep> = Vec::new();
    let mut used = 0usize;

    for turn in 0..max_turns {
        let offer_tools = !tools.is_empty() && used < max_tool_steps;
        let completion = model
            .complete(CompletionRequest {
                system: system.to_string(),
                messages: messages.clone(),
                tools: if offer_tools { tools.specs() } else { Vec::new() },
                max_tokens: None,
            })
            .await
            .map_err(|e| AgentError::provider(component, e))?;

        if completion.tool_calls.is_empty() {
            return Ok(GeneratedText {
                text: completion.text,
                steps,
            });
        }

        messages.push(Message::Assistant {
            content: completion.text.clone(),
            tool_calls: completion.tool_calls.clone(),
        });

        let mut executed = Vec::new();
        let mut results = Vec::new();
        for call in completion.tool_calls {
            // Every call id needs an answer, even the ones over budget
            let result = if offer_tools && used < max_tool_steps {
                used += 1;
                debug!(component, turn, tool = %call.name, "tool call");
                let result = tools.call(&call).await;
                executed.push(call.clone());
                results.push(result.clone());
                result
            } else {
                ToolResult::error("Tool budget exhausted. Answer with what you have.")
            };
            messages.push(Message::Tool {
                call_id: call.id,
                name: call.name,
                content: result.to_value(),
            });
        }

        steps.push(AgentStep {
            text: completion.text,
            tool_calls: executed,
            tool_results: results,
        });
    }

    debug!(component, max_turns, "turn cap reached without a final answer");
    Ok(GeneratedText {
        text: String::new(),
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Completion;
    use crate::skills::tools::Tool;
    use crate::testing::MockModel;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Counter;

    #[async_trait]
    impl Tool for Counter {
        fn name(&self) -> &'static str {
            "count"
        }

        fn description(&self) -> &'static str {
            "Count"
        }

        fn parameters(&self) -> Value {
            json!({ "type": "object" })
        }

        async fn call(&self, _args: Value) -> ToolResult {
            ToolResult::success(json!(1))
        }
    }

    fn call(id: usize) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "count".into(),
            arguments: json!({}),
        }
    }

    fn request<'a>(tools: &'a ToolSet, max_tool_steps: usize) -> TextRequest<'a> {
        TextRequest {
            component: "test",
            system: "sys",
            prompt: "go".into(),
            tools,
            max_tool_steps,
        }
    }

    #[tokio::test]
    async fn test_answers_after_tool_use() {
        let model = MockModel::new("m").with_completion(|req| {
            if req.messages.len() == 1 {
                Ok(Completion {
                    text: String::new(),
                    tool_calls: vec![call(0)],
                })
            } else {
                Ok(Completion::text("done"))
            }
        });
        let tools = ToolSet::new().with_tool(Counter);
        let out = generate_text(&model, request(&tools, 3)).await.unwrap();
        assert_eq!(out.text, "done");
        assert_eq!(out.tool_invocations(), 1);
    }

    #[tokio::test]
    async fn test_budget_withholds_tools() {
        // Asks for two tools per turn until tools disappear
        let model = MockModel::new("m").with_completion(|req| {
            if req.tools.is_empty() {
                Ok(Completion::text("final"))
            } else {
                Ok(Completion {
                    text: String::new(),
                    tool_calls: vec![call(0), call(1)],
                })
            }
        });
        let tools = ToolSet::new().with_tool(Counter);
        let out = generate_text(&model, request(&tools, 3)).await.unwrap();
        assert_eq!(out.text, "final");
        assert_eq!(out.tool_invocations(), 3);

        let requests = model.completion_requests();
        assert!(requests.last().unwrap().tools.is_empty());
    }

    #[tokio::test]
    async fn test_turn_cap_ends_stubborn_model() {
        let model = MockModel::new("m").with_completion(|_| {
            Ok(Completion {
                text: "thinking".into(),
                tool_calls: vec![call(0)],
            })
        });
        let tools = ToolSet::new().with_tool(Counter);
        let out = generate_text(&model, request(&tools, 2)).await.unwrap();
        assert_eq!(out.text, "");
        assert_eq!(model.completion_requests().len(), 2 + EXTRA_TURNS);
        assert_eq!(out.tool_invocations(), 2);
        assert_eq!(out.texts_newest_first().next(), Some("thinking"));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let model = MockModel::new("m");
        let err = generate_text(&model, request(&ToolSet::new(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Provider { .. }));
    }
}
