//! # Agent Errors
//!
//! Typed failures returned by skills. The coordinator converts every one of
//! these into a deterministic fallback, so none of them reach the caller of
//! [`crate::swarm::Coordinator::run`].

use thiserror::Error;

/// Failure of a single agent call
#[derive(Debug, Error)]
pub enum AgentError {
    /// Network, auth, rate-limit or timeout failure from the model provider
    #[error("{component}: provider call failed: {reason}")]
    Provider { component: String, reason: String },

    /// The model answered, but nothing usable could be parsed from it
    #[error("{component}: malformed output: {reason}")]
    MalformedOutput { component: String, reason: String },

    /// A tool backend failed in a way the agent could not recover from
    #[error("{component}: tool failure: {reason}")]
    Tool { component: String, reason: String },

    /// The task running the agent was cancelled or panicked
    #[error("{component}: task failed: {reason}")]
    Task { component: String, reason: String },
}

impl AgentError {
    pub fn provider(component: &str, reason: impl ToString) -> Self {
        Self::Provider {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(component: &str, reason: impl ToString) -> Self {
        Self::MalformedOutput {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn tool(component: &str, reason: impl ToString) -> Self {
        Self::Tool {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn task(component: &str, reason: impl ToString) -> Self {
        Self::Task {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Component that raised the error
    pub fn component(&self) -> &str {
        match self {
            Self::Provider { component, .. }
            | Self::MalformedOutput { component, .. }
            | Self::Tool { component, .. }
            | Self::Task { component, .. } => component,
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_component() {
        let err = AgentError::provider("planner", "401 unauthorized");
        assert_eq!(err.component(), "planner");
        assert!(err.to_string().contains("401 unauthorized"));
    }
}
