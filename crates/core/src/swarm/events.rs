//! # Pipeline Events
//!
//! Timestamped record of what happened during a run: phase boundaries,
//! fallbacks, agent failures and quality-gate decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of pipeline event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEventKind {
    /// Pipeline started
    PipelineStarted,
    /// Phase started
    PhaseStarted,
    /// Phase completed
    PhaseCompleted,
    /// Agent failed; its slot is empty or replaced
    AgentFailed,
    /// Deterministic fallback used in place of model output
    FallbackUsed,
    /// Quality gate evaluated
    GateEvaluated,
    /// Optimizer patch merged into the artifact
    OptimizerApplied,
    /// Pipeline completed
    PipelineCompleted,
    /// Pipeline body failed; the default analysis was returned
    PipelineFailed,
}

/// An event in the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Position in the run, starting at 0
    pub seq: usize,
    pub timestamp: DateTime<Utc>,
    pub kind: PipelineEventKind,
    /// Agent or phase that produced this event
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Append-only event list for one run
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<PipelineEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, kind: PipelineEventKind, agent: &str) {
        self.push(kind, agent, None);
    }

    pub fn emit_with(&mut self, kind: PipelineEventKind, agent: &str, data: serde_json::Value) {
        self.push(kind, agent, Some(data));
    }

    fn push(&mut self, kind: PipelineEventKind, agent: &str, data: Option<serde_json::Value>) {
        self.events.push(PipelineEvent {
            seq: self.events.len(),
            timestamp: Utc::now(),
            kind,
            agent: agent.to_string(),
            data,
        });
    }

    pub fn count(&self, kind: PipelineEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn into_events(self) -> Vec<PipelineEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_sequenced() {
        let mut log = EventLog::new();
        log.emit(PipelineEventKind::PipelineStarted, "coordinator");
        log.emit_with(
            PipelineEventKind::AgentFailed,
            "tech_researcher",
            serde_json::json!({ "error": "timeout" }),
        );

        assert_eq!(log.count(PipelineEventKind::AgentFailed), 1);
        let events = log.into_events();
        assert_eq!(events[1].seq, 1);
        assert_eq!(events[1].agent, "tech_researcher");
        assert!(events[0].timestamp <= events[1].timestamp);
    }

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&PipelineEventKind::GateEvaluated).unwrap();
        assert_eq!(json, "\"gate_evaluated\"");
    }
}
