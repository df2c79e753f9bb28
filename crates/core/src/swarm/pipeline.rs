//! # Pipeline Phases
//!
//! The four phases of an analysis run, in order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    /// Deciding what to explore and research
    Planning,
    /// Enricher and researchers running concurrently
    Workers,
    /// Deterministic merge
    Synthesis,
    /// Evaluator-optimizer loop
    Quality,
    Complete,
}

impl PipelinePhase {
    /// Label passed to the progress callback
    pub fn label(&self) -> &'static str {
        match self {
            PipelinePhase::Planning => "Planning",
            PipelinePhase::Workers => "Workers",
            PipelinePhase::Synthesis => "Synthesis",
            PipelinePhase::Quality => "Quality",
            PipelinePhase::Complete => "Complete",
        }
    }

    pub fn next(&self) -> PipelinePhase {
        match self {
            PipelinePhase::Planning => PipelinePhase::Workers,
            PipelinePhase::Workers => PipelinePhase::Synthesis,
            PipelinePhase::Synthesis => PipelinePhase::Quality,
            PipelinePhase::Quality | PipelinePhase::Complete => PipelinePhase::Complete,
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tracks the current phase
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub phase: PipelinePhase,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            phase: PipelinePhase::Planning,
        }
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next phase
    pub fn advance(&mut self) {
        self.phase = self.phase.next();
    }

    pub fn is_complete(&self) -> bool {
        self.phase == PipelinePhase::Complete
    }
}
