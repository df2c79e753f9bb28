//! # Swarm Orchestration
//!
//! Coordinates the analysis pipeline.
//!
//! ## Pipeline Flow
//!
//! ```text
//! Stack → Planner → [Enricher ∥ Researcher × N] → Synthesis → Evaluator ⟷ Optimizer
//! ```

pub mod coordinator;
pub mod events;
pub mod pipeline;
pub mod quality_loop;
pub mod worker_pool;

pub use coordinator::{Coordinator, CoordinatorConfig, PipelineReport, ProgressCallback};
pub use events::{EventLog, PipelineEvent, PipelineEventKind};
pub use pipeline::{Pipeline, PipelinePhase};
pub use quality_loop::{passes_gate, run_quality_loop, QualityOutcome, QualitySettings};
pub use worker_pool::{Settled, WorkerPool};
