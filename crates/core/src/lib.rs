//! # devcontext Core
//!
//! Multi-agent pipeline that turns a detected tech stack into a development
//! context document for coding agents.
//!
//! ## Architecture
//!
//! - `skills/` - Agents (planner, enricher, researcher, evaluator, optimizer) and their tools
//! - `models` - The `LanguageModel` seam and per-agent model routing
//! - `state/` - Data flowing between phases, plus tolerant JSON extraction
//! - `swarm/` - Coordinator, worker pool and quality loop
//! - `tools/` - Deterministic lookups and validation ("Code > Agents")
//!
//! ## Usage
//!
//! ```rust,ignore
//! use devcontext_core::swarm::{Coordinator, CoordinatorConfig};
//!
//! let coordinator = Coordinator::new(CoordinatorConfig::default(), model)
//!     .with_research_capabilities(ResearchCapabilities::from_env());
//! let analysis = coordinator.run(&stack).await;
//! ```

pub mod error;
pub mod models;
pub mod skills;
pub mod state;
pub mod swarm;
pub mod tools;

#[cfg(test)]
mod testing;

pub use error::{AgentError, AgentResult};
pub use state::{MultiAgentAnalysis, StackSummary};
pub use swarm::{Coordinator, CoordinatorConfig};
