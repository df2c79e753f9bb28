//! # Skills
//!
//! The agents of the analysis pipeline and the tools they call.
//!
//! ## Architecture
//!
//! ```text
//! Coordinator
//!   └── Skills (SDK-style `run` functions)
//!         ├── agent_loop (tool-calling turns)
//!         └── tools (repository + research tools)
//! ```
//!
//! ## Skill Categories
//!
//! **Model-backed:**
//! - `PlannerSkill` - Decide what to explore and research
//! - `EnricherSkill` - Explore the repository with tools
//! - `ResearcherSkill` - Research one technology per mode
//! - `EvaluatorSkill` - Score the artifact
//! - `OptimizerSkill` - Additive fixes from feedback
//!
//! **Deterministic:**
//! - `synthesis_skill` - Merge worker output into the artifact

pub mod agent_loop;
pub mod prompts;
pub mod tools;

pub mod enricher_skill;
pub mod evaluator_skill;
pub mod optimizer_skill;
pub mod planner_skill;
pub mod researcher_skill;
pub mod synthesis_skill;

pub use enricher_skill::EnricherSkill;
pub use evaluator_skill::EvaluatorSkill;
pub use optimizer_skill::{OptimizerPatch, OptimizerSkill};
pub use planner_skill::{PlannerOutcome, PlannerSkill};
pub use researcher_skill::{ResearchTask, ResearcherSkill};
pub use synthesis_skill::{default_analysis, synthesize, SynthesisInput};
