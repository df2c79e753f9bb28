pub mod analysis;
pub mod json;
pub mod stack_summary;

pub use analysis::{
    AnalysisPlan, CapabilityRecommendations, CapabilitySet, Complexity, EnrichedContext,
    EvaluationResult, MultiAgentAnalysis, ProjectContext, ResearchMode, TechResearchResult,
};
pub use stack_summary::{PackageManifest, StackSummary};
