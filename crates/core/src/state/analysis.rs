//! # Analysis Types
//!
//! Every value that flows between pipeline phases, from the plan to the
//! final [`MultiAgentAnalysis`] handed to the generator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Complexity estimate from the planner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

/// Output of the planning phase. Immutable once created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPlan {
    /// Directories or concerns the enricher should explore
    #[serde(default)]
    pub areas_to_explore: Vec<String>,
    /// One researcher is spawned per entry
    #[serde(default)]
    pub technologies_to_research: Vec<String>,
    /// Open questions the enricher should answer
    #[serde(default)]
    pub questions_to_answer: Vec<String>,
    #[serde(default)]
    pub estimated_complexity: Complexity,
}

/// Repository knowledge gathered by the context enricher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrichedContext {
    pub entry_points: Vec<String>,
    /// path -> purpose
    pub key_directories: BTreeMap<String, String>,
    pub naming_conventions: String,
    /// name -> shell command
    pub commands: BTreeMap<String, String>,
    /// question -> answer
    pub answered_questions: BTreeMap<String, String>,
    pub project_type: String,
}

/// Which optional research tools are available for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResearchMode {
    /// Web search and documentation lookup
    Full,
    WebOnly,
    DocsOnly,
    /// Model knowledge only
    KnowledgeOnly,
}

impl ResearchMode {
    pub fn from_flags(web_search: bool, docs_lookup: bool) -> Self {
        match (web_search, docs_lookup) {
            (true, true) => ResearchMode::Full,
            (true, false) => ResearchMode::WebOnly,
            (false, true) => ResearchMode::DocsOnly,
            (false, false) => ResearchMode::KnowledgeOnly,
        }
    }

    pub fn uses_web_search(&self) -> bool {
        matches!(self, ResearchMode::Full | ResearchMode::WebOnly)
    }

    pub fn uses_docs_lookup(&self) -> bool {
        matches!(self, ResearchMode::Full | ResearchMode::DocsOnly)
    }
}

impl fmt::Display for ResearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResearchMode::Full => "full",
            ResearchMode::WebOnly => "web-only",
            ResearchMode::DocsOnly => "docs-only",
            ResearchMode::KnowledgeOnly => "knowledge-only",
        })
    }
}

/// Findings of one tech researcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TechResearchResult {
    pub technology: String,
    #[serde(default)]
    pub best_practices: Vec<String>,
    #[serde(default)]
    pub anti_patterns: Vec<String>,
    #[serde(default)]
    pub testing_tips: Vec<String>,
    #[serde(default)]
    pub documentation_hints: Vec<String>,
    pub research_mode: ResearchMode,
}

/// Deterministic capability lookup for a stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRecommendations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e2e_testing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default)]
    pub additional: Vec<String>,
}

/// Scored review of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// 1 (unusable) to 10 (excellent)
    pub quality_score: u8,
    pub has_entry_points: bool,
    pub has_implementation_guidelines: bool,
    pub has_relevant_recommendations: bool,
    #[serde(default)]
    pub specific_issues: Vec<String>,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
}

/// Where the project starts and how it is laid out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectContext {
    pub entry_points: Vec<String>,
    pub key_directories: BTreeMap<String, String>,
    pub naming_conventions: String,
    pub project_type: String,
    pub answered_questions: BTreeMap<String, String>,
}

/// Integration servers to install, split by priority
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilitySet {
    pub essential: Vec<String>,
    pub recommended: Vec<String>,
}

impl CapabilitySet {
    pub fn is_empty(&self) -> bool {
        self.essential.is_empty() && self.recommended.is_empty()
    }
}

/// Final artifact of the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MultiAgentAnalysis {
    pub project_context: ProjectContext,
    pub commands: BTreeMap<String, String>,
    pub implementation_guidelines: Vec<String>,
    pub possible_missed_technologies: Vec<String>,
    pub stack_research: Vec<TechResearchResult>,
    pub capability_recommendations: CapabilitySet,
}
