//! # Optimizer Skill
//!
//! Turns evaluator feedback into an additive [`OptimizerPatch`] and merges
//! it into the artifact. The merge only adds or replaces; accepted content
//! is never dropped.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AgentError, AgentResult};
use crate::models::{generate_structured, LanguageModel};
use crate::skills::prompts;
use crate::state::{EvaluationResult, MultiAgentAnalysis, StackSummary};
use crate::tools::validation::{
    clean_guidelines, filter_entry_points, normalize_recommendation, normalize_recommendations,
};

const COMPONENT: &str = "optimizer";

/// Changes proposed by the optimizer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizerPatch {
    /// Full replacement list; empty keeps the current guidelines
    pub implementation_guidelines: Vec<String>,
    pub additional_entry_points: Vec<String>,
    /// Integration names as single lowercase tokens
    pub additional_recommendations: Vec<String>,
    /// path -> purpose
    pub additional_key_directories: BTreeMap<String, String>,
}

/// Optimizer agent
pub struct OptimizerSkill;

impl OptimizerSkill {
    #[tracing::instrument(skip_all, fields(model = model.name(), score = evaluation.quality_score))]
    pub async fn run(
        model: &dyn LanguageModel,
        artifact: &MultiAgentAnalysis,
        evaluation: &EvaluationResult,
        stack: &StackSummary,
    ) -> AgentResult<OptimizerPatch> {
        let document = serde_json::to_string_pretty(artifact)
            .map_err(|e| AgentError::malformed(COMPONENT, e))?;
        let feedback = serde_json::to_string_pretty(evaluation)
            .map_err(|e| AgentError::malformed(COMPONENT, e))?;
        let prompt = format!(
            "Detected stack:\n{}\nCurrent document:\n{}\n\nReviewer feedback:\n{}",
            stack.to_summary(),
            document,
            feedback
        );

        generate_structured(model, COMPONENT, prompts::OPTIMIZER, prompt).await
    }
}

/// Merge `patch` into `artifact`. Returns whether anything changed.
pub fn apply_patch(artifact: &mut MultiAgentAnalysis, patch: OptimizerPatch) -> bool {
    let mut changed = false;

    let guidelines = clean_guidelines(patch.implementation_guidelines);
    if !guidelines.is_empty() && guidelines != artifact.implementation_guidelines {
        artifact.implementation_guidelines = guidelines;
        changed = true;
    }

    let context = &mut artifact.project_context;
    let merged = filter_entry_points(
        context
            .entry_points
            .iter()
            .chain(patch.additional_entry_points.iter()),
    );
    if merged != context.entry_points {
        context.entry_points = merged;
        changed = true;
    }

    for (path, purpose) in patch.additional_key_directories {
        let (path, purpose) = (path.trim().to_string(), purpose.trim().to_string());
        if path.is_empty() || context.key_directories.contains_key(&path) {
            continue;
        }
        context.key_directories.insert(path, purpose);
        changed = true;
    }

    let capabilities = &mut artifact.capability_recommendations;
    for name in normalize_recommendations(&patch.additional_recommendations) {
        let known = capabilities
            .essential
            .iter()
            .chain(capabilities.recommended.iter())
            .any(|existing| normalize_recommendation(existing) == name);
        if !known {
            capabilities.recommended.push(name);
            changed = true;
        }
    }

    changed
}
