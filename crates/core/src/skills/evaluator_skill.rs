//! # Evaluator Skill
//!
//! Scores an artifact with one structured call. When that call fails the
//! quality loop substitutes [`fail_open_evaluation`] or
//! [`fail_closed_evaluation`], depending on configuration.

use crate::error::{AgentError, AgentResult};
use crate::models::{generate_structured, LanguageModel};
use crate::skills::prompts;
use crate::state::{EvaluationResult, MultiAgentAnalysis, StackSummary};

const COMPONENT: &str = "evaluator";

/// Score assumed when the evaluator is unavailable and the loop fails open
pub const FAIL_OPEN_SCORE: u8 = 7;

/// Evaluator agent
pub struct EvaluatorSkill;

impl EvaluatorSkill {
    #[tracing::instrument(skip_all, fields(model = model.name()))]
    pub async fn run(
        model: &dyn LanguageModel,
        artifact: &MultiAgentAnalysis,
        stack: &StackSummary,
    ) -> AgentResult<EvaluationResult> {
        let document = serde_json::to_string_pretty(artifact)
            .map_err(|e| AgentError::malformed(COMPONENT, e))?;
        let prompt = format!(
            "Detected stack:\n{}\nDevelopment context document:\n{}",
            stack.to_summary(),
            document
        );

        let mut evaluation: EvaluationResult =
            generate_structured(model, COMPONENT, prompts::EVALUATOR, prompt).await?;
        evaluation.quality_score = evaluation.quality_score.clamp(1, 10);
        Ok(evaluation)
    }
}

/// Passing score with the booleans read off the artifact itself
pub fn fail_open_evaluation(artifact: &MultiAgentAnalysis) -> EvaluationResult {
    EvaluationResult {
        quality_score: FAIL_OPEN_SCORE,
        has_entry_points: !artifact.project_context.entry_points.is_empty(),
        has_implementation_guidelines: !artifact.implementation_guidelines.is_empty(),
        has_relevant_recommendations: !artifact.capability_recommendations.is_empty(),
        specific_issues: Vec::new(),
        improvement_suggestions: Vec::new(),
    }
}

/// Failing evaluation used when the loop is configured to fail closed
pub fn fail_closed_evaluation() -> EvaluationResult {
    EvaluationResult {
        quality_score: 1,
        has_entry_points: false,
        has_implementation_guidelines: false,
        has_relevant_recommendations: false,
        specific_issues: vec!["Evaluation unavailable".to_string()],
        improvement_suggestions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnavailableModel;
    use crate::testing::MockModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_score_is_clamped() {
        let model = MockModel::new("m").with_object(
            "EvaluationResult",
            json!({
                "qualityScore": 42,
                "hasEntryPoints": true,
                "hasImplementationGuidelines": true,
                "hasRelevantRecommendations": false
            }),
        );
        let evaluation = EvaluatorSkill::run(&model, &MultiAgentAnalysis::default(), &StackSummary::default())
            .await
            .unwrap();
        assert_eq!(evaluation.quality_score, 10);
        assert!(evaluation.specific_issues.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_error() {
        assert!(EvaluatorSkill::run(
            &UnavailableModel,
            &MultiAgentAnalysis::default(),
            &StackSummary::default()
        )
        .await
        .is_err());
    }

    #[test]
    fn test_fail_open_reads_artifact() {
        let mut artifact = MultiAgentAnalysis::default();
        artifact.project_context.entry_points = vec!["src/main.ts".into()];
        let evaluation = fail_open_evaluation(&artifact);
        assert_eq!(evaluation.quality_score, 7);
        assert!(evaluation.has_entry_points);
        assert!(!evaluation.has_implementation_guidelines);
        assert!(!evaluation.has_relevant_recommendations);
    }
}
