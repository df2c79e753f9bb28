//! # Quality Loop
//!
//! Evaluator-optimizer state machine. Each cycle evaluates the artifact and
//! exits as soon as the gate passes; otherwise the optimizer patches the
//! artifact. At most `max_iterations` optimizer calls are made, and the
//! latest artifact is returned whatever happens.

use serde::Serialize;

use super::events::{EventLog, PipelineEventKind};
use crate::models::LanguageModel;
use crate::skills::evaluator_skill::{fail_closed_evaluation, fail_open_evaluation};
use crate::skills::optimizer_skill::apply_patch;
use crate::skills::{EvaluatorSkill, OptimizerSkill};
use crate::state::{EvaluationResult, MultiAgentAnalysis, StackSummary};
use crate::tools::validation::is_path_like;

/// Loop settings, taken from [`super::CoordinatorConfig`]
#[derive(Debug, Clone, Copy)]
pub struct QualitySettings {
    pub max_iterations: usize,
    pub quality_threshold: u8,
    pub evaluator_fail_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Evaluating,
    Optimizing,
    Done,
}

/// What the loop did
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityOutcome {
    #[serde(skip)]
    pub artifact: MultiAgentAnalysis,
    pub passed: bool,
    pub evaluations: usize,
    pub optimizations: usize,
    pub last_evaluation: Option<EvaluationResult>,
}

/// Gate: score at threshold, entry points present and all path-shaped,
/// guidelines present
pub fn passes_gate(
    evaluation: &EvaluationResult,
    artifact: &MultiAgentAnalysis,
    quality_threshold: u8,
) -> bool {
    evaluation.quality_score >= quality_threshold
        && evaluation.has_entry_points
        && artifact
            .project_context
            .entry_points
            .iter()
            .all(|entry| is_path_like(entry))
        && evaluation.has_implementation_guidelines
}

/// Run the loop. Never fails.
#[tracing::instrument(skip_all, fields(max_iterations = settings.max_iterations))]
pub async fn run_quality_loop(
    evaluator: &dyn LanguageModel,
    optimizer: &dyn LanguageModel,
    stack: &StackSummary,
    artifact: MultiAgentAnalysis,
    settings: QualitySettings,
    events: &mut EventLog,
) -> QualityOutcome {
    let mut outcome = QualityOutcome {
        artifact,
        passed: false,
        evaluations: 0,
        optimizations: 0,
        last_evaluation: None,
    };
    let mut state = LoopState::Evaluating;

    while state != LoopState::Done {
        state = match state {
            LoopState::Evaluating => {
                let evaluation = evaluate(evaluator, stack, &outcome.artifact, settings, events).await;
                outcome.evaluations += 1;

                let passed = passes_gate(&evaluation, &outcome.artifact, settings.quality_threshold);
                tracing::debug!(score = evaluation.quality_score, passed, "Quality gate");
                events.emit_with(
                    PipelineEventKind::GateEvaluated,
                    "evaluator",
                    serde_json::json!({ "score": evaluation.quality_score, "passed": passed }),
                );
                outcome.passed = passed;
                outcome.last_evaluation = Some(evaluation);

                if passed || outcome.optimizations >= settings.max_iterations {
                    LoopState::Done
                } else {
                    LoopState::Optimizing
                }
            }
            LoopState::Optimizing => {
                // Only reachable after an evaluation
                if let Some(evaluation) = outcome.last_evaluation.as_ref() {
                    match OptimizerSkill::run(optimizer, &outcome.artifact, evaluation, stack).await {
                        Ok(patch) => {
                            let changed = apply_patch(&mut outcome.artifact, patch);
                            events.emit_with(
                                PipelineEventKind::OptimizerApplied,
                                "optimizer",
                                serde_json::json!({ "changed": changed }),
                            );
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Optimizer failed, keeping artifact");
                            events.emit_with(
                                PipelineEventKind::AgentFailed,
                                "optimizer",
                                serde_json::json!({ "error": e.to_string() }),
                            );
                        }
                    }
                }
                outcome.optimizations += 1;

                if outcome.optimizations < settings.max_iterations {
                    LoopState::Evaluating
                } else {
                    LoopState::Done
                }
            }
            LoopState::Done => LoopState::Done,
        };
    }

    outcome
}

async fn evaluate(
    model: &dyn LanguageModel,
    stack: &StackSummary,
    artifact: &MultiAgentAnalysis,
    settings: QualitySettings,
    events: &mut EventLog,
) -> EvaluationResult {
    match EvaluatorSkill::run(model, artifact, stack).await {
        Ok(evaluation) => evaluation,
        Err(e) => {
            tracing::warn!(
                error = %e,
                fail_open = settings.evaluator_fail_open,
                "Evaluator failed"
            );
            events.emit_with(
                PipelineEventKind::FallbackUsed,
                "evaluator",
                serde_json::json!({ "error": e.to_string(), "failOpen": settings.evaluator_fail_open }),
            );
            if settings.evaluator_fail_open {
                fail_open_evaluation(artifact)
            } else {
                fail_closed_evaluation()
            }
        }
    }
}
