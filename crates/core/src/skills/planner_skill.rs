//! # Planner Skill
//!
//! Decides which areas the enricher explores and which technologies get a
//! researcher. One structured call; a stack-derived plan when that fails.

use std::collections::HashSet;

use crate::error::{AgentError, AgentResult};
use crate::models::{generate_structured, LanguageModel};
use crate::skills::prompts;
use crate::state::{AnalysisPlan, Complexity, StackSummary};

const COMPONENT: &str = "planner";

/// Planning agent
pub struct PlannerSkill;

/// A plan, and the failure that forced the default plan if there was one
#[derive(Debug)]
pub struct PlannerOutcome {
    pub plan: AnalysisPlan,
    pub fallback_reason: Option<AgentError>,
}

impl PlannerSkill {
    /// Plan for `stack`, falling back to [`default_plan`] on any failure
    #[tracing::instrument(skip_all, fields(model = model.name()))]
    pub async fn run(
        model: &dyn LanguageModel,
        stack: &StackSummary,
        max_research_targets: usize,
    ) -> PlannerOutcome {
        match Self::try_run(model, stack, max_research_targets).await {
            Ok(plan) => PlannerOutcome {
                plan,
                fallback_reason: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Planner failed, using default plan");
                PlannerOutcome {
                    plan: default_plan(stack, max_research_targets),
                    fallback_reason: Some(e),
                }
            }
        }
    }

    async fn try_run(
        model: &dyn LanguageModel,
        stack: &StackSummary,
        max_research_targets: usize,
    ) -> AgentResult<AnalysisPlan> {
        let prompt = format!(
            "Detected stack:\n{}\nResearch at most {} technologies.",
            stack.to_summary(),
            max_research_targets
        );
        let plan: AnalysisPlan =
            generate_structured(model, COMPONENT, prompts::PLANNER, prompt).await?;
        Ok(sanitize(plan, max_research_targets))
    }
}

/// Trim entries, drop blanks and case-insensitive duplicates, cap the
/// research list
pub fn sanitize(plan: AnalysisPlan, max_research_targets: usize) -> AnalysisPlan {
    let mut technologies = dedup(plan.technologies_to_research);
    technologies.truncate(max_research_targets);

    AnalysisPlan {
        areas_to_explore: dedup(plan.areas_to_explore),
        technologies_to_research: technologies,
        questions_to_answer: dedup(plan.questions_to_answer),
        estimated_complexity: plan.estimated_complexity,
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

/// Plan derived only from stack facts
pub fn default_plan(stack: &StackSummary, max_research_targets: usize) -> AnalysisPlan {
    let technologies = [&stack.framework, &stack.database, &stack.testing]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    sanitize(
        AnalysisPlan {
            areas_to_explore: vec!["src/".to_string()],
            technologies_to_research: technologies,
            questions_to_answer: vec![
                "What is the main entry point of the application?".to_string(),
                "How is the source code organized?".to_string(),
                "How are tests written and run?".to_string(),
            ],
            estimated_complexity: Complexity::Medium,
        },
        max_research_targets,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnavailableModel;
    use crate::testing::MockModel;
    use serde_json::json;

    fn next_supabase() -> StackSummary {
        StackSummary {
            framework: Some("Next.js".into()),
            database: Some("Supabase".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fallback_plan_for_next_supabase() {
        let outcome = PlannerSkill::run(&UnavailableModel, &next_supabase(), 6).await;
        assert!(matches!(outcome.fallback_reason, Some(AgentError::Provider { .. })));
        let plan = outcome.plan;
        assert_eq!(plan.technologies_to_research, vec!["Next.js", "Supabase"]);
        assert_eq!(plan.estimated_complexity, Complexity::Medium);
        assert_eq!(plan.areas_to_explore, vec!["src/"]);
        assert_eq!(plan.questions_to_answer.len(), 3);
    }

    #[tokio::test]
    async fn test_model_plan_is_sanitized() {
        let model = MockModel::new("m").with_object(
            "AnalysisPlan",
            json!({
                "areasToExplore": ["src/app", " src/app ", ""],
                "technologiesToResearch": ["Next.js", "next.js", "Supabase", "Stripe", "Tailwind CSS"],
                "questionsToAnswer": ["Where are routes?"],
                "estimatedComplexity": "high"
            }),
        );
        let outcome = PlannerSkill::run(&model, &next_supabase(), 3).await;
        assert!(outcome.fallback_reason.is_none());
        let plan = outcome.plan;
        assert_eq!(plan.areas_to_explore, vec!["src/app"]);
        assert_eq!(plan.technologies_to_research, vec!["Next.js", "Supabase", "Stripe"]);
        assert_eq!(plan.estimated_complexity, Complexity::High);
    }

    #[test]
    fn test_default_plan_without_facts() {
        let plan = default_plan(&StackSummary::default(), 6);
        assert!(plan.technologies_to_research.is_empty());
        assert_eq!(plan.estimated_complexity, Complexity::Medium);
    }
}
