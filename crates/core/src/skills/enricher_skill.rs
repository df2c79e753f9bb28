//! # Context Enricher Skill
//!
//! Explores the repository with read-only tools and reports entry points,
//! directory purposes, conventions and commands. The answer is free text
//! expected to hold a JSON object; see [`crate::state::json`].

use std::collections::BTreeMap;

use crate::error::{AgentError, AgentResult};
use crate::models::LanguageModel;
use crate::skills::agent_loop::{generate_text, TextRequest};
use crate::skills::prompts;
use crate::skills::tools::ToolSet;
use crate::state::{json, AnalysisPlan, EnrichedContext, StackSummary};
use crate::tools::validation::filter_entry_points;

const COMPONENT: &str = "context_enricher";

/// Context enricher agent
pub struct EnricherSkill;

impl EnricherSkill {
    #[tracing::instrument(skip_all, fields(model = model.name(), tools = ?tools))]
    pub async fn run(
        model: &dyn LanguageModel,
        stack: &StackSummary,
        plan: &AnalysisPlan,
        tools: &ToolSet,
        max_tool_steps: usize,
    ) -> AgentResult<EnrichedContext> {
        let generated = generate_text(
            model,
            TextRequest {
                component: COMPONENT,
                system: prompts::CONTEXT_ENRICHER,
                prompt: build_prompt(stack, plan),
                tools,
                max_tool_steps,
            },
        )
        .await?;

        tracing::debug!(
            tool_invocations = generated.tool_invocations(),
            "Enricher finished exploring"
        );

        let context = generated
            .texts_newest_first()
            .find_map(json::extract::<EnrichedContext>)
            .ok_or_else(|| AgentError::malformed(COMPONENT, "no JSON object in answer"))?;

        Ok(complete_from_stack(context, stack))
    }
}

fn build_prompt(stack: &StackSummary, plan: &AnalysisPlan) -> String {
    let mut prompt = format!("Detected stack:\n{}\n", stack.to_summary());

    if !plan.areas_to_explore.is_empty() {
        prompt.push_str("Areas to explore:\n");
        for area in &plan.areas_to_explore {
            prompt.push_str(&format!("- {}\n", area));
        }
    }
    if !plan.questions_to_answer.is_empty() {
        prompt.push_str("Questions to answer:\n");
        for question in &plan.questions_to_answer {
            prompt.push_str(&format!("- {}\n", question));
        }
    }

    prompt
}

/// Clean the model's answer and fill gaps the manifest can answer
fn complete_from_stack(context: EnrichedContext, stack: &StackSummary) -> EnrichedContext {
    let fallback = fallback_context(stack);

    let mut entry_points = filter_entry_points(&context.entry_points);
    if entry_points.is_empty() {
        entry_points = fallback.entry_points;
    }

    let mut commands: BTreeMap<String, String> = context
        .commands
        .into_iter()
        .map(|(name, command)| (name.trim().to_string(), command.trim().to_string()))
        .filter(|(name, command)| !name.is_empty() && !command.is_empty())
        .collect();
    for (name, command) in fallback.commands {
        commands.entry(name).or_insert(command);
    }

    let project_type = if context.project_type.trim().is_empty() {
        fallback.project_type
    } else {
        context.project_type.trim().to_string()
    };

    EnrichedContext {
        entry_points,
        key_directories: context.key_directories,
        naming_conventions: context.naming_conventions.trim().to_string(),
        commands,
        answered_questions: context.answered_questions,
        project_type,
    }
}

/// Context derived only from the manifest: entry points from `main`,
/// `module` and `bin`, commands from `scripts`
pub fn fallback_context(stack: &StackSummary) -> EnrichedContext {
    let manifest = &stack.manifest;
    let candidates = manifest
        .main
        .iter()
        .chain(manifest.module.iter())
        .chain(manifest.bin.values());

    let commands = manifest
        .scripts
        .keys()
        .map(|name| (name.clone(), stack.script_command(name)))
        .collect();

    let project_type = match stack.framework.as_deref().map(str::trim) {
        Some(framework) if !framework.is_empty() => format!("{} application", framework),
        _ => "application".to_string(),
    };

    EnrichedContext {
        entry_points: filter_entry_points(candidates),
        key_directories: BTreeMap::new(),
        naming_conventions: String::new(),
        commands,
        answered_questions: BTreeMap::new(),
        project_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Completion, UnavailableModel};
    use crate::state::PackageManifest;
    use crate::testing::MockModel;

    fn stack() -> StackSummary {
        let mut scripts = BTreeMap::new();
        scripts.insert("dev".to_string(), "next dev".to_string());
        scripts.insert("test".to_string(), "vitest".to_string());
        let mut bin = BTreeMap::new();
        bin.insert("cli".to_string(), "bin/cli.js".to_string());
        StackSummary {
            framework: Some("Next.js".into()),
            package_manager: Some("pnpm".into()),
            manifest: PackageManifest {
                main: Some("dist/index.js".into()),
                bin,
                scripts,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_fallback_context_from_manifest() {
        let context = fallback_context(&stack());
        assert_eq!(context.entry_points, vec!["dist/index.js", "bin/cli.js"]);
        assert_eq!(context.commands["dev"], "pnpm dev");
        assert_eq!(context.commands["test"], "pnpm test");
        assert_eq!(context.project_type, "Next.js application");
    }

    #[tokio::test]
    async fn test_parses_fenced_answer_and_filters_entry_points() {
        let model = MockModel::new("m").with_completion(|_| {
            Ok(Completion::text(
                "Here is what I found:\n```json\n{\"entryPoints\": [\"src/app/page.tsx\", \"Check the README\"], \
                 \"keyDirectories\": {\"src/app\": \"routes\"}, \"commands\": {\"lint\": \"pnpm lint\"},}\n```",
            ))
        });
        let context = EnricherSkill::run(&model, &stack(), &AnalysisPlan::default(), &ToolSet::new(), 4)
            .await
            .unwrap();
        assert_eq!(context.entry_points, vec!["src/app/page.tsx"]);
        assert_eq!(context.key_directories["src/app"], "routes");
        assert_eq!(context.commands["lint"], "pnpm lint");
        // manifest scripts fill in what the model left out
        assert_eq!(context.commands["dev"], "pnpm dev");
    }

    #[tokio::test]
    async fn test_unusable_answer_is_malformed() {
        let model = MockModel::new("m").with_completion(|_| Ok(Completion::text("I could not tell.")));
        let err = EnricherSkill::run(&model, &stack(), &AnalysisPlan::default(), &ToolSet::new(), 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn test_provider_failure_is_error() {
        let err = EnricherSkill::run(
            &UnavailableModel,
            &stack(),
            &AnalysisPlan::default(),
            &ToolSet::new(),
            4,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AgentError::Provider { .. }));
    }
}
