//! # Synthesis Skill
//!
//! Deterministic merge of worker output into the final
//! [`MultiAgentAnalysis`]. No model call happens here; this is where model
//! output gets validated before it reaches the artifact.

use std::collections::BTreeMap;

use crate::skills::enricher_skill::fallback_context;
use crate::state::{
    AnalysisPlan, CapabilityRecommendations, CapabilitySet, EnrichedContext, MultiAgentAnalysis,
    ProjectContext, StackSummary, TechResearchResult,
};
use crate::tools::validation::{clean_guidelines, filter_entry_points, normalize_recommendations};
use crate::tools::CapabilityResolver;

/// Always the last guideline when none came from research
pub const GENERIC_GUIDELINE: &str =
    "Follow the existing project structure and conventions when adding new code.";

/// Script names whose commands become guidelines, with the advice attached
const COMMAND_GUIDELINES: &[(&str, &str)] = &[
    ("test", "Run `{}` and keep the test suite passing before committing."),
    ("build", "Make sure `{}` succeeds before opening a pull request."),
    ("lint", "Run `{}` and fix reported issues."),
    ("typecheck", "Run `{}` to catch type errors early."),
];

/// Everything the merge reads
pub struct SynthesisInput<'a> {
    pub stack: &'a StackSummary,
    pub plan: &'a AnalysisPlan,
    pub context: &'a EnrichedContext,
    pub research: &'a [TechResearchResult],
    pub capabilities: &'a CapabilityRecommendations,
}

/// Build the artifact from worker output
#[tracing::instrument(skip_all, fields(research = input.research.len()))]
pub fn synthesize(input: SynthesisInput<'_>) -> MultiAgentAnalysis {
    let context = input.context;

    let mut guidelines = clean_guidelines(research_guidelines(input.research, context));
    if guidelines.is_empty() {
        tracing::debug!("No researched guidelines, deriving from commands");
        guidelines = derived_guidelines(&context.commands);
    }

    let possible_missed_technologies = input
        .plan
        .technologies_to_research
        .iter()
        .filter(|tech| !input.stack.mentions(tech))
        .cloned()
        .collect();

    MultiAgentAnalysis {
        project_context: ProjectContext {
            entry_points: filter_entry_points(&context.entry_points),
            key_directories: context.key_directories.clone(),
            naming_conventions: context.naming_conventions.clone(),
            project_type: context.project_type.clone(),
            answered_questions: context.answered_questions.clone(),
        },
        commands: context.commands.clone(),
        implementation_guidelines: guidelines,
        possible_missed_technologies,
        stack_research: input.research.to_vec(),
        capability_recommendations: capability_set(input.capabilities),
    }
}

fn research_guidelines(research: &[TechResearchResult], context: &EnrichedContext) -> Vec<String> {
    let mut guidelines: Vec<String> = research
        .iter()
        .flat_map(|r| {
            r.best_practices
                .iter()
                .map(move |practice| format!("{}: {}", r.technology, practice.trim()))
        })
        .collect();

    let conventions = context.naming_conventions.trim();
    if !conventions.is_empty() {
        guidelines.push(format!("Follow the naming conventions: {}", conventions));
    }
    guidelines
}

/// Guidelines from test/build/lint commands, ending with [`GENERIC_GUIDELINE`]
pub fn derived_guidelines(commands: &BTreeMap<String, String>) -> Vec<String> {
    let mut guidelines: Vec<String> = COMMAND_GUIDELINES
        .iter()
        .filter_map(|(script, template)| {
            commands
                .get(*script)
                .filter(|cmd| !cmd.trim().is_empty())
                .map(|cmd| template.replace("{}", cmd.trim()))
        })
        .collect();
    guidelines.push(GENERIC_GUIDELINE.to_string());
    guidelines
}

/// Database and e2e capabilities are essential, the rest recommended.
/// Names are normalized and unique across both lists.
pub fn capability_set(recommendations: &CapabilityRecommendations) -> CapabilitySet {
    let essential = normalize_recommendations(
        recommendations
            .database
            .iter()
            .chain(recommendations.e2e_testing.iter()),
    );
    let recommended = normalize_recommendations(&recommendations.additional)
        .into_iter()
        .filter(|name| !essential.contains(name))
        .collect();

    CapabilitySet {
        essential,
        recommended,
    }
}

/// Artifact derived only from stack and manifest facts
pub fn default_analysis(stack: &StackSummary) -> MultiAgentAnalysis {
    default_analysis_with(stack, &CapabilityResolver::default())
}

pub fn default_analysis_with(
    stack: &StackSummary,
    resolver: &CapabilityResolver,
) -> MultiAgentAnalysis {
    let context = fallback_context(stack);
    let capabilities = resolver.resolve(stack);
    synthesize(SynthesisInput {
        stack,
        plan: &AnalysisPlan::default(),
        context: &context,
        research: &[],
        capabilities: &capabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PackageManifest, ResearchMode};

    fn stack() -> StackSummary {
        let mut scripts = BTreeMap::new();
        scripts.insert("build".to_string(), "next build".to_string());
        scripts.insert("test".to_string(), "vitest".to_string());
        StackSummary {
            framework: Some("Next.js".into()),
            database: Some("Supabase".into()),
            deployment: Some("Vercel".into()),
            manifest: PackageManifest {
                main: Some("src/index.ts".into()),
                scripts,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn research(tech: &str, practices: &[&str]) -> TechResearchResult {
        TechResearchResult {
            technology: tech.to_string(),
            best_practices: practices.iter().map(|p| p.to_string()).collect(),
            anti_patterns: Vec::new(),
            testing_tips: Vec::new(),
            documentation_hints: Vec::new(),
            research_mode: ResearchMode::KnowledgeOnly,
        }
    }

    #[test]
    fn test_synthesize_merges_and_validates() {
        let context = EnrichedContext {
            entry_points: vec!["src/app/page.tsx".into(), "Look at the docs".into()],
            naming_conventions: "kebab-case files".into(),
            ..Default::default()
        };
        let plan = AnalysisPlan {
            technologies_to_research: vec!["Next.js".into(), "Stripe".into()],
            ..Default::default()
        };
        let capabilities = CapabilityRecommendations {
            e2e_testing: Some("playwright".into()),
            database: Some("Supabase".into()),
            additional: vec!["Vercel (deploy)".into(), "supabase".into()],
        };
        let research = vec![research("Next.js", &["Prefer Server Components"])];

        let analysis = synthesize(SynthesisInput {
            stack: &stack(),
            plan: &plan,
            context: &context,
            research: &research,
            capabilities: &capabilities,
        });

        assert_eq!(analysis.project_context.entry_points, vec!["src/app/page.tsx"]);
        assert_eq!(
            analysis.implementation_guidelines,
            vec![
                "Next.js: Prefer Server Components",
                "Follow the naming conventions: kebab-case files"
            ]
        );
        assert_eq!(analysis.possible_missed_technologies, vec!["Stripe"]);
        assert_eq!(
            analysis.capability_recommendations.essential,
            vec!["supabase", "playwright"]
        );
        assert_eq!(analysis.capability_recommendations.recommended, vec!["vercel"]);
    }

    #[test]
    fn test_short_names_not_hidden_by_longer_facts() {
        let stack = StackSummary {
            database: Some("MongoDB".into()),
            ..Default::default()
        };
        let plan = AnalysisPlan {
            technologies_to_research: vec!["Go".into(), "MongoDB 7".into()],
            ..Default::default()
        };
        let analysis = synthesize(SynthesisInput {
            stack: &stack,
            plan: &plan,
            context: &EnrichedContext::default(),
            research: &[],
            capabilities: &CapabilityRecommendations::default(),
        });
        assert_eq!(analysis.possible_missed_technologies, vec!["Go"]);
    }

    #[test]
    fn test_guidelines_never_empty() {
        let analysis = synthesize(SynthesisInput {
            stack: &StackSummary::default(),
            plan: &AnalysisPlan::default(),
            context: &EnrichedContext::default(),
            research: &[],
            capabilities: &CapabilityRecommendations::default(),
        });
        assert_eq!(analysis.implementation_guidelines, vec![GENERIC_GUIDELINE]);
    }

    #[test]
    fn test_derived_guidelines_from_commands() {
        let mut commands = BTreeMap::new();
        commands.insert("test".to_string(), "pnpm test".to_string());
        commands.insert("lint".to_string(), "pnpm lint".to_string());
        let guidelines = derived_guidelines(&commands);
        assert_eq!(guidelines.len(), 3);
        assert!(guidelines[0].contains("`pnpm test`"));
        assert!(guidelines[1].contains("`pnpm lint`"));
        assert_eq!(guidelines[2], GENERIC_GUIDELINE);
    }

    #[test]
    fn test_default_analysis_is_deterministic() {
        let a = serde_json::to_string(&default_analysis(&stack())).unwrap();
        let b = serde_json::to_string(&default_analysis(&stack())).unwrap();
        assert_eq!(a, b);

        let analysis = default_analysis(&stack());
        assert_eq!(analysis.project_context.entry_points, vec!["src/index.ts"]);
        assert_eq!(analysis.commands["test"], "npm run test");
        assert!(analysis.implementation_guidelines[0].contains("npm run test"));
        assert_eq!(
            analysis.capability_recommendations.essential,
            vec!["supabase", "playwright"]
        );
        assert_eq!(
            analysis.capability_recommendations.recommended,
            vec!["next-devtools", "vercel"]
        );
    }
}
