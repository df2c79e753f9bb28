//! Default prompt templates bundled at compile time.

use crate::state::ResearchMode;

/// Planner - decides what the workers look at
pub const PLANNER: &str = include_str!("defaults/planner.md");

/// Context Enricher - explores the repository with tools
pub const CONTEXT_ENRICHER: &str = include_str!("defaults/context_enricher.md");

/// Tech Researcher with web search and docs lookup
pub const RESEARCHER_FULL: &str = include_str!("defaults/researcher_full.md");

pub const RESEARCHER_WEB_ONLY: &str = include_str!("defaults/researcher_web.md");

pub const RESEARCHER_DOCS_ONLY: &str = include_str!("defaults/researcher_docs.md");

/// Tech Researcher without tools
pub const RESEARCHER_KNOWLEDGE_ONLY: &str = include_str!("defaults/researcher_knowledge.md");

/// Evaluator - scores the artifact
pub const EVALUATOR: &str = include_str!("defaults/evaluator.md");

/// Optimizer - additive fixes from evaluator feedback
pub const OPTIMIZER: &str = include_str!("defaults/optimizer.md");

/// Researcher system prompt for a capability mode
pub fn researcher(mode: ResearchMode) -> &'static str {
    match mode {
        ResearchMode::Full => RESEARCHER_FULL,
        ResearchMode::WebOnly => RESEARCHER_WEB_ONLY,
        ResearchMode::DocsOnly => RESEARCHER_DOCS_ONLY,
        ResearchMode::KnowledgeOnly => RESEARCHER_KNOWLEDGE_ONLY,
    }
}

/// All default prompts with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("planner", PLANNER),
        ("context_enricher", CONTEXT_ENRICHER),
        ("researcher_full", RESEARCHER_FULL),
        ("researcher_web_only", RESEARCHER_WEB_ONLY),
        ("researcher_docs_only", RESEARCHER_DOCS_ONLY),
        ("researcher_knowledge_only", RESEARCHER_KNOWLEDGE_ONLY),
        ("evaluator", EVALUATOR),
        ("optimizer", OPTIMIZER),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_prompts_non_empty() {
        for (slug, content) in all_defaults() {
            assert!(content.len() > 50, "Prompt '{}' seems too short", slug);
        }
    }

    #[test]
    fn test_researcher_prompt_matches_tools() {
        assert!(researcher(ResearchMode::Full).contains("lookup_docs"));
        assert!(researcher(ResearchMode::WebOnly).contains("web_search"));
        assert!(!researcher(ResearchMode::DocsOnly).contains("(`web_search`)"));
        assert!(researcher(ResearchMode::KnowledgeOnly).contains("No tools"));
    }
}
