//! # Researcher Skill
//!
//! Researches one technology in the run's [`ResearchMode`]. The mode picks
//! the system prompt and the tools; documentation hints fall back to the
//! static [`DocHintTable`].

use serde::Deserialize;

use crate::error::AgentResult;
use crate::models::LanguageModel;
use crate::skills::agent_loop::{generate_text, TextRequest};
use crate::skills::prompts;
use crate::skills::tools::ToolSet;
use crate::state::{json, ResearchMode, StackSummary, TechResearchResult};
use crate::tools::validation::clean_guidelines;
use crate::tools::DocHintTable;

const COMPONENT: &str = "tech_researcher";

/// What the model is asked to return. The technology and mode are set by
/// the caller, not trusted from the answer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ResearchFindings {
    best_practices: Vec<String>,
    anti_patterns: Vec<String>,
    testing_tips: Vec<String>,
    documentation_hints: Vec<String>,
}

/// Inputs for one researcher
pub struct ResearchTask<'a> {
    pub technology: &'a str,
    pub stack: &'a StackSummary,
    pub mode: ResearchMode,
    pub tools: &'a ToolSet,
    pub max_tool_steps: usize,
    pub hints: &'a DocHintTable,
}

/// Tech researcher agent
pub struct ResearcherSkill;

impl ResearcherSkill {
    /// Research one technology.
    ///
    /// Provider failures are errors. An answer with no usable JSON yields
    /// [`fallback_research`].
    #[tracing::instrument(skip_all, fields(technology = task.technology, mode = %task.mode))]
    pub async fn run(
        model: &dyn LanguageModel,
        task: ResearchTask<'_>,
    ) -> AgentResult<TechResearchResult> {
        let prompt = format!(
            "Technology: {}\n\nProject stack:\n{}",
            task.technology,
            task.stack.to_summary()
        );
        let generated = generate_text(
            model,
            TextRequest {
                component: COMPONENT,
                system: prompts::researcher(task.mode),
                prompt,
                tools: task.tools,
                max_tool_steps: task.max_tool_steps,
            },
        )
        .await?;

        let Some(findings) = generated
            .texts_newest_first()
            .find_map(json::extract::<ResearchFindings>)
        else {
            tracing::warn!("Research answer unusable, using documentation table");
            return Ok(fallback_research(task.technology, task.mode, task.hints));
        };

        let mut documentation_hints = clean_guidelines(findings.documentation_hints);
        if documentation_hints.is_empty() {
            documentation_hints = task.hints.documentation_hints(task.technology);
        }

        Ok(TechResearchResult {
            technology: task.technology.to_string(),
            best_practices: clean_guidelines(findings.best_practices),
            anti_patterns: clean_guidelines(findings.anti_patterns),
            testing_tips: clean_guidelines(findings.testing_tips),
            documentation_hints,
            research_mode: task.mode,
        })
    }
}

/// Result carrying only the table's documentation hints
pub fn fallback_research(
    technology: &str,
    mode: ResearchMode,
    hints: &DocHintTable,
) -> TechResearchResult {
    TechResearchResult {
        technology: technology.to_string(),
        best_practices: Vec::new(),
        anti_patterns: Vec::new(),
        testing_tips: Vec::new(),
        documentation_hints: hints.documentation_hints(technology),
        research_mode: mode,
    }
}
