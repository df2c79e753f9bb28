//! # Swarm Coordinator
//!
//! Runs the analysis pipeline from a detected stack to the final
//! [`MultiAgentAnalysis`]: plan, fan out workers, synthesize, then the
//! quality loop. Every agent failure is absorbed by a fallback, and the
//! pipeline body itself runs in its own task so that even a panic ends in
//! [`default_analysis_with`] instead of an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::{AgentRole, LanguageModel, ModelRegistry};
use crate::skills::enricher_skill::fallback_context;
use crate::skills::synthesis_skill::default_analysis_with;
use crate::skills::tools::{repo_tools, research_tools, ResearchCapabilities};
use crate::skills::{
    synthesize, EnricherSkill, PlannerSkill, ResearchTask, ResearcherSkill, SynthesisInput,
};
use crate::state::{
    AnalysisPlan, EnrichedContext, MultiAgentAnalysis, ResearchMode, StackSummary,
    TechResearchResult,
};
use crate::tools::{CapabilityResolver, CapabilityTables, DocHintTable};

use super::events::{EventLog, PipelineEvent, PipelineEventKind};
use super::pipeline::{Pipeline, PipelinePhase};
use super::quality_loop::{run_quality_loop, QualityOutcome, QualitySettings};
use super::worker_pool::{Settled, WorkerPool};

/// Configuration for the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Maximum optimizer calls in the quality loop
    pub max_iterations: usize,
    /// Minimum evaluator score (1-10) for the gate to pass
    pub quality_threshold: u8,
    /// Tool invocations allowed to the context enricher
    pub enricher_tool_steps: usize,
    /// Tool invocations allowed to each tech researcher
    pub researcher_tool_steps: usize,
    /// Cap on planned technologies (one researcher each)
    pub max_research_targets: usize,
    /// Treat an unavailable evaluator as a passing score
    pub evaluator_fail_open: bool,
    /// Repository the enricher explores
    pub repo_root: PathBuf,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2,
            quality_threshold: 7,
            enricher_tool_steps: 10,
            researcher_tool_steps: 4,
            max_research_targets: 6,
            evaluator_fail_open: true,
            repo_root: PathBuf::from("."),
        }
    }
}

impl CoordinatorConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    fn quality_settings(&self) -> QualitySettings {
        QualitySettings {
            max_iterations: self.max_iterations,
            quality_threshold: self.quality_threshold,
            evaluator_fail_open: self.evaluator_fail_open,
        }
    }
}

/// Progress callback: `(phase_label, detail)`, called at the start
/// (detail `None`) and end of each phase
pub type ProgressCallback = Arc<dyn Fn(&str, Option<&str>) + Send + Sync>;

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub analysis: MultiAgentAnalysis,
    /// Absent when the pipeline body failed
    pub plan: Option<AnalysisPlan>,
    pub research_mode: ResearchMode,
    pub quality: Option<QualityOutcome>,
    pub events: Vec<PipelineEvent>,
    /// The default analysis replaced a failed pipeline body
    pub used_default_analysis: bool,
}

/// Output of one worker-pool member
enum WorkerOutput {
    Context(EnrichedContext),
    Research(TechResearchResult),
}

/// The swarm coordinator
#[derive(Clone)]
pub struct Coordinator {
    config: CoordinatorConfig,
    models: ModelRegistry,
    capabilities: ResearchCapabilities,
    resolver: CapabilityResolver,
    hints: Arc<DocHintTable>,
    progress: Option<ProgressCallback>,
}

impl Coordinator {
    /// Create a coordinator with one model for every agent
    pub fn new(config: CoordinatorConfig, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            config,
            models: ModelRegistry::new(model),
            capabilities: ResearchCapabilities::default(),
            resolver: CapabilityResolver::default(),
            hints: Arc::new(DocHintTable::default()),
            progress: None,
        }
    }

    /// Route one agent to a different model
    pub fn with_agent_model(mut self, role: AgentRole, model: Arc<dyn LanguageModel>) -> Self {
        self.models = self.models.with_override(role, model);
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, Option<&str>) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Research credentials; decides the [`ResearchMode`] of every run
    pub fn with_research_capabilities(mut self, capabilities: ResearchCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_capability_tables(mut self, tables: CapabilityTables) -> Self {
        self.resolver = CapabilityResolver::new(tables);
        self
    }

    pub fn with_doc_hints(mut self, hints: DocHintTable) -> Self {
        self.hints = Arc::new(hints);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Analyze `stack`. Never fails.
    pub async fn run(&self, stack: &StackSummary) -> MultiAgentAnalysis {
        self.run_with_report(stack).await.analysis
    }

    /// Analyze `stack` and return the plan, loop outcome and events as well
    #[tracing::instrument(skip_all, fields(project = stack.project_name.as_deref().unwrap_or("")))]
    pub async fn run_with_report(&self, stack: &StackSummary) -> PipelineReport {
        let research_mode = self.capabilities.mode();
        let this = self.clone();
        let owned_stack = stack.clone();

        let body = tokio::spawn(async move { this.execute(owned_stack, research_mode).await }).await;

        let error = match body {
            Ok(Ok(report)) => return report,
            Ok(Err(e)) => format!("{:#}", e),
            Err(join_err) => format!("pipeline task failed: {}", join_err),
        };

        tracing::warn!(error = %error, "Pipeline failed, returning default analysis");
        let mut events = EventLog::new();
        events.emit_with(
            PipelineEventKind::PipelineFailed,
            "coordinator",
            serde_json::json!({ "error": error }),
        );

        PipelineReport {
            analysis: default_analysis_with(stack, &self.resolver),
            plan: None,
            research_mode,
            quality: None,
            events: events.into_events(),
            used_default_analysis: true,
        }
    }

    fn report_progress(&self, phase: PipelinePhase, detail: Option<&str>) {
        if let Some(progress) = &self.progress {
            progress(phase.label(), detail);
        }
    }

    /// The pipeline body
    async fn execute(&self, stack: StackSummary, research_mode: ResearchMode) -> Result<PipelineReport> {
        let mut pipeline = Pipeline::new();
        let mut events = EventLog::new();
        events.emit_with(
            PipelineEventKind::PipelineStarted,
            "coordinator",
            serde_json::json!({ "researchMode": research_mode }),
        );

        // No upstream dependency; resolved up front
        let capabilities = self.resolver.resolve(&stack);

        // Phase 1: Planning
        self.begin_phase(&pipeline, &mut events);
        let plan = self.plan(&stack, &mut events).await;
        let plan_summary = format!(
            "{} technologies to research",
            plan.technologies_to_research.len()
        );
        events.emit_with(
            PipelineEventKind::PhaseCompleted,
            pipeline.phase.label(),
            serde_json::to_value(&plan).context("Failed to record plan")?,
        );
        self.report_progress(pipeline.phase, Some(&plan_summary));
        pipeline.advance();

        // Phase 2: Workers
        self.begin_phase(&pipeline, &mut events);
        let stack = Arc::new(stack);
        let (context, research) = self
            .run_workers(Arc::clone(&stack), &plan, research_mode, &mut events)
            .await;
        let workers_summary = format!(
            "{} of {} technologies researched",
            research.len(),
            plan.technologies_to_research.len()
        );
        self.end_phase(&pipeline, &mut events, &workers_summary);
        pipeline.advance();

        // Phase 3: Synthesis
        self.begin_phase(&pipeline, &mut events);
        let analysis = synthesize(SynthesisInput {
            stack: &stack,
            plan: &plan,
            context: &context,
            research: &research,
            capabilities: &capabilities,
        });
        let synthesis_summary = format!(
            "{} guidelines, {} entry points",
            analysis.implementation_guidelines.len(),
            analysis.project_context.entry_points.len()
        );
        self.end_phase(&pipeline, &mut events, &synthesis_summary);
        pipeline.advance();

        // Phase 4: Quality
        self.begin_phase(&pipeline, &mut events);
        let evaluator = self.models.for_role(AgentRole::Evaluator);
        let optimizer = self.models.for_role(AgentRole::Optimizer);
        let outcome = run_quality_loop(
            evaluator.as_ref(),
            optimizer.as_ref(),
            &stack,
            analysis,
            self.config.quality_settings(),
            &mut events,
        )
        .await;
        let quality_summary = match &outcome.last_evaluation {
            Some(evaluation) => format!(
                "score {} after {} optimization(s)",
                evaluation.quality_score, outcome.optimizations
            ),
            None => "not evaluated".to_string(),
        };
        self.end_phase(&pipeline, &mut events, &quality_summary);
        pipeline.advance();

        events.emit(PipelineEventKind::PipelineCompleted, "coordinator");
        tracing::info!(passed = outcome.passed, "Pipeline complete");

        Ok(PipelineReport {
            analysis: outcome.artifact.clone(),
            plan: Some(plan),
            research_mode,
            quality: Some(outcome),
            events: events.into_events(),
            used_default_analysis: false,
        })
    }

    fn begin_phase(&self, pipeline: &Pipeline, events: &mut EventLog) {
        tracing::info!(phase = %pipeline.phase, "Phase started");
        events.emit(PipelineEventKind::PhaseStarted, pipeline.phase.label());
        self.report_progress(pipeline.phase, None);
    }

    fn end_phase(&self, pipeline: &Pipeline, events: &mut EventLog, summary: &str) {
        events.emit_with(
            PipelineEventKind::PhaseCompleted,
            pipeline.phase.label(),
            serde_json::json!({ "summary": summary }),
        );
        self.report_progress(pipeline.phase, Some(summary));
    }

    async fn plan(&self, stack: &StackSummary, events: &mut EventLog) -> AnalysisPlan {
        let planner = self.models.for_role(AgentRole::Planner);
        let max_targets = self.config.max_research_targets;
        let outcome = PlannerSkill::run(planner.as_ref(), stack, max_targets).await;
        if let Some(e) = outcome.fallback_reason {
            events.emit_with(
                PipelineEventKind::FallbackUsed,
                AgentRole::Planner.as_str(),
                serde_json::json!({ "error": e.to_string() }),
            );
        }
        outcome.plan
    }

    /// Enricher plus one researcher per planned technology, settled together.
    /// A failed enricher is replaced by the manifest fallback; a failed
    /// researcher contributes nothing.
    async fn run_workers(
        &self,
        stack: Arc<StackSummary>,
        plan: &AnalysisPlan,
        research_mode: ResearchMode,
        events: &mut EventLog,
    ) -> (EnrichedContext, Vec<TechResearchResult>) {
        let plan = Arc::new(plan.clone());
        let mut pool = WorkerPool::new();

        // SCATTER: enricher first, so slot 0 is always the context
        {
            let model = self.models.for_role(AgentRole::Enricher);
            let root = self.config.repo_root.clone();
            let steps = self.config.enricher_tool_steps;
            let stack = Arc::clone(&stack);
            let plan = Arc::clone(&plan);
            pool.submit(AgentRole::Enricher.as_str(), async move {
                let tools = repo_tools(root)?;
                EnricherSkill::run(model.as_ref(), &stack, &plan, &tools, steps)
                    .await
                    .map(WorkerOutput::Context)
            });
        }

        let research_toolset = research_tools(&self.capabilities, research_mode);
        for technology in &plan.technologies_to_research {
            let model = self.models.for_role(AgentRole::Researcher);
            let tools = research_toolset.clone();
            let hints = Arc::clone(&self.hints);
            let steps = self.config.researcher_tool_steps;
            let stack = Arc::clone(&stack);
            let technology = technology.clone();
            pool.submit(
                format!("{}:{}", AgentRole::Researcher, technology),
                async move {
                    let task = ResearchTask {
                        technology: &technology,
                        stack: &stack,
                        mode: research_mode,
                        tools: &tools,
                        max_tool_steps: steps,
                        hints: &hints,
                    };
                    ResearcherSkill::run(model.as_ref(), task)
                        .await
                        .map(WorkerOutput::Research)
                },
            );
        }

        // GATHER
        let mut context = None;
        let mut research = Vec::new();
        for (index, settled) in pool.settle().await.into_iter().enumerate() {
            match settled {
                Settled::Fulfilled(WorkerOutput::Context(c)) => context = Some(c),
                Settled::Fulfilled(WorkerOutput::Research(r)) => research.push(r),
                Settled::Rejected(err) => {
                    events.emit_with(
                        PipelineEventKind::AgentFailed,
                        err.component(),
                        serde_json::json!({ "error": err.to_string() }),
                    );
                    if index == 0 {
                        events.emit(
                            PipelineEventKind::FallbackUsed,
                            AgentRole::Enricher.as_str(),
                        );
                    }
                }
            }
        }

        let context = context.unwrap_or_else(|| {
            tracing::warn!("Context enricher failed, using manifest fallback");
            fallback_context(&stack)
        });
        (context, research)
    }
}
