//! devcontext CLI
//!
//! Runs the analysis pipeline on a scanned stack and prints the resulting
//! development context as JSON on stdout. Logs and progress go to stderr.
//!
//! No model provider is wired in here, so every agent takes its
//! deterministic fallback. Applications embedding `devcontext_core` pass
//! their own `LanguageModel` to `Coordinator::new`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use devcontext_core::models::UnavailableModel;
use devcontext_core::skills::tools::ResearchCapabilities;
use devcontext_core::state::StackSummary;
use devcontext_core::swarm::{Coordinator, CoordinatorConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "devcontext - development context for coding agents")]
struct Args {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Analyze a scanned stack and print the development context
    Analyze {
        /// StackSummary JSON produced by the scanner
        #[arg(long)]
        stack: PathBuf,
        /// Repository root explored by the context enricher
        #[arg(long)]
        root: Option<PathBuf>,
        /// Coordinator config JSON (missing fields keep defaults)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Maximum optimizer passes in the quality loop
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Print the full report (plan, quality outcome, events)
        #[arg(long)]
        report: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        CliCommand::Analyze {
            stack,
            root,
            config,
            max_iterations,
            report,
        } => {
            let config = build_config(config.as_deref(), root, max_iterations)?;
            analyze(&stack, config, report).await
        }
    }
}

fn build_config(
    path: Option<&Path>,
    root: Option<PathBuf>,
    max_iterations: Option<usize>,
) -> Result<CoordinatorConfig> {
    let mut config = match path {
        Some(path) => CoordinatorConfig::load(path)?,
        None => CoordinatorConfig::default(),
    };
    if let Some(root) = root {
        config.repo_root = root;
    }
    if let Some(max_iterations) = max_iterations {
        config.max_iterations = max_iterations;
    }
    Ok(config)
}

fn load_stack(path: &Path) -> Result<StackSummary> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stack summary {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse stack summary {}", path.display()))
}

async fn analyze(stack_path: &Path, config: CoordinatorConfig, report: bool) -> Result<()> {
    let stack = load_stack(stack_path)?;
    let capabilities = ResearchCapabilities::from_env();
    tracing::info!(
        research_mode = %capabilities.mode(),
        repo_root = %config.repo_root.display(),
        "Starting analysis"
    );

    let coordinator = Coordinator::new(config, Arc::new(UnavailableModel))
        .with_research_capabilities(capabilities)
        .with_progress(|phase, detail| match detail {
            None => tracing::info!(phase, "started"),
            Some(detail) => tracing::info!(phase, detail, "finished"),
        });

    let output = if report {
        let report = coordinator.run_with_report(&stack).await;
        serde_json::to_string_pretty(&report)?
    } else {
        let analysis = coordinator.run(&stack).await;
        serde_json::to_string_pretty(&analysis)?
    };
    println!("{}", output);
    Ok(())
}
