//! Command-line interface

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use factcheck_sdk::{ProgressEvent, ProgressKind, ProgressObserver, StderrObserver};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::config::{
    ClaimExtractionConfig, FactCheckConfig, InferenceConfig, ProviderKind, SearchContextSize,
    SearchProviderKind,
};
use crate::factory::{build_claim_extraction_service, build_fact_check_service};
use crate::pipeline::{ArtifactFormat, FileRunArtifactRepository, RunArtifactRepository};
use crate::providers::list_skills;
use crate::render;

/// Agentic fact-checking from the command line
#[derive(Parser, Debug)]
#[command(name = "factcheck", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fact-check a claim
    Check(CheckArgs),
    /// Extract check-worthy claims from text
    Extract(ExtractArgs),
    /// List built-in skills
    Skills,
}

/// Provider selection shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct InferenceArgs {
    /// Inference provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Model name (default: provider default, or FACTCHECK_MODEL / FACTCHECK_GEMINI_MODEL)
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long)]
    pub base_url: Option<String>,
}

impl InferenceArgs {
    fn apply(&self, inference: &mut InferenceConfig) {
        if let Some(provider) = self.provider {
            inference.provider = provider;
        }
        if let Some(model) = &self.model {
            inference.model = Some(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            inference.base_url = Some(base_url.clone());
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Claim text to verify
    pub claim: String,

    /// YAML config file; flags override its values
    #[arg(long, env = "FACTCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub inference: InferenceArgs,

    /// Maximum number of verification checks
    #[arg(long)]
    pub max_checks: Option<usize>,

    /// Maximum parallel research tasks
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Web search backend for research
    #[arg(long, value_enum)]
    pub search_provider: Option<SearchProviderKind>,

    /// Context size for the hosted web search tool
    #[arg(long, value_enum)]
    pub search_context_size: Option<SearchContextSize>,

    /// Search results requested per query
    #[arg(long)]
    pub results_per_query: Option<usize>,

    /// Per-attempt research timeout in seconds (0 disables it)
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Research retries after a failed attempt
    #[arg(long)]
    pub retries: Option<usize>,

    /// Print the verification plan in text mode
    #[arg(long)]
    pub show_plan: bool,

    /// Machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// With --json, include plan, findings and run artifacts
    #[arg(long)]
    pub include_artifacts: bool,

    /// Emit progress as prefixed JSON lines on stderr
    #[arg(long)]
    pub events: bool,

    /// Save run artifacts into this directory
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CheckArgs {
    pub fn to_config(&self) -> Result<FactCheckConfig> {
        let mut config = match &self.config {
            Some(path) => FactCheckConfig::from_yaml_file(path)?,
            None => FactCheckConfig::default(),
        };

        self.inference.apply(&mut config.inference);
        if let Some(max_checks) = self.max_checks {
            config.max_checks = max_checks.max(1);
        }
        if let Some(parallel) = self.parallel {
            config.max_parallel_research = parallel.max(1);
        }
        if let Some(search_provider) = self.search_provider {
            config.search_provider = search_provider;
        }
        if let Some(context_size) = self.search_context_size {
            config.search_context_size = context_size;
        }
        if let Some(results) = self.results_per_query {
            config.search_results_per_query = results;
        }
        if let Some(timeout) = self.timeout {
            config.research_timeout_seconds = timeout;
        }
        if let Some(retries) = self.retries {
            config.research_retry_attempts = retries;
        }

        config.validate()?;
        Ok(config)
    }

    fn observer(&self) -> Option<Arc<dyn ProgressObserver>> {
        progress_observer(self.events, self.quiet)
    }
}

/// `--events` wins over `--quiet`; otherwise milestones go to the console
fn progress_observer(events: bool, quiet: bool) -> Option<Arc<dyn ProgressObserver>> {
    if events {
        Some(Arc::new(StderrObserver))
    } else if quiet {
        None
    } else {
        Some(Arc::new(ConsoleObserver))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Text to analyze (reads stdin when neither TEXT nor --file is given)
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub inference: InferenceArgs,

    /// Maximum number of claims to extract
    #[arg(long, default_value_t = 12)]
    pub max_claims: usize,

    /// Machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Emit progress as prefixed JSON lines on stderr
    #[arg(long)]
    pub events: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl ExtractArgs {
    pub fn to_config(&self) -> ClaimExtractionConfig {
        let mut config = ClaimExtractionConfig {
            max_claims: self.max_claims.max(1),
            ..Default::default()
        };
        self.inference.apply(&mut config.inference);
        config
    }

    fn observer(&self) -> Option<Arc<dyn ProgressObserver>> {
        progress_observer(self.events, self.quiet)
    }

    async fn read_input(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read input file: {}", path.display()));
        }

        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("Failed to read text from stdin")?;
        Ok(input)
    }
}

// ============================================================================
// Console progress
// ============================================================================

/// Prints human-readable milestones to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    pub fn describe(event: &ProgressEvent) -> Option<String> {
        let count = |key: &str| event.get_u64(key).unwrap_or(0);
        let text = |key: &str| event.get_str(key).unwrap_or("").to_string();
        let number = |key: &str| event.get(key).and_then(Value::as_f64).unwrap_or(0.0);

        let line = match event.kind {
            ProgressKind::RunStarted => format!("Checking claim: {}", text("claim")),
            ProgressKind::PlanningStarted => "Planning verification checks...".to_string(),
            ProgressKind::PlanningCompleted => {
                let fallback = event
                    .get("used_fallback")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if fallback {
                    "Planner returned no usable checks; using a direct check".to_string()
                } else {
                    format!("Planned {} check(s)", count("check_count"))
                }
            }
            ProgressKind::ResearchStarted => format!(
                "Researching {} check(s), up to {} at a time",
                count("check_count"),
                count("max_parallel")
            ),
            ProgressKind::ResearchCheckCompleted => format!(
                "  [{}] {} ({:.2})",
                text("aspect_id"),
                text("signal"),
                number("confidence")
            ),
            ProgressKind::ResearchCheckFailed => format!(
                "  [{}] failed after {} attempt(s): {}",
                text("aspect_id"),
                count("attempts"),
                text("error")
            ),
            ProgressKind::ResearchCompleted => {
                let degraded = count("degraded_count");
                if degraded > 0 {
                    format!("Research done, {} check(s) degraded", degraded)
                } else {
                    "Research done".to_string()
                }
            }
            ProgressKind::JudgingStarted => "Judging findings...".to_string(),
            ProgressKind::JudgingCompleted => format!(
                "Verdict: {} ({:.2})",
                text("verdict"),
                number("verdict_confidence")
            ),
            ProgressKind::RunFailed => format!("Run failed: {}", text("error")),
            ProgressKind::ExtractionStarted => "Extracting claims...".to_string(),
            ProgressKind::ExtractionCompleted => {
                format!("Extracted {} claim(s)", count("claim_count"))
            }
            ProgressKind::RunCompleted => return None,
        };
        Some(line)
    }
}

#[async_trait]
impl ProgressObserver for ConsoleObserver {
    async fn on_event(&self, event: &ProgressEvent) -> Result<()> {
        if let Some(line) = Self::describe(event) {
            eprintln!("{}", line);
        }
        Ok(())
    }
}

// ============================================================================
// Commands
// ============================================================================

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Check(args) => run_check(args).await,
        Command::Extract(args) => run_extract(args).await,
        Command::Skills => {
            run_skills();
            Ok(())
        }
    }
}

async fn run_check(args: CheckArgs) -> Result<()> {
    let config = args.to_config()?;

    let repository = args.artifacts_dir.as_ref().map(|dir| {
        Arc::new(FileRunArtifactRepository::new(dir).with_format(ArtifactFormat::Yaml))
            as Arc<dyn RunArtifactRepository>
    });
    let service = build_fact_check_service(&config, repository)?;

    let run = match args.observer() {
        Some(observer) => service.check_claim_with_progress(&args.claim, observer).await?,
        None => service.check_claim(&args.claim).await?,
    };

    if args.json {
        let document = render::run_to_json(&run, args.include_artifacts)?;
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!("{}", render::format_run_text(&run, args.show_plan));
    }
    Ok(())
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    let input = args.read_input().await?;
    if input.trim().is_empty() {
        bail!("No input text provided");
    }

    let service = build_claim_extraction_service(&args.to_config())?;
    let result = match args.observer() {
        Some(observer) => service.extract_claims_with_progress(&input, observer).await?,
        None => service.extract_claims(&input).await?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&render::extraction_to_json(&result)?)?);
    } else {
        println!("{}", render::format_extraction_text(&result));
    }
    Ok(())
}

fn run_skills() {
    for skill in list_skills() {
        let web = if skill.uses_web_search { "yes" } else { "no" };
        println!("- {}: {} | web_search={}", skill.name, skill.description, web);
    }
}
