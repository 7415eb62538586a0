//! Runtime configuration for fact-check and claim-extraction runs
//!
//! Every field has a default, so a YAML file only needs to mention what it
//! changes:
//!
//! ```yaml
//! inference:
//!   provider: gemini
//! max_checks: 6
//! search_provider: brave
//! research_retry_attempts: 2
//! ```

use anyhow::{Context, Result};
use factcheck_sdk::FactCheckError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Which inference backend serves the model calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Openai,
    Gemini,
}

/// Which web search backend grounds the researcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchProviderKind {
    /// Hosted web search tool of the OpenAI Responses API
    #[default]
    Openai,
    /// Brave Search results passed to the model in the payload
    Brave,
}

/// How much retrieved context the hosted web search tool feeds the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    Low,
    Medium,
    #[default]
    High,
}

impl SearchContextSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Provider settings shared by every stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub provider: ProviderKind,

    /// Model override; the provider default applies when unset
    pub model: Option<String>,

    /// Base URL override for the OpenAI-compatible endpoint
    pub base_url: Option<String>,

    /// Per-request HTTP timeout
    pub request_timeout_seconds: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Openai,
            model: None,
            base_url: None,
            request_timeout_seconds: 120,
        }
    }
}

/// Configuration for the plan → research → judge pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactCheckConfig {
    pub inference: InferenceConfig,

    /// Upper bound on checks per plan
    pub max_checks: usize,

    /// Concurrency ceiling for research tasks
    pub max_parallel_research: usize,

    pub max_search_queries_per_check: usize,

    pub search_provider: SearchProviderKind,

    /// Only used with the hosted search provider
    pub search_context_size: SearchContextSize,

    /// Only used with the Brave search provider
    pub search_results_per_query: usize,

    /// Per-attempt research timeout; 0 disables it
    pub research_timeout_seconds: f64,

    /// Attempts made after the first failed one
    pub research_retry_attempts: usize,

    /// Fixed pause between attempts of the same check
    pub research_retry_delay_ms: u64,

    /// How long one progress delivery may take; 0 waits forever
    pub progress_timeout_seconds: f64,
}

impl Default for FactCheckConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            max_checks: 4,
            max_parallel_research: 4,
            max_search_queries_per_check: 5,
            search_provider: SearchProviderKind::Openai,
            search_context_size: SearchContextSize::High,
            search_results_per_query: 5,
            research_timeout_seconds: 120.0,
            research_retry_attempts: 1,
            research_retry_delay_ms: 0,
            progress_timeout_seconds: 10.0,
        }
    }
}

impl FactCheckConfig {
    /// Load a config file, falling back to defaults for missing fields
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config YAML from: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no scheduler could honor
    pub fn validate(&self) -> Result<(), FactCheckError> {
        validate_seconds("research_timeout_seconds", self.research_timeout_seconds)?;
        validate_seconds("progress_timeout_seconds", self.progress_timeout_seconds)?;

        if self.research_retry_attempts > MAX_RESEARCH_RETRY_ATTEMPTS {
            return Err(FactCheckError::InvalidConfig(format!(
                "research_retry_attempts must be at most {} (got {})",
                MAX_RESEARCH_RETRY_ATTEMPTS, self.research_retry_attempts
            )));
        }

        if self.inference.provider == ProviderKind::Gemini
            && self.search_provider != SearchProviderKind::Brave
        {
            return Err(FactCheckError::InvalidConfig(
                "Gemini inference supports search_provider 'brave' only".to_string(),
            ));
        }
        Ok(())
    }

    pub fn research_timeout(&self) -> Option<Duration> {
        seconds_to_duration(self.research_timeout_seconds)
    }

    pub fn progress_timeout(&self) -> Option<Duration> {
        seconds_to_duration(self.progress_timeout_seconds)
    }

    pub fn research_retry_delay(&self) -> Duration {
        Duration::from_millis(self.research_retry_delay_ms)
    }
}

/// Configuration for the single-stage claim extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimExtractionConfig {
    pub inference: InferenceConfig,
    pub max_claims: usize,

    /// How long one progress delivery may take; 0 waits forever
    pub progress_timeout_seconds: f64,
}

impl Default for ClaimExtractionConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            max_claims: 12,
            progress_timeout_seconds: 10.0,
        }
    }
}

impl ClaimExtractionConfig {
    pub fn validate(&self) -> Result<(), FactCheckError> {
        validate_seconds("progress_timeout_seconds", self.progress_timeout_seconds)
    }

    pub fn progress_timeout(&self) -> Option<Duration> {
        seconds_to_duration(self.progress_timeout_seconds)
    }
}

/// Retries beyond this are rejected by `validate()`
pub const MAX_RESEARCH_RETRY_ATTEMPTS: usize = 100;

fn validate_seconds(field: &str, value: f64) -> Result<(), FactCheckError> {
    if value < 0.0 || Duration::try_from_secs_f64(value).is_err() {
        return Err(FactCheckError::InvalidConfig(format!(
            "{} must be a finite, non-negative number of seconds within range (got {})",
            field, value
        )));
    }
    Ok(())
}

/// Zero, negative and unrepresentable values all mean "no limit"
fn seconds_to_duration(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value)
        .ok()
        .filter(|duration| !duration.is_zero())
}
