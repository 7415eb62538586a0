//! Capability implementations backed by [`StructuredClient`]
//!
//! Adapters only build payloads and post-process model output; retries,
//! timeouts and normalization belong to the pipeline.

use anyhow::{Context, Result};
use async_trait::async_trait;
use factcheck_sdk::{
    AspectFinding, ClaimExtractionBackend, ClaimExtractionResult, FactCheckReport,
    InvestigationPlan, Judge, Planner, Researcher, Retriever, SourceEvidence, VerificationCheck,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::client::StructuredClient;
use crate::config::SearchContextSize;
use super::skills::{self, Skill};
use crate::pipeline::normalize_query_list;

/// Minimum number of independent sources a finding should cite
const MIN_SOURCES: usize = 2;

async fn run_skill<T: serde::de::DeserializeOwned>(
    client: &StructuredClient,
    skill: &Skill,
    payload: &Value,
) -> Result<T> {
    client
        .generate(skill.prompt, payload)
        .await
        .with_context(|| format!("{} skill failed", skill.name))
}

fn keep_web_sources(sources: &mut Vec<SourceEvidence>) {
    sources.retain(SourceEvidence::has_web_url);
}

// ============================================================================
// Planner
// ============================================================================

pub struct LlmPlanner {
    client: Arc<StructuredClient>,
}

impl LlmPlanner {
    pub fn new(client: Arc<StructuredClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(&self, claim: &str, max_checks: usize) -> Result<InvestigationPlan> {
        let payload = json!({ "claim": claim, "max_checks": max_checks });
        run_skill(&self.client, &skills::PLAN, &payload).await
    }
}

// ============================================================================
// Researcher
// ============================================================================

/// Researches one check, grounded in web search
///
/// With a retriever the search results travel in the payload; with hosted
/// search the model must call the provider's web search tool itself.
pub struct LlmResearcher {
    client: Arc<StructuredClient>,
    retriever: Option<Arc<dyn Retriever>>,
    hosted_search: Option<SearchContextSize>,
    results_per_query: usize,
    max_queries_per_check: usize,
}

impl LlmResearcher {
    pub fn new(client: Arc<StructuredClient>) -> Self {
        Self {
            client,
            retriever: None,
            hosted_search: None,
            results_per_query: 5,
            max_queries_per_check: 5,
        }
    }

    pub fn with_hosted_search(mut self, context_size: SearchContextSize) -> Self {
        self.hosted_search = Some(context_size);
        self
    }

    pub fn with_retriever(
        mut self,
        retriever: Arc<dyn Retriever>,
        results_per_query: usize,
        max_queries_per_check: usize,
    ) -> Self {
        self.retriever = Some(retriever);
        self.results_per_query = results_per_query;
        self.max_queries_per_check = max_queries_per_check;
        self
    }

    fn build_payload(&self, claim: &str, check: &VerificationCheck, search_results: Option<Value>) -> Value {
        let mut payload = json!({
            "claim": claim,
            "check": check,
            "requirements": {
                "min_sources": MIN_SOURCES,
                "has_search_results": search_results.is_some(),
                "must_use_search_tool": self.hosted_search.is_some() && search_results.is_none(),
            },
        });
        if let (Some(results), Some(object)) = (search_results, payload.as_object_mut()) {
            object.insert("search_results".to_string(), results);
        }
        payload
    }
}

#[async_trait]
impl Researcher for LlmResearcher {
    async fn research(&self, claim: &str, check: &VerificationCheck) -> Result<AspectFinding> {
        let search_results = match &self.retriever {
            Some(retriever) => {
                let queries = normalize_query_list(
                    &check.search_queries,
                    &[check.question.as_str(), claim],
                    self.max_queries_per_check,
                );
                let results = retriever
                    .search(&queries, self.results_per_query)
                    .await
                    .with_context(|| format!("web search failed for check {}", check.aspect_id))?;
                Some(serde_json::to_value(results).context("Failed to serialize search results")?)
            }
            None => None,
        };

        let has_search_results = search_results.is_some();
        let payload = self.build_payload(claim, check, search_results);
        let mut finding: AspectFinding = match self.hosted_search {
            Some(context_size) if !has_search_results => self
                .client
                .generate_with_web_search(skills::RESEARCH.prompt, &payload, context_size)
                .await
                .with_context(|| format!("{} skill failed", skills::RESEARCH.name))?,
            _ => run_skill(&self.client, &skills::RESEARCH, &payload).await?,
        };

        if finding.aspect_id.trim().is_empty() {
            finding.aspect_id = check.aspect_id.clone();
        }
        if finding.question.trim().is_empty() {
            finding.question = check.question.clone();
        }
        keep_web_sources(&mut finding.sources);
        Ok(finding)
    }
}

// ============================================================================
// Judge
// ============================================================================

pub struct LlmJudge {
    client: Arc<StructuredClient>,
}

impl LlmJudge {
    pub fn new(client: Arc<StructuredClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn judge(
        &self,
        claim: &str,
        plan: &InvestigationPlan,
        findings: &[AspectFinding],
    ) -> Result<FactCheckReport> {
        let payload = json!({ "claim": claim, "plan": plan, "findings": findings });
        let mut report: FactCheckReport = run_skill(&self.client, &skills::JUDGE, &payload).await?;
        keep_web_sources(&mut report.sources);
        Ok(report)
    }
}

// ============================================================================
// Claim Extraction
// ============================================================================

pub struct LlmClaimExtractor {
    client: Arc<StructuredClient>,
}

impl LlmClaimExtractor {
    pub fn new(client: Arc<StructuredClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClaimExtractionBackend for LlmClaimExtractor {
    async fn extract(&self, input_text: &str, max_claims: usize) -> Result<ClaimExtractionResult> {
        let payload = json!({
            "input_text": input_text,
            "requirements": {
                "max_claims": max_claims,
                "decontextualized": true,
                "atomic_claims": true,
                "maximize_checkworthy_coverage": true,
                "only_directly_mentioned_facts": true,
            },
        });
        run_skill(&self.client, &skills::EXTRACT_CLAIMS, &payload).await
    }
}
