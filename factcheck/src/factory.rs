//! Build services from configuration

use anyhow::{Context, Result};
use factcheck_sdk::Retriever;
use std::sync::Arc;

use crate::config::{ClaimExtractionConfig, FactCheckConfig, InferenceConfig, SearchProviderKind};
use crate::pipeline::{
    ClaimExtractionService, ClaimExtractionStage, FactCheckService, JudgeStage, PlanStage,
    ResearchStage, RunArtifactRepository,
};
use crate::providers::{
    BraveSearchRetriever, LlmClaimExtractor, LlmJudge, LlmPlanner, LlmResearcher,
    ResolvedInference, StructuredClient,
};

fn build_client(inference: &InferenceConfig) -> Result<Arc<StructuredClient>> {
    let resolved = ResolvedInference::from_config(inference)?;
    tracing::debug!(
        provider = ?resolved.kind,
        model = %resolved.model,
        base_url = %resolved.base_url,
        "resolved inference provider"
    );
    Ok(Arc::new(StructuredClient::new(&resolved)?))
}

fn build_researcher(config: &FactCheckConfig, client: Arc<StructuredClient>) -> Result<LlmResearcher> {
    let researcher = LlmResearcher::new(client);
    match config.search_provider {
        SearchProviderKind::Openai => Ok(researcher.with_hosted_search(config.search_context_size)),
        SearchProviderKind::Brave => {
            let retriever: Arc<dyn Retriever> =
                Arc::new(BraveSearchRetriever::from_env().context("Brave search is enabled")?);
            Ok(researcher.with_retriever(
                retriever,
                config.search_results_per_query,
                config.max_search_queries_per_check,
            ))
        }
    }
}

/// Build the plan, research and judge pipeline described by `config`
pub fn build_fact_check_service(
    config: &FactCheckConfig,
    repository: Option<Arc<dyn RunArtifactRepository>>,
) -> Result<FactCheckService> {
    config.validate()?;

    let client = build_client(&config.inference)?;

    let researcher = build_researcher(config, client.clone())?;

    let plan_stage = PlanStage::new(
        Arc::new(LlmPlanner::new(client.clone())),
        config.max_checks,
        config.max_search_queries_per_check,
    );
    let research_stage = ResearchStage::new(Arc::new(researcher), config.max_parallel_research)
        .with_timeout(config.research_timeout())
        .with_retries(config.research_retry_attempts, config.research_retry_delay());
    let judge_stage = JudgeStage::new(Arc::new(LlmJudge::new(client)));

    let mut service = FactCheckService::new(plan_stage, research_stage, judge_stage)
        .with_progress_timeout(config.progress_timeout());
    if let Some(repository) = repository {
        service = service.with_repository(repository);
    }
    Ok(service)
}

pub fn build_claim_extraction_service(config: &ClaimExtractionConfig) -> Result<ClaimExtractionService> {
    config.validate()?;

    let client = build_client(&config.inference)?;
    let stage = ClaimExtractionStage::new(Arc::new(LlmClaimExtractor::new(client)), config.max_claims);
    Ok(ClaimExtractionService::new(stage).with_progress_timeout(config.progress_timeout()))
}
