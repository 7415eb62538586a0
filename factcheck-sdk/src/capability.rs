//! Capability traits the pipeline calls into
//!
//! Each remote capability is its own trait so providers can be mixed and
//! matched. Implementations are shared across concurrent research tasks and
//! must therefore be `Send + Sync`.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{
    AspectFinding, ClaimExtractionResult, FactCheckReport, InvestigationPlan, SearchResults,
    VerificationCheck,
};

/// Decomposes a claim into verification checks
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, claim: &str, max_checks: usize) -> Result<InvestigationPlan>;
}

/// Investigates one check of a claim
#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, claim: &str, check: &VerificationCheck) -> Result<AspectFinding>;
}

/// Synthesizes findings into a verdict
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(
        &self,
        claim: &str,
        plan: &InvestigationPlan,
        findings: &[AspectFinding],
    ) -> Result<FactCheckReport>;
}

/// Pulls check-worthy claims out of arbitrary text
#[async_trait]
pub trait ClaimExtractionBackend: Send + Sync {
    async fn extract(&self, input_text: &str, max_claims: usize) -> Result<ClaimExtractionResult>;
}

/// Web search used by researcher implementations
///
/// The pipeline itself never calls a retriever.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(
        &self,
        queries: &[String],
        results_per_query: usize,
    ) -> Result<Vec<SearchResults>>;
}
