//! Fact-check pipeline engine
//!
//! Stages run in order and share one [`RunArtifacts`] per run:
//! - **stage1_plan**: decompose the claim into normalized checks
//! - **stage2_research**: research each check under bounded concurrency
//! - **stage3_judge**: synthesize a verdict and merge sources
//!
//! [`FactCheckService`] sequences the stages; [`ClaimExtractionService`] is the
//! separate single-stage extraction pipeline.

pub mod artifacts;
pub mod extraction;
pub mod normalize;
pub mod progress;
pub mod repository;
pub mod service;
pub mod stage1_plan;
pub mod stage2_research;
pub mod stage3_judge;

pub use artifacts::{ResearchCheckArtifact, RunArtifacts};
pub use extraction::{ClaimExtractionService, ClaimExtractionStage};
pub use normalize::{
    normalize_plan_checks, normalize_query_list, normalize_source_url, sanitize_identifier,
};
pub use progress::ProgressSink;
pub use repository::{
    ArtifactFormat, FileRunArtifactRepository, InMemoryRunArtifactRepository,
    RunArtifactRepository,
};
pub use service::{FactCheckRun, FactCheckService};
pub use stage1_plan::{PlanStage, FALLBACK_CHECK_ID};
pub use stage2_research::{degraded_finding, ResearchStage, DEGRADED_CAVEAT};
pub use stage3_judge::{merge_sources, JudgeStage};
