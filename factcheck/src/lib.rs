//! Claim fact-checking pipeline
//!
//! A claim is decomposed into verification checks, each check is researched
//! concurrently and the findings are judged into a single verdict. The
//! pipeline engine lives in [`pipeline`] and depends only on the capability
//! traits from `factcheck-sdk`; [`providers`] and [`factory`] plug in the
//! OpenAI-compatible and Brave Search implementations.

pub mod cli;
pub mod config;
pub mod factory;
pub mod pipeline;
pub mod providers;
pub mod render;
pub mod util;

pub use config::{
    ClaimExtractionConfig, FactCheckConfig, InferenceConfig, ProviderKind, SearchContextSize,
    SearchProviderKind,
};
pub use pipeline::{
    ClaimExtractionService, FactCheckRun, FactCheckService, FileRunArtifactRepository,
    InMemoryRunArtifactRepository, RunArtifactRepository, RunArtifacts,
};
