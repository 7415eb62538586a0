//! Remote capability implementations
//!
//! - **profile**: provider credentials, endpoints and default models
//! - **client**: structured-output client for OpenAI-compatible APIs
//! - **adapters**: planner, researcher, judge and claim extractor
//! - **brave**: Brave Search retriever
//! - **skills**: the built-in prompt for each capability

pub mod adapters;
pub mod brave;
pub mod client;
pub mod profile;
pub mod skills;

pub use adapters::{LlmClaimExtractor, LlmJudge, LlmPlanner, LlmResearcher};
pub use brave::BraveSearchRetriever;
pub use client::StructuredClient;
pub use profile::{ProviderProfile, ResolvedInference};
pub use skills::{find_skill, list_skills, Skill};
