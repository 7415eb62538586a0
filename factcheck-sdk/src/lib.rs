//! SDK for building factcheck collaborators
//!
//! Everything an external planner, researcher, judge, extraction backend,
//! retriever or progress observer needs to plug into a factcheck pipeline:
//! - **types**: the data model exchanged with capabilities
//! - **capability**: one async trait per remote capability
//! - **progress**: progress events and ready-made observers
//! - **error**: the error type that terminates a pipeline call

pub mod capability;
pub mod error;
pub mod progress;
pub mod types;

// Re-export async trait for convenience
pub use async_trait::async_trait;

pub use capability::{ClaimExtractionBackend, Judge, Planner, Researcher, Retriever};
pub use error::FactCheckError;
pub use progress::{
    progress_channel, ChannelObserver, FnObserver, ProgressEvent, ProgressKind,
    ProgressObserver, StderrObserver, EVENT_LINE_PREFIX,
};
pub use types::{
    AspectFinding, CheckworthyClaim, ClaimExtractionResult, EvidenceSignal, FactCheckReport,
    InvestigationPlan, SearchHit, SearchResults, SourceEvidence, VeracityVerdict,
    VerificationCheck,
};
