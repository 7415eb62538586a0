//! Error type for pipeline runs

use thiserror::Error;

/// Errors that terminate a pipeline call
///
/// Per-check research failures never show up here; the research stage turns
/// them into degraded findings. Capability failures carry the collaborator's
/// error unchanged.
#[derive(Debug, Error)]
pub enum FactCheckError {
    #[error("Claim is empty.")]
    EmptyClaim,

    #[error("Input text is empty.")]
    EmptyInput,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("planning failed: {0:#}")]
    Planning(anyhow::Error),

    #[error("judging failed: {0:#}")]
    Judging(anyhow::Error),

    #[error("claim extraction failed: {0:#}")]
    Extraction(anyhow::Error),

    #[error("research scheduler failed: {0}")]
    Scheduler(String),

    #[error("failed to persist run artifacts: {0:#}")]
    Persistence(anyhow::Error),
}

impl FactCheckError {
    /// True for errors raised before any remote call was made
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyClaim | Self::EmptyInput | Self::InvalidConfig(_)
        )
    }

    /// The collaborator error behind a capability failure, if any
    pub fn capability_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Planning(e) | Self::Judging(e) | Self::Extraction(e) => Some(e),
            _ => None,
        }
    }
}
