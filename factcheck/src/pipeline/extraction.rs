//! Claim extraction: pull check-worthy claims out of free text

use factcheck_sdk::{
    ClaimExtractionBackend, ClaimExtractionResult, FactCheckError, ProgressKind, ProgressObserver,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use super::progress::ProgressSink;

pub struct ClaimExtractionStage {
    backend: Arc<dyn ClaimExtractionBackend>,
    max_claims: usize,
}

impl ClaimExtractionStage {
    pub fn new(backend: Arc<dyn ClaimExtractionBackend>, max_claims: usize) -> Self {
        Self {
            backend,
            max_claims,
        }
    }

    pub async fn execute(
        &self,
        input_text: &str,
        progress: &ProgressSink,
    ) -> Result<ClaimExtractionResult, FactCheckError> {
        let text = input_text.trim();
        if text.is_empty() {
            return Err(FactCheckError::EmptyInput);
        }

        progress
            .emit(
                ProgressKind::ExtractionStarted,
                json!({ "input_chars": text.chars().count(), "max_claims": self.max_claims }),
            )
            .await;

        let mut extraction = self
            .backend
            .extract(text, self.max_claims)
            .await
            .map_err(FactCheckError::Extraction)?;

        extraction.input_text = text.to_string();
        extraction.claims.truncate(self.max_claims);
        assign_claim_ids(&mut extraction);

        progress
            .emit(
                ProgressKind::ExtractionCompleted,
                json!({ "claim_count": extraction.claims.len() }),
            )
            .await;

        Ok(extraction)
    }
}

/// Give every claim a non-blank id that is unique within the result
///
/// Blank ids become `claim_{n}` with `n` the 1-based position. A colliding id
/// gets `_{n}` appended, with `n` bumped until the id is free.
fn assign_claim_ids(extraction: &mut ClaimExtractionResult) {
    let mut seen: HashSet<String> = HashSet::new();

    for (index, claim) in extraction.claims.iter_mut().enumerate() {
        let position = index + 1;
        let base = claim.claim_id.trim();
        let base = if base.is_empty() {
            format!("claim_{}", position)
        } else {
            base.to_string()
        };

        let mut claim_id = base.clone();
        let mut suffix = position;
        while seen.contains(&claim_id) {
            claim_id = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        seen.insert(claim_id.clone());
        claim.claim_id = claim_id;
    }
}

/// Single-stage pipeline facade for claim extraction
pub struct ClaimExtractionService {
    stage: ClaimExtractionStage,
    progress_timeout: Option<std::time::Duration>,
}

impl ClaimExtractionService {
    pub fn new(stage: ClaimExtractionStage) -> Self {
        Self {
            stage,
            progress_timeout: None,
        }
    }

    pub fn with_progress_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
        self.progress_timeout = timeout;
        self
    }

    pub async fn extract_claims(&self, input_text: &str) -> Result<ClaimExtractionResult, FactCheckError> {
        self.stage.execute(input_text, &ProgressSink::disabled()).await
    }

    pub async fn extract_claims_with_progress(
        &self,
        input_text: &str,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<ClaimExtractionResult, FactCheckError> {
        let progress = ProgressSink::new(observer).with_timeout(self.progress_timeout);
        self.stage.execute(input_text, &progress).await
    }
}
