//! Per-run audit trail
//!
//! [`RunArtifacts`] captures every raw and normalized intermediate value of a
//! single fact-check run. It is created when the run starts, filled in by each
//! stage and left untouched once the run completes.

use chrono::{DateTime, Utc};
use factcheck_sdk::{AspectFinding, FactCheckReport, InvestigationPlan, VerificationCheck};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit record for one research check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchCheckArtifact {
    pub check: VerificationCheck,

    /// Number of research attempts made so far
    pub attempts: usize,

    /// One description per failed attempt, in attempt order
    #[serde(default)]
    pub errors: Vec<String>,

    /// Finding returned by the research capability; stays `None` for checks
    /// that were downgraded after exhausting their attempts
    #[serde(default)]
    pub finding: Option<AspectFinding>,
}

impl ResearchCheckArtifact {
    pub fn new(check: VerificationCheck) -> Self {
        Self {
            check,
            attempts: 0,
            errors: Vec::new(),
            finding: None,
        }
    }

    /// True when every attempt failed
    pub fn is_degraded(&self) -> bool {
        self.finding.is_none() && !self.errors.is_empty()
    }

    fn matches(&self, check: &VerificationCheck) -> bool {
        self.check.aspect_id == check.aspect_id && self.check.question == check.question
    }
}

/// Everything recorded during one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifacts {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    /// Claim exactly as supplied
    pub claim: String,

    /// Trimmed claim used by every stage
    pub normalized_claim: String,

    #[serde(default)]
    pub plan_raw: Option<InvestigationPlan>,

    #[serde(default)]
    pub plan_normalized: Option<InvestigationPlan>,

    #[serde(default)]
    pub research_checks: Vec<ResearchCheckArtifact>,

    #[serde(default)]
    pub report_raw: Option<FactCheckReport>,

    #[serde(default)]
    pub report_final: Option<FactCheckReport>,
}

impl RunArtifacts {
    pub fn new(claim: impl Into<String>, normalized_claim: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            claim: claim.into(),
            normalized_claim: normalized_claim.into(),
            plan_raw: None,
            plan_normalized: None,
            research_checks: Vec::new(),
            report_raw: None,
            report_final: None,
        }
    }

    /// Index of the artifact for `check`, creating it on first access
    ///
    /// Artifacts are keyed by `aspect_id` and `question` together.
    pub fn check_slot(&mut self, check: &VerificationCheck) -> usize {
        if let Some(index) = self.research_checks.iter().position(|a| a.matches(check)) {
            return index;
        }
        self.research_checks
            .push(ResearchCheckArtifact::new(check.clone()));
        self.research_checks.len() - 1
    }

    /// Artifact for `check`, creating it on first access
    pub fn get_or_create_check(&mut self, check: &VerificationCheck) -> &mut ResearchCheckArtifact {
        let slot = self.check_slot(check);
        &mut self.research_checks[slot]
    }

    /// Look up a check artifact by aspect id
    pub fn check(&self, aspect_id: &str) -> Option<&ResearchCheckArtifact> {
        self.research_checks
            .iter()
            .find(|a| a.check.aspect_id == aspect_id)
    }

    pub fn degraded_checks(&self) -> impl Iterator<Item = &ResearchCheckArtifact> {
        self.research_checks.iter().filter(|a| a.is_degraded())
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub(crate) fn mark_completed(&mut self) {
        self.completed_at = Some(Utc::now());
    }
}
