//! Stage 1: Decompose the claim into verification checks

use factcheck_sdk::{FactCheckError, InvestigationPlan, Planner, ProgressKind, VerificationCheck};
use serde_json::json;
use std::sync::Arc;

use super::artifacts::RunArtifacts;
use super::normalize::{normalize_plan_checks, normalize_query_list};
use super::progress::ProgressSink;

pub const FALLBACK_CHECK_ID: &str = "claim_direct_check";

const FALLBACK_RATIONALE: &str =
    "Fallback direct verification when planning yields no usable checks.";

pub struct PlanStage {
    planner: Arc<dyn Planner>,
    max_checks: usize,
    max_queries_per_check: usize,
}

impl PlanStage {
    pub fn new(planner: Arc<dyn Planner>, max_checks: usize, max_queries_per_check: usize) -> Self {
        Self {
            planner,
            max_checks,
            max_queries_per_check,
        }
    }

    /// Produce a normalized, non-empty plan for `claim`
    ///
    /// # Arguments
    /// - `claim`: Normalized claim text
    /// - `artifacts`: Receives the raw and normalized plans
    /// - `progress`: Receives `planning_started` and `planning_completed`
    pub async fn execute(
        &self,
        claim: &str,
        artifacts: &mut RunArtifacts,
        progress: &ProgressSink,
    ) -> Result<InvestigationPlan, FactCheckError> {
        progress
            .emit(
                ProgressKind::PlanningStarted,
                json!({ "claim": claim, "max_checks": self.max_checks }),
            )
            .await;

        let raw_plan = self
            .planner
            .plan(claim, self.max_checks)
            .await
            .map_err(FactCheckError::Planning)?;
        artifacts.plan_raw = Some(raw_plan.clone());

        let mut checks = normalize_plan_checks(
            claim,
            &raw_plan.checks,
            self.max_checks,
            self.max_queries_per_check,
        );

        let used_fallback = checks.is_empty();
        if used_fallback {
            tracing::debug!(
                raw_checks = raw_plan.checks.len(),
                "planner produced no usable checks; using direct check"
            );
            checks.push(self.fallback_check(claim));
        }

        let plan = InvestigationPlan {
            claim: claim.to_string(),
            checks,
            assumptions: raw_plan.assumptions,
        };
        artifacts.plan_normalized = Some(plan.clone());

        let listing: Vec<_> = plan
            .checks
            .iter()
            .map(|c| json!({ "aspect_id": c.aspect_id, "question": c.question }))
            .collect();
        progress
            .emit(
                ProgressKind::PlanningCompleted,
                json!({
                    "check_count": plan.checks.len(),
                    "checks": listing,
                    "used_fallback": used_fallback,
                }),
            )
            .await;

        Ok(plan)
    }

    fn fallback_check(&self, claim: &str) -> VerificationCheck {
        VerificationCheck::new(FALLBACK_CHECK_ID, format!("Is this claim accurate: {}", claim))
            .with_rationale(FALLBACK_RATIONALE)
            .with_queries(normalize_query_list(
                &[claim],
                &[] as &[&str],
                self.max_queries_per_check,
            ))
    }
}
