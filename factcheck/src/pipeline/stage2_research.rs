//! Stage 2: Research every check under bounded concurrency
//!
//! One task per check, admitted by a shared semaphore. A task holds its
//! permit for all of its attempts, so at most `max_parallel` checks are ever
//! being researched at once. Failed or timed-out attempts are retried; a
//! check that exhausts its attempts is downgraded to an `insufficient`
//! finding instead of failing the run.

use factcheck_sdk::{
    AspectFinding, EvidenceSignal, FactCheckError, InvestigationPlan, ProgressKind, Researcher,
    VerificationCheck,
};
use futures::{stream::FuturesUnordered, StreamExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::artifacts::RunArtifacts;
use super::progress::ProgressSink;

pub const DEGRADED_CAVEAT: &str = "This check failed and was downgraded to insufficient evidence.";

pub struct ResearchStage {
    researcher: Arc<dyn Researcher>,
    max_parallel: usize,
    timeout: Option<Duration>,
    retry_attempts: usize,
    retry_delay: Duration,
}

/// What one research task observed, merged into the run artifacts at fan-in
#[derive(Debug, Default)]
struct CheckOutcome {
    attempts: usize,
    errors: Vec<String>,
    finding: Option<AspectFinding>,
}

impl ResearchStage {
    pub fn new(researcher: Arc<dyn Researcher>, max_parallel: usize) -> Self {
        Self {
            researcher,
            max_parallel: max_parallel.max(1),
            timeout: None,
            retry_attempts: 0,
            retry_delay: Duration::ZERO,
        }
    }

    /// Per-attempt timeout; `None` lets an attempt run forever
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn with_retries(mut self, retry_attempts: usize, retry_delay: Duration) -> Self {
        self.retry_attempts = retry_attempts;
        self.retry_delay = retry_delay;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.retry_attempts.saturating_add(1)
    }

    /// Research every check of `plan`
    ///
    /// # Returns
    /// One finding per check, in plan order regardless of completion order
    ///
    /// # Errors
    /// Only scheduler failures escape; per-check errors become degraded
    /// findings.
    pub async fn execute(
        &self,
        claim: &str,
        plan: &InvestigationPlan,
        artifacts: &mut RunArtifacts,
        progress: &ProgressSink,
    ) -> Result<Vec<AspectFinding>, FactCheckError> {
        let checks = &plan.checks;
        let total = checks.len();

        progress
            .emit(
                ProgressKind::ResearchStarted,
                json!({ "check_count": total, "max_parallel": self.max_parallel }),
            )
            .await;

        // Artifact slots exist before any task starts
        let slots: Vec<usize> = checks.iter().map(|c| artifacts.check_slot(c)).collect();

        let sem = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = FuturesUnordered::new();

        for (index, check) in checks.iter().enumerate() {
            let sem = sem.clone();

            tasks.push(async move {
                // Blocks while max_parallel checks are running
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|_| FactCheckError::Scheduler("Semaphore closed".to_string()))?;

                let outcome = self.run_check(claim, check).await;
                Ok::<_, FactCheckError>((index, outcome))
            });
        }

        let mut findings: Vec<Option<AspectFinding>> = vec![None; total];
        let mut degraded_count = 0;

        while let Some(result) = tasks.next().await {
            let (index, outcome) = result?;
            let check = &checks[index];

            let artifact = &mut artifacts.research_checks[slots[index]];
            artifact.attempts += outcome.attempts;
            artifact.errors.extend(outcome.errors.iter().cloned());

            let finding = match outcome.finding {
                Some(finding) => {
                    artifact.finding = Some(finding.clone());
                    progress
                        .emit(
                            ProgressKind::ResearchCheckCompleted,
                            json!({
                                "aspect_id": check.aspect_id,
                                "signal": finding.signal,
                                "confidence": finding.confidence,
                                "attempts": outcome.attempts,
                            }),
                        )
                        .await;
                    finding
                }
                None => {
                    degraded_count += 1;
                    let last_error = outcome.errors.last().cloned().unwrap_or_default();
                    progress
                        .emit(
                            ProgressKind::ResearchCheckFailed,
                            json!({
                                "aspect_id": check.aspect_id,
                                "attempts": outcome.attempts,
                                "error": last_error,
                            }),
                        )
                        .await;
                    degraded_finding(check, self.max_attempts(), &last_error)
                }
            };

            findings[index] = Some(finding);
        }

        let findings: Vec<AspectFinding> = findings
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| FactCheckError::Scheduler("research task lost".to_string()))?;

        tracing::debug!(
            finding_count = findings.len(),
            degraded_count,
            "research stage finished"
        );
        progress
            .emit(
                ProgressKind::ResearchCompleted,
                json!({ "finding_count": findings.len(), "degraded_count": degraded_count }),
            )
            .await;

        Ok(findings)
    }

    async fn run_check(&self, claim: &str, check: &VerificationCheck) -> CheckOutcome {
        let max_attempts = self.max_attempts();
        let mut outcome = CheckOutcome::default();

        for attempt in 1..=max_attempts {
            if attempt > 1 && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }

            outcome.attempts += 1;
            match self.attempt(claim, check).await {
                Ok(finding) => {
                    outcome.finding = Some(finding);
                    break;
                }
                Err(error) => {
                    tracing::warn!(
                        aspect_id = %check.aspect_id,
                        attempt,
                        max_attempts,
                        error = %error,
                        "research attempt failed"
                    );
                    outcome.errors.push(error);
                }
            }
        }

        outcome
    }

    async fn attempt(&self, claim: &str, check: &VerificationCheck) -> Result<AspectFinding, String> {
        let call = self.researcher.research(claim, check);

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(format!(
                        "Timeout: research exceeded {:.1}s",
                        limit.as_secs_f64()
                    ))
                }
            },
            None => call.await,
        };

        result
            .map(|finding| complete_finding(finding, check))
            .map_err(|e| format!("{:#}", e))
    }
}

/// Backfill identity fields from the check and clamp confidence
fn complete_finding(mut finding: AspectFinding, check: &VerificationCheck) -> AspectFinding {
    if finding.aspect_id.trim().is_empty() {
        finding.aspect_id = check.aspect_id.clone();
    }
    if finding.question.trim().is_empty() {
        finding.question = check.question.clone();
    }
    finding.confidence = clamp_unit(finding.confidence);
    finding
}

/// Clamp into `[0, 1]`, mapping NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Finding substituted for a check whose every attempt failed
pub fn degraded_finding(check: &VerificationCheck, attempts: usize, last_error: &str) -> AspectFinding {
    let mut finding = AspectFinding::new(
        check.aspect_id.clone(),
        check.question.clone(),
        EvidenceSignal::Insufficient,
        format!(
            "Research subroutine failed after {} attempt(s): {}",
            attempts, last_error
        ),
        0.0,
    );
    finding.caveats.push(DEGRADED_CAVEAT.to_string());
    finding
}
