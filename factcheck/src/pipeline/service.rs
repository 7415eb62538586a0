//! Pipeline facade: Plan → Research → Judge

use factcheck_sdk::{
    AspectFinding, FactCheckError, FactCheckReport, InvestigationPlan, ProgressKind,
    ProgressObserver,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::artifacts::RunArtifacts;
use super::progress::ProgressSink;
use super::repository::RunArtifactRepository;
use super::stage1_plan::PlanStage;
use super::stage2_research::ResearchStage;
use super::stage3_judge::JudgeStage;

/// Everything a completed run produced
#[derive(Debug, Clone, Serialize)]
pub struct FactCheckRun {
    pub claim: String,
    pub plan: InvestigationPlan,
    pub findings: Vec<AspectFinding>,
    pub report: FactCheckReport,
    pub artifacts: RunArtifacts,
}

pub struct FactCheckService {
    plan_stage: PlanStage,
    research_stage: ResearchStage,
    judge_stage: JudgeStage,
    repository: Option<Arc<dyn RunArtifactRepository>>,
    progress_timeout: Option<Duration>,
}

impl FactCheckService {
    pub fn new(plan_stage: PlanStage, research_stage: ResearchStage, judge_stage: JudgeStage) -> Self {
        Self {
            plan_stage,
            research_stage,
            judge_stage,
            repository: None,
            progress_timeout: None,
        }
    }

    /// Save the artifacts of every successful run to `repository`
    pub fn with_repository(mut self, repository: Arc<dyn RunArtifactRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Abandon a progress delivery after `timeout`; `None` waits forever
    pub fn with_progress_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.progress_timeout = timeout;
        self
    }

    pub async fn check_claim(&self, claim: &str) -> Result<FactCheckRun, FactCheckError> {
        self.run(claim, ProgressSink::disabled()).await
    }

    pub async fn check_claim_with_progress(
        &self,
        claim: &str,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<FactCheckRun, FactCheckError> {
        let progress = ProgressSink::new(observer).with_timeout(self.progress_timeout);
        self.run(claim, progress).await
    }

    async fn run(&self, claim: &str, progress: ProgressSink) -> Result<FactCheckRun, FactCheckError> {
        let normalized = claim.trim();
        if normalized.is_empty() {
            return Err(FactCheckError::EmptyClaim);
        }

        let mut artifacts = RunArtifacts::new(claim, normalized);
        tracing::debug!(run_id = %artifacts.run_id, claim = normalized, "fact-check run started");
        progress
            .emit(ProgressKind::RunStarted, json!({ "claim": normalized }))
            .await;

        match self.run_stages(normalized, &mut artifacts, &progress).await {
            Ok((plan, findings, report)) => {
                progress
                    .emit(
                        ProgressKind::RunCompleted,
                        json!({
                            "claim": normalized,
                            "verdict": report.verdict,
                            "verdict_confidence": report.verdict_confidence,
                        }),
                    )
                    .await;

                Ok(FactCheckRun {
                    claim: normalized.to_string(),
                    plan,
                    findings,
                    report,
                    artifacts,
                })
            }
            Err(e) => {
                tracing::debug!(run_id = %artifacts.run_id, error = %e, "fact-check run failed");
                progress
                    .emit(
                        ProgressKind::RunFailed,
                        json!({ "claim": normalized, "error": e.to_string() }),
                    )
                    .await;
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        claim: &str,
        artifacts: &mut RunArtifacts,
        progress: &ProgressSink,
    ) -> Result<(InvestigationPlan, Vec<AspectFinding>, FactCheckReport), FactCheckError> {
        let plan = self.plan_stage.execute(claim, artifacts, progress).await?;
        let findings = self
            .research_stage
            .execute(claim, &plan, artifacts, progress)
            .await?;
        let report = self
            .judge_stage
            .execute(claim, &plan, &findings, artifacts, progress)
            .await?;

        artifacts.mark_completed();

        if let Some(repository) = &self.repository {
            repository
                .save(artifacts)
                .await
                .map_err(FactCheckError::Persistence)?;
        }

        Ok((plan, findings, report))
    }
}
