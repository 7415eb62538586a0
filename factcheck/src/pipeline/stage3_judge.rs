//! Stage 3: Synthesize findings into a verdict

use factcheck_sdk::{
    AspectFinding, FactCheckError, FactCheckReport, InvestigationPlan, Judge, ProgressKind,
    SourceEvidence,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use super::artifacts::RunArtifacts;
use super::normalize::normalize_source_url;
use super::progress::ProgressSink;
use super::stage2_research::clamp_unit;

pub struct JudgeStage {
    judge: Arc<dyn Judge>,
}

impl JudgeStage {
    pub fn new(judge: Arc<dyn Judge>) -> Self {
        Self { judge }
    }

    /// Ask the judge for a verdict and reconcile its report with `findings`
    ///
    /// The judge is called once; its failure is fatal for the run.
    pub async fn execute(
        &self,
        claim: &str,
        plan: &InvestigationPlan,
        findings: &[AspectFinding],
        artifacts: &mut RunArtifacts,
        progress: &ProgressSink,
    ) -> Result<FactCheckReport, FactCheckError> {
        progress
            .emit(
                ProgressKind::JudgingStarted,
                json!({ "finding_count": findings.len() }),
            )
            .await;

        let raw_report = self
            .judge
            .judge(claim, plan, findings)
            .await
            .map_err(FactCheckError::Judging)?;
        artifacts.report_raw = Some(raw_report.clone());

        let mut report = raw_report;
        report.claim = claim.to_string();
        report.verdict_confidence = clamp_unit(report.verdict_confidence);
        if report.findings.is_empty() {
            report.findings = findings.to_vec();
        }
        report.sources = merge_sources(&report.sources, findings);

        artifacts.report_final = Some(report.clone());

        progress
            .emit(
                ProgressKind::JudgingCompleted,
                json!({
                    "verdict": report.verdict,
                    "verdict_confidence": report.verdict_confidence,
                    "source_count": report.sources.len(),
                }),
            )
            .await;

        Ok(report)
    }
}

/// Deduplicate report sources followed by every finding's sources
///
/// Sources are keyed by [`normalize_source_url`]; the first record seen for a
/// key is kept unchanged and sources with a blank key are dropped.
pub fn merge_sources(
    report_sources: &[SourceEvidence],
    findings: &[AspectFinding],
) -> Vec<SourceEvidence> {
    let mut merged = Vec::new();
    let mut seen = HashSet::new();

    let candidates = report_sources
        .iter()
        .chain(findings.iter().flat_map(|f| f.sources.iter()));

    for source in candidates {
        let key = normalize_source_url(&source.url);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        merged.push(source.clone());
    }

    merged
}
