//! Text and JSON rendering for CLI output

use anyhow::{Context, Result};
use factcheck_sdk::ClaimExtractionResult;
use serde_json::{json, Map, Value};

use crate::pipeline::FactCheckRun;

/// Human-readable report for one run
pub fn format_run_text(run: &FactCheckRun, show_plan: bool) -> String {
    let report = &run.report;
    let mut lines: Vec<String> = Vec::new();

    lines.push("Claim".to_string());
    lines.push(format!("  {}", run.claim));
    lines.push(String::new());
    lines.push("Verdict".to_string());
    lines.push(format!(
        "  {} (confidence: {:.2})",
        report.verdict, report.verdict_confidence
    ));
    lines.push(String::new());
    lines.push("Justification".to_string());
    lines.push(format!("  {}", report.justification));

    if !report.key_points.is_empty() {
        lines.push(String::new());
        lines.push("Key Points".to_string());
        lines.extend(report.key_points.iter().map(|p| format!("  - {}", p)));
    }

    if show_plan {
        lines.push(String::new());
        lines.push("Plan".to_string());
        for check in &run.plan.checks {
            lines.push(format!("  - [{}] {}", check.aspect_id, check.question));
            if !check.rationale.is_empty() {
                lines.push(format!("    rationale: {}", check.rationale));
            }
            if !check.search_queries.is_empty() {
                lines.push(format!("    queries: {}", check.search_queries.join(", ")));
            }
        }
    }

    lines.push(String::new());
    lines.push("Findings".to_string());
    if report.findings.is_empty() {
        lines.push("  - no findings returned".to_string());
    }
    for finding in &report.findings {
        lines.push(format!(
            "  - [{}] {} | confidence {:.2}",
            finding.aspect_id, finding.signal, finding.confidence
        ));
        lines.push(format!("    question: {}", finding.question));
        lines.push(format!("    summary: {}", finding.summary));
        if !finding.caveats.is_empty() {
            lines.push(format!("    caveats: {}", finding.caveats.join("; ")));
        }
    }

    lines.push(String::new());
    lines.push("Sources".to_string());
    if report.sources.is_empty() {
        lines.push("  - no sources returned".to_string());
    }
    for (idx, source) in report.sources.iter().enumerate() {
        lines.push(format!("  [{}] {}", idx + 1, source.title));
        lines.push(format!("      {}", source.url));
        if !source.snippet.is_empty() {
            lines.push(format!("      {}", source.snippet));
        }
    }

    lines.join("\n")
}

/// JSON document for one run
///
/// Always carries `report`; `plan`, `findings` and `artifacts` are added when
/// `include_artifacts` is set.
pub fn run_to_json(run: &FactCheckRun, include_artifacts: bool) -> Result<Value> {
    let mut document = Map::new();
    document.insert(
        "report".to_string(),
        serde_json::to_value(&run.report).context("Failed to serialize report")?,
    );

    if include_artifacts {
        document.insert("plan".to_string(), serde_json::to_value(&run.plan)?);
        document.insert("findings".to_string(), serde_json::to_value(&run.findings)?);
        document.insert("artifacts".to_string(), serde_json::to_value(&run.artifacts)?);
    }

    Ok(Value::Object(document))
}

pub fn format_extraction_text(result: &ClaimExtractionResult) -> String {
    if result.claims.is_empty() {
        return "No check-worthy claims found.".to_string();
    }

    let mut lines = vec![format!("Extracted {} claim(s)", result.claims.len())];
    for (idx, claim) in result.claims.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. [{}] {}", idx + 1, claim.claim_id, claim.claim_text));
        if !claim.source_fragment.is_empty() {
            lines.push(format!("   fragment: {}", claim.source_fragment));
        }
        if !claim.checkworthy_reason.is_empty() {
            lines.push(format!("   why: {}", claim.checkworthy_reason));
        }
    }
    lines.join("\n")
}

pub fn extraction_to_json(result: &ClaimExtractionResult) -> Result<Value> {
    Ok(json!({
        "claim_count": result.claims.len(),
        "extraction": serde_json::to_value(result).context("Failed to serialize extraction")?,
    }))
}
