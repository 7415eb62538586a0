//! Plan stage: normalization, fallback and artifact capture

use super::common::*;
use factcheck::pipeline::{PlanStage, ProgressSink, RunArtifacts, FALLBACK_CHECK_ID};
use factcheck_sdk::{progress_channel, FactCheckError, InvestigationPlan, VerificationCheck};
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn test_plan_is_normalized_and_recorded() {
    let raw = plan_with(vec![
        VerificationCheck::new("Timeline 1", "  Was it completed in 1889?  ")
            .with_queries(["", "Eiffel Tower 1889", "eiffel tower 1889"]),
        VerificationCheck::new("timeline_1", "Was it for the World's Fair?"),
        VerificationCheck::new("", "   "),
    ]);
    let stage = PlanStage::new(Arc::new(StaticPlanner::new(raw.clone())), 4, 3);
    let mut artifacts = RunArtifacts::new("claim", "claim");

    let plan = stage
        .execute("claim", &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap();

    let ids: Vec<_> = plan.checks.iter().map(|c| c.aspect_id.as_str()).collect();
    assert_eq!(ids, vec!["timeline_1", "timeline_1_2"]);
    assert_eq!(plan.checks[0].question, "Was it completed in 1889?");
    assert_eq!(
        plan.checks[0].search_queries,
        vec!["Eiffel Tower 1889", "Was it completed in 1889?", "claim"]
    );
    assert_eq!(plan.claim, "claim");

    assert_eq!(artifacts.plan_raw.as_ref(), Some(&raw));
    assert_eq!(artifacts.plan_normalized.as_ref(), Some(&plan));
}

#[tokio::test]
async fn test_plan_respects_bounds() {
    let raw = plan_with(
        (0..10)
            .map(|i| {
                VerificationCheck::new("same", format!("Question {}?", i))
                    .with_queries(["a", "A", "b", "c", "d"])
            })
            .collect(),
    );
    let stage = PlanStage::new(Arc::new(StaticPlanner::new(raw)), 3, 2);
    let mut artifacts = RunArtifacts::new("claim", "claim");

    let plan = stage
        .execute("claim", &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap();

    assert_eq!(plan.checks.len(), 3);
    let ids: HashSet<_> = plan.checks.iter().map(|c| &c.aspect_id).collect();
    assert_eq!(ids.len(), 3);
    for check in &plan.checks {
        assert!(!check.question.is_empty());
        assert_eq!(check.search_queries, vec!["a", "b"]);
    }
}

#[tokio::test]
async fn test_empty_plan_uses_direct_check() {
    let mut raw = InvestigationPlan::new("claim", vec![VerificationCheck::new("x", "  ")]);
    raw.assumptions = vec!["kept".to_string()];
    let stage = PlanStage::new(Arc::new(StaticPlanner::new(raw)), 4, 5);
    let mut artifacts = RunArtifacts::new(EIFFEL_CLAIM, EIFFEL_CLAIM);
    let (observer, mut rx) = progress_channel();

    let plan = stage
        .execute(EIFFEL_CLAIM, &mut artifacts, &ProgressSink::new(Arc::new(observer)))
        .await
        .unwrap();

    assert_eq!(plan.checks.len(), 1);
    let fallback = &plan.checks[0];
    assert_eq!(fallback.aspect_id, FALLBACK_CHECK_ID);
    assert_eq!(fallback.question, format!("Is this claim accurate: {}", EIFFEL_CLAIM));
    assert_eq!(
        fallback.rationale,
        "Fallback direct verification when planning yields no usable checks."
    );
    assert_eq!(fallback.search_queries, vec![EIFFEL_CLAIM.to_string()]);
    assert_eq!(plan.assumptions, vec!["kept".to_string()]);

    let events = drain(&mut rx);
    assert_eq!(kinds(&events), vec!["planning_started", "planning_completed"]);
    assert_eq!(events[1].get_u64("check_count"), Some(1));
    assert_eq!(events[1].get("used_fallback"), Some(&serde_json::json!(true)));
}

#[tokio::test]
async fn test_planning_completed_lists_checks() {
    let stage = PlanStage::new(Arc::new(StaticPlanner::new(eiffel_plan())), 4, 5);
    let mut artifacts = RunArtifacts::new(EIFFEL_CLAIM, EIFFEL_CLAIM);
    let (observer, mut rx) = progress_channel();

    stage
        .execute(EIFFEL_CLAIM, &mut artifacts, &ProgressSink::new(Arc::new(observer)))
        .await
        .unwrap();

    let events = drain(&mut rx);
    let completed = &events[1];
    let listing = completed.get("checks").and_then(|v| v.as_array()).unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0]["aspect_id"], "timeline_1");
    assert_eq!(listing[1]["question"], "Was it built for the 1889 Exposition Universelle?");
    assert_eq!(completed.get("used_fallback"), Some(&serde_json::json!(false)));
}

#[tokio::test]
async fn test_planner_failure_is_fatal() {
    let stage = PlanStage::new(Arc::new(FailingPlanner), 4, 5);
    let mut artifacts = RunArtifacts::new("claim", "claim");

    let err = stage
        .execute("claim", &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap_err();

    assert!(matches!(err, FactCheckError::Planning(_)));
    assert!(err.to_string().contains("planner offline"));
    assert!(artifacts.plan_raw.is_none());
}
