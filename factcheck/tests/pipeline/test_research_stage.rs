//! Research stage: ordering, retries, timeouts, degradation and concurrency

use super::common::*;
use factcheck::pipeline::{ProgressSink, ResearchStage, RunArtifacts, DEGRADED_CAVEAT};
use factcheck_sdk::{progress_channel, EvidenceSignal, ProgressKind};
use std::sync::Arc;
use std::time::Duration;

fn artifacts() -> RunArtifacts {
    RunArtifacts::new(EIFFEL_CLAIM, EIFFEL_CLAIM)
}

#[tokio::test]
async fn test_findings_follow_plan_order_not_completion_order() {
    let plan = plan_with(vec![check("slow", "Slow?"), check("fast", "Fast?")]);
    let researcher = FakeResearcher::new()
        .with(
            "slow",
            Behavior::Delay(
                Duration::from_millis(50),
                finding("slow", "Slow?", EvidenceSignal::Refutes, 0.7),
            ),
        )
        .with(
            "fast",
            Behavior::Succeed(finding("fast", "Fast?", EvidenceSignal::Supports, 0.6)),
        );
    let stage = ResearchStage::new(Arc::new(researcher), 2);
    let (observer, mut rx) = progress_channel();
    let mut artifacts = artifacts();

    let findings = stage
        .execute(EIFFEL_CLAIM, &plan, &mut artifacts, &ProgressSink::new(Arc::new(observer)))
        .await
        .unwrap();

    let ids: Vec<_> = findings.iter().map(|f| f.aspect_id.as_str()).collect();
    assert_eq!(ids, vec!["slow", "fast"]);

    // Per-check events arrive in completion order
    let events = drain(&mut rx);
    let completed: Vec<_> = events
        .iter()
        .filter(|e| e.kind == ProgressKind::ResearchCheckCompleted)
        .filter_map(|e| e.get_str("aspect_id"))
        .collect();
    assert_eq!(completed, vec!["fast", "slow"]);
    assert_eq!(events.first().unwrap().kind, ProgressKind::ResearchStarted);
    assert_eq!(events.last().unwrap().kind, ProgressKind::ResearchCompleted);
}

#[tokio::test]
async fn test_always_failing_check_is_degraded_after_retries() {
    let plan = plan_with(vec![check("broken", "Does it work?")]);
    let researcher = Arc::new(FakeResearcher::new().with("broken", Behavior::Fail("upstream 503")));
    let stage = ResearchStage::new(researcher.clone(), 4).with_retries(1, Duration::ZERO);
    let mut artifacts = artifacts();

    let findings = stage
        .execute(EIFFEL_CLAIM, &plan, &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap();

    assert_eq!(findings.len(), 1);
    let degraded = &findings[0];
    assert_eq!(degraded.aspect_id, "broken");
    assert_eq!(degraded.question, "Does it work?");
    assert_eq!(degraded.signal, EvidenceSignal::Insufficient);
    assert_eq!(degraded.confidence, 0.0);
    assert!(degraded.sources.is_empty());
    assert_eq!(
        degraded.summary,
        "Research subroutine failed after 2 attempt(s): upstream 503"
    );
    assert_eq!(degraded.caveats, vec![DEGRADED_CAVEAT.to_string()]);

    let record = artifacts.check("broken").unwrap();
    assert_eq!(record.attempts, 2);
    assert_eq!(record.errors, vec!["upstream 503", "upstream 503"]);
    assert!(record.finding.is_none());
    assert!(record.is_degraded());
    assert_eq!(researcher.calls_for("broken"), 2);
}

#[tokio::test]
async fn test_retry_recovers_transient_failure() {
    let plan = plan_with(vec![check("flaky", "Flaky?")]);
    let recovered = finding("flaky", "Flaky?", EvidenceSignal::Mixed, 0.4);
    let researcher = FakeResearcher::new().with("flaky", Behavior::FailTimes(1, recovered.clone()));
    let stage = ResearchStage::new(Arc::new(researcher), 1).with_retries(2, Duration::from_millis(1));
    let mut artifacts = artifacts();

    let findings = stage
        .execute(EIFFEL_CLAIM, &plan, &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap();

    assert_eq!(findings, vec![recovered.clone()]);
    let record = artifacts.check("flaky").unwrap();
    assert_eq!(record.attempts, 2);
    assert_eq!(record.errors, vec!["transient failure 1"]);
    assert_eq!(record.finding.as_ref(), Some(&recovered));
}

#[tokio::test]
async fn test_no_retries_means_single_attempt() {
    let plan = plan_with(vec![check("broken", "Broken?")]);
    let researcher = Arc::new(FakeResearcher::new().with("broken", Behavior::Fail("nope")));
    let stage = ResearchStage::new(researcher.clone(), 1);
    let mut artifacts = artifacts();

    let findings = stage
        .execute(EIFFEL_CLAIM, &plan, &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap();

    assert_eq!(researcher.calls_for("broken"), 1);
    assert!(findings[0].summary.starts_with("Research subroutine failed after 1 attempt(s)"));
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_count_as_failed_attempts() {
    let plan = plan_with(vec![check("stuck", "Stuck?"), check("ok", "Ok?")]);
    let researcher = Arc::new(FakeResearcher::new().with("stuck", Behavior::Hang));
    let stage = ResearchStage::new(researcher.clone(), 2)
        .with_timeout(Some(Duration::from_secs(2)))
        .with_retries(1, Duration::ZERO);
    let mut artifacts = artifacts();

    let findings = stage
        .execute(EIFFEL_CLAIM, &plan, &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap();

    assert_eq!(findings[0].signal, EvidenceSignal::Insufficient);
    assert_eq!(findings[1].signal, EvidenceSignal::Supports);

    let record = artifacts.check("stuck").unwrap();
    assert_eq!(record.attempts, 2);
    assert_eq!(
        record.errors,
        vec!["Timeout: research exceeded 2.0s", "Timeout: research exceeded 2.0s"]
    );
    assert_eq!(researcher.calls_for("stuck"), 2);
}

#[tokio::test]
async fn test_concurrency_never_exceeds_limit() {
    let checks = (0..8).map(|i| check(&format!("c{}", i), &format!("Q{}?", i))).collect();
    let plan = plan_with(checks);
    let researcher = Arc::new(FakeResearcher::new().with_default_delay(Duration::from_millis(10)));
    let stage = ResearchStage::new(researcher.clone(), 3);
    let mut artifacts = artifacts();

    let findings = stage
        .execute(EIFFEL_CLAIM, &plan, &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap();

    assert_eq!(findings.len(), 8);
    let peak = researcher.peak_concurrency();
    assert!(peak <= 3, "peak concurrency was {}", peak);
    assert!(peak >= 2, "research did not run concurrently");
}

#[tokio::test]
async fn test_zero_parallelism_is_clamped_to_one() {
    let plan = plan_with(vec![check("a", "A?"), check("b", "B?")]);
    let researcher = Arc::new(FakeResearcher::new().with_default_delay(Duration::from_millis(5)));
    let stage = ResearchStage::new(researcher.clone(), 0);
    let mut artifacts = artifacts();

    let findings = stage
        .execute(EIFFEL_CLAIM, &plan, &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap();

    assert_eq!(findings.len(), 2);
    assert_eq!(researcher.peak_concurrency(), 1);
}

#[tokio::test]
async fn test_blank_identity_and_confidence_are_repaired() {
    let plan = plan_with(vec![check("timeline_1", "When?")]);
    let sloppy = finding("", " ", EvidenceSignal::Supports, 1.4);
    let researcher = FakeResearcher::new().with("timeline_1", Behavior::Succeed(sloppy));
    let stage = ResearchStage::new(Arc::new(researcher), 1);
    let mut artifacts = artifacts();

    let findings = stage
        .execute(EIFFEL_CLAIM, &plan, &mut artifacts, &ProgressSink::disabled())
        .await
        .unwrap();

    assert_eq!(findings[0].aspect_id, "timeline_1");
    assert_eq!(findings[0].question, "When?");
    assert_eq!(findings[0].confidence, 1.0);
}

#[tokio::test]
async fn test_failed_check_emits_failure_event() {
    let plan = plan_with(vec![check("ok", "Ok?"), check("broken", "Broken?")]);
    let researcher = FakeResearcher::new().with("broken", Behavior::Fail("boom"));
    let stage = ResearchStage::new(Arc::new(researcher), 2);
    let (observer, mut rx) = progress_channel();
    let mut artifacts = artifacts();

    stage
        .execute(EIFFEL_CLAIM, &plan, &mut artifacts, &ProgressSink::new(Arc::new(observer)))
        .await
        .unwrap();

    let events = drain(&mut rx);
    let failed = events
        .iter()
        .find(|e| e.kind == ProgressKind::ResearchCheckFailed)
        .unwrap();
    assert_eq!(failed.get_str("aspect_id"), Some("broken"));
    assert_eq!(failed.get_str("error"), Some("boom"));
    assert_eq!(failed.get_u64("attempts"), Some(1));

    let completed = events.last().unwrap();
    assert_eq!(completed.kind, ProgressKind::ResearchCompleted);
    assert_eq!(completed.get_u64("finding_count"), Some(2));
    assert_eq!(completed.get_u64("degraded_count"), Some(1));
}
