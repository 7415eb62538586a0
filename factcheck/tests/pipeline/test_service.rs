//! End-to-end runs through the service facade

use super::common::*;
use anyhow::anyhow;
use factcheck::pipeline::{
    FileRunArtifactRepository, InMemoryRunArtifactRepository, RunArtifactRepository, RunArtifacts,
};
use factcheck_sdk::{
    async_trait, progress_channel, EvidenceSignal, FactCheckError, FnObserver, ProgressKind,
    VeracityVerdict,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct BrokenRepository;

#[async_trait]
impl RunArtifactRepository for BrokenRepository {
    async fn save(&self, _artifacts: &RunArtifacts) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }
}

fn eiffel_service() -> factcheck::FactCheckService {
    build_service(
        Arc::new(StaticPlanner::new(eiffel_plan())),
        Arc::new(eiffel_researcher()),
        Arc::new(RecordingJudge::new(supported_report())),
        1,
    )
}

#[tokio::test]
async fn test_eiffel_tower_end_to_end() {
    let repository = Arc::new(InMemoryRunArtifactRepository::new());
    let service = eiffel_service().with_repository(repository.clone());

    let run = service
        .check_claim(&format!("  {}  ", EIFFEL_CLAIM))
        .await
        .unwrap();

    assert_eq!(run.claim, EIFFEL_CLAIM);
    assert_eq!(run.report.verdict, VeracityVerdict::Supported);
    assert_eq!(run.report.verdict_confidence, 0.83);

    let ids: Vec<_> = run.findings.iter().map(|f| f.aspect_id.as_str()).collect();
    assert_eq!(ids, vec!["timeline_1", "event_1"]);
    assert!(run.findings.iter().all(|f| f.signal == EvidenceSignal::Supports));

    // Wikipedia appears in both findings but is cited once
    assert_eq!(run.report.sources.len(), 3);
    let wikipedia = run
        .report
        .sources
        .iter()
        .filter(|s| s.url.contains("wikipedia.org"))
        .count();
    assert_eq!(wikipedia, 1);

    // Artifacts capture the whole run
    let artifacts = &run.artifacts;
    assert_eq!(artifacts.claim, format!("  {}  ", EIFFEL_CLAIM));
    assert_eq!(artifacts.normalized_claim, EIFFEL_CLAIM);
    assert!(artifacts.plan_raw.is_some());
    assert_eq!(artifacts.plan_normalized.as_ref(), Some(&run.plan));
    assert_eq!(artifacts.research_checks.len(), 2);
    assert!(artifacts.research_checks.iter().all(|c| c.attempts == 1 && c.errors.is_empty()));
    assert_eq!(artifacts.report_final.as_ref(), Some(&run.report));
    assert!(artifacts.is_completed());

    assert_eq!(repository.len(), 1);
    assert_eq!(repository.latest().unwrap().run_id, artifacts.run_id);
}

#[tokio::test]
async fn test_one_failing_check_still_produces_report() {
    let researcher = FakeResearcher::new()
        .with("timeline_1", Behavior::Succeed(eiffel_timeline_finding()))
        .with("event_1", Behavior::Fail("search backend unavailable"));
    let judge = Arc::new(RecordingJudge::new(supported_report()));
    let service = build_service(
        Arc::new(StaticPlanner::new(eiffel_plan())),
        Arc::new(researcher),
        judge.clone(),
        1,
    );

    let run = service.check_claim(EIFFEL_CLAIM).await.unwrap();

    assert_eq!(run.findings.len(), 2);
    assert_eq!(run.findings[0].signal, EvidenceSignal::Supports);
    assert_eq!(run.findings[1].signal, EvidenceSignal::Insufficient);
    assert_eq!(run.findings[1].confidence, 0.0);

    // The judge sees the degraded finding
    assert_eq!(judge.received.lock().unwrap()[0][1].signal, EvidenceSignal::Insufficient);

    let degraded: Vec<_> = run.artifacts.degraded_checks().collect();
    assert_eq!(degraded.len(), 1);
    assert_eq!(degraded[0].attempts, 2);
    assert_eq!(degraded[0].errors.len(), 2);
}

#[tokio::test]
async fn test_empty_claim_is_rejected_before_any_call() {
    let planner = Arc::new(StaticPlanner::new(eiffel_plan()));
    let service = build_service(
        planner.clone(),
        Arc::new(eiffel_researcher()),
        Arc::new(RecordingJudge::new(supported_report())),
        1,
    );
    let (observer, mut rx) = progress_channel();

    let err = service
        .check_claim_with_progress("   \n ", Arc::new(observer))
        .await
        .unwrap_err();

    assert!(matches!(err, FactCheckError::EmptyClaim));
    assert_eq!(err.to_string(), "Claim is empty.");
    assert_eq!(planner.calls.load(Ordering::SeqCst), 0);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_progress_events_bracket_the_run() {
    let service = eiffel_service();
    let (observer, mut rx) = progress_channel();

    service
        .check_claim_with_progress(EIFFEL_CLAIM, Arc::new(observer))
        .await
        .unwrap();

    let events = drain(&mut rx);
    let kinds = kinds(&events);
    assert_eq!(kinds.first(), Some(&"run_started"));
    assert_eq!(kinds.last(), Some(&"run_completed"));

    let position = |kind: &str| kinds.iter().position(|k| *k == kind).unwrap();
    assert!(position("planning_started") < position("planning_completed"));
    assert!(position("planning_completed") < position("research_started"));
    assert!(position("research_completed") < position("judging_started"));
    assert!(position("judging_completed") < position("run_completed"));
    assert_eq!(kinds.iter().filter(|k| **k == "research_check_completed").count(), 2);

    let completed = events.last().unwrap();
    assert_eq!(completed.get_str("verdict"), Some("Supported"));
    assert_eq!(completed.get_str("claim"), Some(EIFFEL_CLAIM));
}

#[tokio::test]
async fn test_failing_observer_does_not_abort_run() {
    let observer = Arc::new(FailingObserver::new());
    let service = eiffel_service();

    let run = service
        .check_claim_with_progress(EIFFEL_CLAIM, observer.clone())
        .await
        .unwrap();

    assert_eq!(run.report.verdict, VeracityVerdict::Supported);
    assert!(observer.seen.load(Ordering::SeqCst) >= 10);
}

#[tokio::test]
async fn test_closure_observer_sees_every_event() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let observer = FnObserver::new(move |event: &factcheck_sdk::ProgressEvent| {
        sink.lock().unwrap().push(event.kind);
    });

    eiffel_service()
        .with_progress_timeout(Some(Duration::from_secs(1)))
        .check_claim_with_progress(EIFFEL_CLAIM, Arc::new(observer))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first(), Some(&ProgressKind::RunStarted));
    assert_eq!(seen.last(), Some(&ProgressKind::RunCompleted));
}

#[tokio::test]
async fn test_planner_failure_emits_run_failed_and_skips_save() {
    let repository = Arc::new(InMemoryRunArtifactRepository::new());
    let judge = Arc::new(RecordingJudge::new(supported_report()));
    let service = build_service(
        Arc::new(FailingPlanner),
        Arc::new(eiffel_researcher()),
        judge.clone(),
        1,
    )
    .with_repository(repository.clone());
    let (observer, mut rx) = progress_channel();

    let err = service
        .check_claim_with_progress(EIFFEL_CLAIM, Arc::new(observer))
        .await
        .unwrap_err();

    assert!(matches!(err, FactCheckError::Planning(_)));
    assert_eq!(judge.calls(), 0);
    assert!(repository.is_empty());

    let events = drain(&mut rx);
    let last = events.last().unwrap();
    assert_eq!(last.kind, ProgressKind::RunFailed);
    assert!(last.get_str("error").unwrap().contains("planner offline"));
    assert!(!events.iter().any(|e| e.kind == ProgressKind::RunCompleted));
}

#[tokio::test]
async fn test_judge_failure_propagates() {
    let service = build_service(
        Arc::new(StaticPlanner::new(eiffel_plan())),
        Arc::new(eiffel_researcher()),
        Arc::new(FailingJudge),
        0,
    );

    let err = service.check_claim(EIFFEL_CLAIM).await.unwrap_err();
    assert!(matches!(err, FactCheckError::Judging(_)));
    assert!(err.capability_error().is_some());
}

#[tokio::test]
async fn test_repository_failure_is_a_persistence_error() {
    let service = eiffel_service().with_repository(Arc::new(BrokenRepository));

    let err = service.check_claim(EIFFEL_CLAIM).await.unwrap_err();

    assert!(matches!(err, FactCheckError::Persistence(_)));
    assert!(err.to_string().contains("disk full"));
}

#[tokio::test]
async fn test_each_run_gets_fresh_artifacts() {
    let repository = Arc::new(InMemoryRunArtifactRepository::new());
    let service = eiffel_service().with_repository(repository.clone());

    let first = service.check_claim(EIFFEL_CLAIM).await.unwrap();
    let second = service.check_claim(EIFFEL_CLAIM).await.unwrap();

    assert_ne!(first.artifacts.run_id, second.artifacts.run_id);
    assert_eq!(second.artifacts.research_checks.len(), 2);
    assert!(second.artifacts.research_checks.iter().all(|c| c.attempts == 1));
    assert_eq!(repository.len(), 2);
}

#[tokio::test]
async fn test_file_repository_receives_completed_run() {
    let tmp = tempfile::tempdir().unwrap();
    let repository = Arc::new(FileRunArtifactRepository::new(tmp.path().join("runs")));
    let service = eiffel_service().with_repository(repository.clone());

    let run = service.check_claim(EIFFEL_CLAIM).await.unwrap();

    let path = repository.path_for(&run.artifacts);
    let saved: RunArtifacts = serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(saved.run_id, run.artifacts.run_id);
    assert_eq!(saved.report_final.unwrap().verdict, VeracityVerdict::Supported);
    assert!(saved.completed_at.is_some());

    let files = std::fs::read_dir(tmp.path().join("runs")).unwrap().count();
    assert_eq!(files, 1);
}

#[tokio::test]
async fn test_observer_counts_are_stable_across_runs() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sink = counter.clone();
    let observer = Arc::new(FnObserver::new(move |_event: &factcheck_sdk::ProgressEvent| {
        sink.fetch_add(1, Ordering::SeqCst);
    }));
    let service = eiffel_service();

    service.check_claim_with_progress(EIFFEL_CLAIM, observer.clone()).await.unwrap();
    let per_run = counter.load(Ordering::SeqCst);
    service.check_claim_with_progress(EIFFEL_CLAIM, observer).await.unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), per_run * 2);
}
