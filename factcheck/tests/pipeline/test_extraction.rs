//! Claim extraction service

use super::common::*;
use factcheck::pipeline::{ClaimExtractionService, ClaimExtractionStage};
use factcheck_sdk::{progress_channel, FactCheckError};
use std::sync::Arc;

fn service(backend: Arc<dyn factcheck_sdk::ClaimExtractionBackend>, max_claims: usize) -> ClaimExtractionService {
    ClaimExtractionService::new(ClaimExtractionStage::new(backend, max_claims))
}

#[tokio::test]
async fn test_claims_are_truncated_and_ids_made_unique() {
    let backend = Arc::new(StaticExtractor::new(vec![
        checkworthy("", "The tower is 330 metres tall."),
        checkworthy("claim_1", "It opened in March 1889."),
        checkworthy("claim_3", "It was painted red originally."),
    ]));
    let service = service(backend.clone(), 2);

    let result = service
        .extract_claims("  The tower is 330 metres tall and opened in March 1889.  ")
        .await
        .unwrap();

    let ids: Vec<_> = result.claims.iter().map(|c| c.claim_id.as_str()).collect();
    assert_eq!(ids, vec!["claim_1", "claim_1_2"]);
    assert_eq!(
        result.input_text,
        "The tower is 330 metres tall and opened in March 1889."
    );

    // The backend sees trimmed text and the claim limit
    let received = backend.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0],
        (
            "The tower is 330 metres tall and opened in March 1889.".to_string(),
            2
        )
    );
}

#[tokio::test]
async fn test_blank_input_is_rejected_before_backend_call() {
    let backend = Arc::new(StaticExtractor::new(vec![checkworthy("a", "A.")]));
    let service = service(backend.clone(), 5);

    let err = service.extract_claims(" \t\n").await.unwrap_err();

    assert!(matches!(err, FactCheckError::EmptyInput));
    assert!(err.is_validation());
    assert!(backend.received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_backend_failure_is_an_extraction_error() {
    let service = service(Arc::new(FailingExtractor), 5);

    let err = service.extract_claims("Some text.").await.unwrap_err();

    assert!(matches!(err, FactCheckError::Extraction(_)));
    assert!(err.to_string().contains("extractor unavailable"));
}

#[tokio::test]
async fn test_extraction_reports_progress() {
    let backend = Arc::new(StaticExtractor::new(vec![
        checkworthy("height", "The tower is 330 metres tall."),
        checkworthy("opening", "It opened in March 1889."),
    ]));
    let service = service(backend, 12);
    let (observer, mut rx) = progress_channel();

    let result = service
        .extract_claims_with_progress("Tall tower.", Arc::new(observer))
        .await
        .unwrap();
    assert_eq!(result.claims.len(), 2);

    let events = drain(&mut rx);
    assert_eq!(kinds(&events), vec!["extraction_started", "extraction_completed"]);
    assert_eq!(events[0].get_u64("input_chars"), Some(11));
    assert_eq!(events[0].get_u64("max_claims"), Some(12));
    assert_eq!(events[1].get_u64("claim_count"), Some(2));
}

#[tokio::test]
async fn test_failing_observer_does_not_abort_extraction() {
    let backend = Arc::new(StaticExtractor::new(vec![checkworthy("a", "A.")]));
    let observer = Arc::new(FailingObserver::new());

    let result = service(backend, 3)
        .extract_claims_with_progress("Text.", observer.clone())
        .await
        .unwrap();

    assert_eq!(result.claims.len(), 1);
    assert_eq!(observer.seen.load(std::sync::atomic::Ordering::SeqCst), 2);
}
