//! Integration tests for cancellation and progress reporting
//!
//! These tests verify that:
//! - AbortNow stops both engines with a Cancelled error
//! - DrainToCompletion finishes the run and flags the report
//! - Progress events arrive in order and stay within 0..=100

use serde_json::{json, Value};
use sieve::anonymization::rules::{AnonymizationMethod, AnonymizationRule, HashParams};
use sieve::anonymization::{anonymize, AnonymizeOptions};
use sieve::domain::{DataRecord, SieveError};
use sieve::protocol::{CancelPolicy, ProgressReporter};
use sieve::transform::{apply_transformations, TargetType, TransformRule, TransformationPipeline};
use tokio::sync::watch;

fn dataset(rows: usize) -> Vec<DataRecord> {
    (0..rows)
        .map(|i| {
            json!({"id": format!("user-{i}"), "score": i.to_string()})
                .as_object()
                .unwrap()
                .clone()
        })
        .collect()
}

fn hash_rules() -> Vec<AnonymizationRule> {
    vec![AnonymizationRule::new(
        "id",
        AnonymizationMethod::Hash(HashParams::default()),
    )]
}

fn pipeline() -> TransformationPipeline {
    TransformationPipeline::new(vec![
        TransformRule::convert("to-number", "score", TargetType::Integer),
        TransformRule::rename("rename", "score", "points"),
    ])
}

fn cancelled_reporter(policy: CancelPolicy) -> (watch::Sender<bool>, ProgressReporter) {
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let reporter = ProgressReporter::silent()
        .with_batch_size(10)
        .with_cancellation(rx, policy);
    (tx, reporter)
}

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    let (shutdown_tx, shutdown_rx1) = watch::channel(false);
    let shutdown_rx2 = shutdown_rx1.clone();

    assert!(!*shutdown_rx1.borrow());
    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx1.borrow());
    assert!(*shutdown_rx2.borrow());
}

#[tokio::test]
async fn test_anonymize_abort_now() {
    let data = dataset(50);
    let (_tx, reporter) = cancelled_reporter(CancelPolicy::AbortNow);

    let err = anonymize(
        &data,
        &hash_rules(),
        AnonymizeOptions::new("seed").with_progress(reporter),
    )
    .await
    .unwrap_err();

    match err {
        SieveError::Cancelled { processed } => assert!(processed < data.len()),
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_anonymize_drain_to_completion() {
    let data = dataset(50);
    let (_tx, reporter) = cancelled_reporter(CancelPolicy::DrainToCompletion);

    let outcome = anonymize(
        &data,
        &hash_rules(),
        AnonymizeOptions::new("seed").with_progress(reporter),
    )
    .await
    .unwrap();

    assert!(outcome.report.cancelled);
    assert_eq!(outcome.anonymized_data.len(), data.len());
    assert!(outcome
        .anonymized_data
        .iter()
        .zip(&data)
        .all(|(after, before)| after["id"] != before["id"]));
}

#[tokio::test]
async fn test_transform_abort_now() {
    let data = dataset(30);
    let (_tx, reporter) = cancelled_reporter(CancelPolicy::AbortNow);

    let err = apply_transformations(&data, &[], &pipeline(), reporter)
        .await
        .unwrap_err();
    assert!(matches!(err, SieveError::Cancelled { .. }));
}

#[tokio::test]
async fn test_transform_drain_to_completion() {
    let data = dataset(30);
    let (_tx, reporter) = cancelled_reporter(CancelPolicy::DrainToCompletion);

    let outcome = apply_transformations(&data, &[], &pipeline(), reporter)
        .await
        .unwrap();

    assert!(outcome.report.cancelled);
    assert!(outcome.report.is_complete());
    assert_eq!(outcome.transformed_data[7]["points"], json!(7));
}

#[tokio::test]
async fn test_uncancelled_run_is_not_flagged() {
    let data = dataset(5);
    let (_tx, rx) = watch::channel(false);
    let reporter = ProgressReporter::silent().with_cancellation(rx, CancelPolicy::AbortNow);

    let outcome = apply_transformations(&data, &[], &pipeline(), reporter)
        .await
        .unwrap();
    assert!(!outcome.report.cancelled);
}

#[tokio::test]
async fn test_progress_events_are_monotonic() {
    let data = dataset(200);
    let (reporter, mut events) = ProgressReporter::channel(1024);

    let outcome = anonymize(
        &data,
        &hash_rules(),
        AnonymizeOptions::new("seed").with_progress(reporter.with_batch_size(25)),
    )
    .await
    .unwrap();
    assert_eq!(outcome.anonymized_data.len(), 200);

    let mut percents = Vec::new();
    while let Ok(event) = events.try_recv() {
        percents.push(event.percent);
    }

    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)));
    assert_eq!(percents.last().copied(), Some(100.0));
}

#[tokio::test]
async fn test_dropped_receiver_does_not_fail_the_run() {
    let data = dataset(20);
    let (reporter, events) = ProgressReporter::channel(1);
    drop(events);

    let outcome = apply_transformations(&data, &[], &pipeline(), reporter)
        .await
        .unwrap();
    let points: Vec<&Value> = outcome
        .transformed_data
        .iter()
        .map(|r| &r["points"])
        .collect();
    assert_eq!(points.len(), 20);
}
