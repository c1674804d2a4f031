/*!
 * Tests for concurrent batch dispatch and the concurrency gate bounds
 */

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use honyaku::providers::mock::MockProvider;
use honyaku::translation::batch::BatchRegistry;
use honyaku::translation::core::RunLog;
use honyaku::translation::dispatch::TranslationDispatcher;
use honyaku::translation::retry::InterruptFlag;

use crate::common::{jp_lines, test_config};

fn new_run_log() -> RunLog {
    Arc::new(parking_lot::Mutex::new(Vec::new()))
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_withGateSmallerThanBatchCount_shouldBoundPeakConcurrency() {
    let mut config = test_config();
    config.translation.lines_per_batch = 1;
    config.translation.concurrent_batches = 3;

    let lines = jp_lines(12);
    let registry = BatchRegistry::build(&lines, &config.translation);
    assert_eq!(registry.batch_count(), 12);

    let mock = Arc::new(MockProvider::slow(20));
    let dispatcher =
        TranslationDispatcher::new(mock.clone(), InterruptFlag::new(), &config.translation);

    let malformed = Arc::new(AtomicUsize::new(0));
    let results = dispatcher
        .dispatch(&registry, &new_run_log(), &malformed, |_, _| {})
        .await
        .unwrap();

    assert_eq!(results.len(), 12);
    assert!(mock.peak_concurrency() <= 3);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_withGateLimitOne_shouldExecuteSequentially() {
    let mut config = test_config();
    config.translation.lines_per_batch = 1;
    config.translation.concurrent_batches = 1;

    let lines = jp_lines(3);
    let registry = BatchRegistry::build(&lines, &config.translation);

    let mock = Arc::new(MockProvider::slow(10));
    let dispatcher =
        TranslationDispatcher::new(mock.clone(), InterruptFlag::new(), &config.translation);

    let malformed = Arc::new(AtomicUsize::new(0));
    let results = dispatcher
        .dispatch(&registry, &new_run_log(), &malformed, |_, _| {})
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(mock.peak_concurrency(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_withAllBatches_shouldProduceOneResultPerPair() {
    let mut config = test_config();
    config.translation.lines_per_batch = 2;

    let lines = jp_lines(7);
    let registry = BatchRegistry::build(&lines, &config.translation);
    let expected = registry.batch_count();

    let mock = Arc::new(MockProvider::working());
    let dispatcher =
        TranslationDispatcher::new(mock.clone(), InterruptFlag::new(), &config.translation);

    let malformed = Arc::new(AtomicUsize::new(0));
    let results = dispatcher
        .dispatch(&registry, &new_run_log(), &malformed, |_, _| {})
        .await
        .unwrap();

    let indices: HashSet<usize> = results.iter().map(|result| result.index).collect();
    assert_eq!(indices.len(), expected);
    assert!(indices.iter().all(|&index| index < expected));
    assert_eq!(malformed.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_withMalformedOutput_shouldCountAndAcceptAfterBudget() {
    let mut config = test_config();
    config.translation.lines_per_batch = 2;
    config.translation.malformed_retries = 1;

    let lines = jp_lines(4);
    let registry = BatchRegistry::build(&lines, &config.translation);
    assert_eq!(registry.batch_count(), 2);

    let mock = Arc::new(MockProvider::malformed());
    let dispatcher =
        TranslationDispatcher::new(mock.clone(), InterruptFlag::new(), &config.translation);

    let malformed = Arc::new(AtomicUsize::new(0));
    let run_log = new_run_log();
    let results = dispatcher
        .dispatch(&registry, &run_log, &malformed, |_, _| {})
        .await
        .unwrap();

    // one retry per batch, then the malformed result is accepted
    assert_eq!(results.len(), 2);
    assert_eq!(malformed.load(Ordering::SeqCst), 2);
    assert_eq!(mock.call_count(), 4);
    assert!(results.iter().all(|result| result.translated == "mistranslated"));

    let log = run_log.lock();
    assert!(log.iter().any(|entry| entry.message.contains("malformed")));
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_withProgressCallback_shouldReportEveryBatch() {
    let config = test_config();
    let lines = jp_lines(6);
    let registry = BatchRegistry::build(&lines, &config.translation);

    let mock = Arc::new(MockProvider::working());
    let dispatcher =
        TranslationDispatcher::new(mock.clone(), InterruptFlag::new(), &config.translation);

    let reported = Arc::new(AtomicUsize::new(0));
    let reported_clone = reported.clone();
    let malformed = Arc::new(AtomicUsize::new(0));

    dispatcher
        .dispatch(&registry, &new_run_log(), &malformed, move |completed, total| {
            reported_clone.fetch_max(completed, Ordering::SeqCst);
            assert_eq!(total, 3);
        })
        .await
        .unwrap();

    assert_eq!(reported.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_withFatalError_shouldAbortAfterAllTasks() {
    let config = test_config();
    let lines = jp_lines(4);
    let registry = BatchRegistry::build(&lines, &config.translation);

    let mock = Arc::new(MockProvider::failing_fatal());
    let dispatcher =
        TranslationDispatcher::new(mock.clone(), InterruptFlag::new(), &config.translation);

    let malformed = Arc::new(AtomicUsize::new(0));
    let run_log = new_run_log();
    let result = dispatcher
        .dispatch(&registry, &run_log, &malformed, |_, _| {})
        .await;

    assert!(result.is_err());
    // every batch was attempted before the dispatch aborted
    assert_eq!(mock.call_count(), registry.batch_count());
    assert!(!run_log.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_withInterruptSet_shouldFailFastWithoutCalls() {
    let config = test_config();
    let lines = jp_lines(4);
    let registry = BatchRegistry::build(&lines, &config.translation);

    let interrupt = InterruptFlag::new();
    interrupt.set();

    let mock = Arc::new(MockProvider::working());
    let dispatcher = TranslationDispatcher::new(mock.clone(), interrupt, &config.translation);

    let malformed = Arc::new(AtomicUsize::new(0));
    let result = dispatcher
        .dispatch(&registry, &new_run_log(), &malformed, |_, _| {})
        .await;

    assert!(result.is_err());
    assert_eq!(mock.call_count(), 0);
}
