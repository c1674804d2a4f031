/*!
 * End-to-end translation pipeline tests using the mock provider
 */

use std::sync::Arc;
use std::time::Duration;

use honyaku::app_config::ReviewMode;
use honyaku::app_controller::Controller;
use honyaku::providers::mock::MockProvider;
use honyaku::translation::{RunOutcome, RunReport, Translator};
use tempfile::TempDir;

use crate::common::{jp_lines, test_config};

#[tokio::test(start_paused = true)]
async fn test_run_withWorkingProvider_shouldProduceOrderedTranslation() {
    let config = test_config();
    let mock = Arc::new(MockProvider::working());
    let translator = Translator::with_provider(config, mock.clone());

    let lines = jp_lines(6);
    let report = translator.run(&lines).await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.batch_count, 3);
    assert_eq!(report.malformed_batches, 0);
    assert!(report.error_log.is_empty());

    // echo translation preserves source order end to end
    assert_eq!(report.translated.len(), 3);
    assert!(report.translated[0].contains("これは1行目"));
    assert!(report.translated[0].contains("これは2行目"));
    assert!(report.translated[2].contains("これは6行目"));
}

#[tokio::test(start_paused = true)]
async fn test_run_withMixedSourceLines_shouldDropNoiseAndKeepMarkers() {
    let mut config = test_config();
    config.translation.lines_per_batch = 10;

    let mock = Arc::new(MockProvider::working());
    let translator = Translator::with_provider(config, mock);

    let lines = vec![
        "　".to_string(),
        "「こんにちは」".to_string(),
        "１２３".to_string(),
    ];
    let report = translator.run(&lines).await;

    assert_eq!(report.batch_count, 1);
    assert_eq!(report.translated.len(), 1);
    assert!(report.translated[0].contains("「こんにちは」"));
    assert!(report.translated[0].contains("１２３"));
    assert!(!report.translated[0].contains("　"));
}

#[tokio::test(start_paused = true)]
async fn test_run_withInterleavedReview_shouldPairPromptsAndTranslations() {
    let mut config = test_config();
    config.translation.review_mode = ReviewMode::Interleaved;

    let mock = Arc::new(MockProvider::working());
    let translator = Translator::with_provider(config, mock);

    let report = translator.run(&jp_lines(4)).await;

    assert!(!report.review_pairs.is_empty());
    assert!(report.review_pairs[0].contains("-------------------------"));
    assert!(report.review_pairs[0].contains("これは1行目"));
    assert!(report.review_pairs[1].contains("[EN]"));
}

#[tokio::test(start_paused = true)]
async fn test_run_withPairedReview_shouldAlignLinesOneToOne() {
    let mut config = test_config();
    config.translation.review_mode = ReviewMode::Paired;

    let mock = Arc::new(MockProvider::working());
    let translator = Translator::with_provider(config, mock);

    let report = translator.run(&jp_lines(2)).await;

    // matching line counts: source and translation interleave line by line
    let joined = report.review_pairs.concat();
    assert!(joined.contains("これは1行目の文章です。\n\n[EN] これは1行目の文章です。\n\n"));
}

#[tokio::test(start_paused = true)]
async fn test_run_withFlakyProvider_shouldRecoverThroughBackoff() {
    let mut config = test_config();
    config.translation.lines_per_batch = 2;

    // two transient failures, then success; well within the batch budget
    let mock = Arc::new(MockProvider::flaky(2));
    let translator = Translator::with_provider(config, mock.clone());

    let report = translator.run(&jp_lines(2)).await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.translated.len(), 1);
    assert!(report.translated[0].contains("[EN]"));
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_withPersistentTransientErrors_shouldDegradeToPassthrough() {
    let mut config = test_config();
    config.translation.batch_timeout_secs = 1;
    config.translation.retry_backoff_ms = 400;
    config.translation.lines_per_batch = 2;

    let mock = Arc::new(MockProvider::failing_transient());
    let translator = Translator::with_provider(config, mock);

    let lines = jp_lines(2);
    let report = translator.run(&lines).await;

    // the run completes; the batch degrades to the untranslated prompt text
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.translated.len(), 1);
    assert!(report.translated[0].contains("これは1行目の文章です。"));
    assert!(report
        .error_log
        .iter()
        .any(|entry| entry.contains("exceeding the max request duration")));
}

#[tokio::test(start_paused = true)]
async fn test_run_withFatalProviderError_shouldAbortButKeepErrorRecords() {
    let config = test_config();
    let mock = Arc::new(MockProvider::failing_fatal());
    let translator = Translator::with_provider(config, mock);

    let report = translator.run(&jp_lines(4)).await;

    match &report.outcome {
        RunOutcome::Aborted(reason) => assert!(reason.contains("failed")),
        other => panic!("expected aborted run, got {:?}", other),
    }
    assert!(report.translated.is_empty());
    assert!(!report.error_log.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_withInterruptSetBeforeDispatch_shouldAbortWithoutCalls() {
    let config = test_config();
    let mock = Arc::new(MockProvider::working());
    let translator = Translator::with_provider(config, mock.clone());

    translator.interrupt_handle().set();
    let report = translator.run(&jp_lines(4)).await;

    assert!(matches!(report.outcome, RunOutcome::Aborted(_)));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_withConsecutiveRuns_shouldNotLeakStateBetweenRuns() {
    let config = test_config();
    let mock = Arc::new(MockProvider::malformed());
    let translator = Translator::with_provider(config, mock);

    let first = translator.run(&jp_lines(2)).await;
    let second = translator.run(&jp_lines(2)).await;

    // each run counts only its own malformed batches
    assert_eq!(first.malformed_batches, 1);
    assert_eq!(second.malformed_batches, 1);
    assert_eq!(first.error_log.len(), second.error_log.len());
}

#[tokio::test]
async fn test_write_outputs_withFinishedReport_shouldPersistAllStreams() {
    let dir = TempDir::new().unwrap();
    let controller = Controller::with_config(test_config()).unwrap();

    let report = RunReport {
        translated: vec!["first line\n".to_string(), "second line\n".to_string()],
        review_pairs: vec!["原文\n".to_string(), "translation\n".to_string()],
        error_log: vec!["[ERROR] batch 2 degraded".to_string()],
        malformed_batches: 1,
        batch_count: 2,
        elapsed: Duration::from_secs(3),
        outcome: RunOutcome::Completed,
    };

    controller.write_outputs(&report, dir.path()).unwrap();

    let translated = std::fs::read_to_string(dir.path().join("translated_text.txt")).unwrap();
    assert_eq!(translated, "first line\nsecond line\n");

    let review = std::fs::read_to_string(dir.path().join("review_pairs.txt")).unwrap();
    assert!(review.contains("原文"));

    let errors = std::fs::read_to_string(dir.path().join("error_log.txt")).unwrap();
    assert!(errors.contains("batch 2 degraded"));
}
