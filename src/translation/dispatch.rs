/*!
 * Concurrent dispatch of translation batches.
 *
 * One task per (instructions, prompt) pair, each acquiring the concurrency
 * gate before delegating to the retry policy. Tasks run concurrently and are
 * awaited jointly; completion order is arbitrary and the reassembler restores
 * batch order afterwards. A fatal error in any task aborts the dispatch after
 * every task has finished.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use log::{error, info};

use crate::app_config::TranslationConfig;
use crate::errors::TranslationError;
use crate::providers::{Message, Provider};

use super::batch::BatchRegistry;
use super::concurrency::ConcurrencyGate;
use super::core::{LogEntry, RunLog};
use super::retry::{BatchOutcome, InterruptFlag, RetryPolicy};

/// Result of one dispatched batch pair
#[derive(Debug, Clone)]
pub struct DispatchResult {
    /// Original batch pair index
    pub index: usize,
    /// The prompt message that was translated
    pub prompt: Message,
    /// Text returned by the service, or the prompt itself for degraded batches
    pub translated: String,
}

/// Line-count parity check between a prompt and its candidate translation.
///
/// Both sides are split on newlines with blank lines discarded; equal counts
/// mean the model preserved the per-line structure. This is a heuristic, not
/// a statement about semantic correctness.
pub fn line_parity_ok(prompt: &str, translation: &str) -> bool {
    let non_blank = |text: &str| text.split('\n').filter(|line| !line.trim().is_empty()).count();
    non_blank(prompt) == non_blank(translation)
}

/// Orchestrates concurrent execution of all batches in a registry
pub struct TranslationDispatcher {
    /// The remote translate capability
    provider: Arc<dyn Provider>,
    /// Gate bounding in-flight remote calls
    gate: ConcurrencyGate,
    /// Per-batch retry policy
    policy: RetryPolicy,
    /// Shared stop signal
    interrupt: InterruptFlag,
    /// Whether to validate line-count parity for this model family
    validate_line_parity: bool,
    /// Maximum number of batch tasks driven at once
    max_concurrent: usize,
}

impl TranslationDispatcher {
    /// Create a dispatcher for one run
    pub fn new(
        provider: Arc<dyn Provider>,
        interrupt: InterruptFlag,
        config: &TranslationConfig,
    ) -> Self {
        Self {
            provider,
            gate: ConcurrencyGate::new(config.concurrent_batches),
            policy: RetryPolicy::from_config(config),
            interrupt,
            validate_line_parity: config.expects_line_parity(),
            max_concurrent: config.concurrent_batches,
        }
    }

    /// Dispatch every batch pair in the registry.
    ///
    /// Returns one `DispatchResult` per pair in completion order. Degraded
    /// and malformed-after-retries batches are logged with their batch number
    /// and still produce a result; fatal errors abort the whole dispatch once
    /// all tasks have completed.
    pub async fn dispatch(
        &self,
        registry: &BatchRegistry,
        run_log: &RunLog,
        malformed_count: &Arc<AtomicUsize>,
        progress: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<Vec<DispatchResult>> {
        let total = registry.batch_count();
        let processed = Arc::new(AtomicUsize::new(0));

        let results = stream::iter(registry.pairs().enumerate())
            .map(|(index, (instructions, prompt))| {
                let provider = self.provider.clone();
                let gate = self.gate.clone();
                let policy = self.policy.clone();
                let interrupt = self.interrupt.clone();
                let run_log = run_log.clone();
                let processed = processed.clone();
                let malformed_count = malformed_count.clone();
                let progress = progress.clone();
                let validate = self.validate_line_parity;

                async move {
                    let _permit = gate.acquire().await;

                    info!("Trying translation for batch {} of {}...", index + 1, total);

                    // The retry policy may invoke the call several times, so
                    // each invocation gets its own owned copy of the messages.
                    let call = {
                        let provider = provider.clone();
                        let instructions = instructions.clone();
                        let prompt_message = prompt.clone();
                        move || {
                            let provider = provider.clone();
                            let instructions = instructions.clone();
                            let prompt_message = prompt_message.clone();
                            async move { provider.translate(&instructions, &prompt_message).await }
                        }
                    };
                    let validator =
                        validate.then_some(|text: &str| line_parity_ok(&prompt.content, text));

                    let outcome = policy
                        .execute(&interrupt, &prompt.content, call, validator)
                        .await;

                    let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(current, total);

                    let result = match outcome {
                        Ok(BatchOutcome::Degraded { text }) => {
                            let message = format!(
                                "Batch {} of {} was not translated due to exceeding the max \
                                 request duration, returning the untranslated text",
                                index + 1,
                                total
                            );
                            error!("{}", message);
                            run_log.lock().push(LogEntry::error(message));

                            Ok(DispatchResult { index, prompt: prompt.clone(), translated: text })
                        }
                        Ok(BatchOutcome::Translated { text, malformed_retries }) => {
                            if malformed_retries > 0 {
                                malformed_count
                                    .fetch_add(malformed_retries as usize, Ordering::SeqCst);
                            }

                            if validate && !line_parity_ok(&prompt.content, &text) {
                                let message = format!(
                                    "Batch {} of {} was malformed, but exceeded the maximum \
                                     number of retries; accepting the result",
                                    index + 1,
                                    total
                                );
                                error!("{}", message);
                                run_log.lock().push(LogEntry::error(message));
                            } else {
                                info!("Translation for batch {} of {} successful!", index + 1, total);
                            }

                            Ok(DispatchResult { index, prompt: prompt.clone(), translated: text })
                        }
                        Err(e) => {
                            let message =
                                format!("Batch {} of {} failed: {}", index + 1, total, e);
                            error!("{}", message);
                            run_log.lock().push(LogEntry::error(message));

                            Err(e)
                        }
                    };

                    (index, result)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect::<Vec<(usize, Result<DispatchResult, TranslationError>)>>()
            .await;

        let mut dispatched = Vec::with_capacity(total);
        let mut errors = Vec::new();

        for (index, result) in results {
            match result {
                Ok(dispatch_result) => dispatched.push(dispatch_result),
                Err(e) => errors.push(format!("Batch {} failed: {}", index + 1, e)),
            }
        }

        if !errors.is_empty() {
            let error_message =
                format!("Failed to translate all batches: {}", errors.join("; "));
            error!("{}", error_message);
            return Err(anyhow!(error_message));
        }

        Ok(dispatched)
    }
}
