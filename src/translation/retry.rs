/*!
 * Retry policy for a single batch translation call.
 *
 * Three layers of resilience around the remote translate capability:
 * exponential backoff over transient errors under a wall-clock deadline,
 * an immediate count-bounded retry for malformed output, and fast-fail on
 * the user interrupt flag. Transient and malformed conditions never escape
 * this module; when the deadline is exceeded the batch degrades to the
 * untranslated prompt text instead of raising.
 */

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use rand::Rng;
use tokio::time::Instant;

use crate::app_config::TranslationConfig;
use crate::errors::{ProviderError, TranslationError};

/// Shared stop signal, settable by an external controller (e.g. a UI stop
/// action) and polled before every remote call attempt
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// Create a new, unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that in-flight and pending batches stop
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag, e.g. before a fresh run
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Whether an interrupt was requested
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Outcome of one batch after all retry layers
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// The remote call succeeded; the text may still be malformed if the
    /// retry budget ran out
    Translated {
        /// Translated text returned by the service
        text: String,
        /// How many malformed retries were spent on this batch
        malformed_retries: u32,
    },
    /// The deadline was exceeded; the original prompt text passes through
    /// untranslated
    Degraded {
        /// The untranslated prompt text
        text: String,
    },
}

impl BatchOutcome {
    /// The text carried by this outcome
    pub fn text(&self) -> &str {
        match self {
            Self::Translated { text, .. } | Self::Degraded { text } => text,
        }
    }

    /// Whether the batch degraded to untranslated passthrough
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Per-batch retry policy: backoff schedule, wall-clock budget and malformed
/// retry count
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Base backoff delay, doubled on each transient retry
    backoff_base: Duration,
    /// Wall-clock budget for the whole batch including backoff waits
    max_elapsed: Duration,
    /// How many times malformed output is re-requested before acceptance
    max_malformed_retries: u32,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(backoff_base: Duration, max_elapsed: Duration, max_malformed_retries: u32) -> Self {
        Self { backoff_base, max_elapsed, max_malformed_retries }
    }

    /// Create a policy from the run settings
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(
            Duration::from_millis(config.retry_backoff_ms),
            Duration::from_secs(config.batch_timeout_secs),
            config.malformed_retries,
        )
    }

    /// Execute one batch translation through all retry layers.
    ///
    /// `call` is the remote translate capability for this batch; `validator`,
    /// when present, decides whether a successful response is well-formed.
    /// The deadline is fixed once on entry, so settings changes mid-run
    /// cannot move it for an in-flight batch.
    ///
    /// Transient errors back off and retry until the deadline would be
    /// crossed, at which point `prompt_text` is returned as a degraded
    /// outcome. Malformed output is re-requested immediately up to the
    /// configured count. Any other error propagates, and a set interrupt
    /// flag fails the batch before the next call is attempted.
    pub async fn execute<C, Fut, V>(
        &self,
        interrupt: &InterruptFlag,
        prompt_text: &str,
        call: C,
        validator: Option<V>,
    ) -> Result<BatchOutcome, TranslationError>
    where
        C: Fn() -> Fut,
        Fut: Future<Output = Result<String, ProviderError>>,
        V: Fn(&str) -> bool,
    {
        let deadline = Instant::now() + self.max_elapsed;
        let mut attempt: u32 = 0;
        let mut malformed_retries: u32 = 0;

        loop {
            let text = loop {
                if interrupt.is_set() {
                    return Err(TranslationError::Interrupted);
                }

                match call().await {
                    Ok(text) => break text,
                    Err(e) if e.is_transient() => {
                        let backoff = self.backoff_delay(attempt);
                        attempt += 1;

                        if Instant::now() + backoff >= deadline {
                            warn!(
                                "Exceeded batch duration budget of {}s after {} attempts, \
                                 returning untranslated text",
                                self.max_elapsed.as_secs(),
                                attempt
                            );
                            return Ok(BatchOutcome::Degraded { text: prompt_text.to_string() });
                        }

                        warn!("Retrying translation in {:?} after: {}", backoff, e);
                        tokio::time::sleep(backoff).await;
                    }
                    Err(e) => return Err(e.into()),
                }
            };

            match &validator {
                Some(validate) if !validate(&text) => {
                    if malformed_retries < self.max_malformed_retries {
                        malformed_retries += 1;
                        warn!(
                            "Malformed translation, retrying immediately ({}/{})",
                            malformed_retries, self.max_malformed_retries
                        );
                        continue;
                    }

                    warn!(
                        "Malformed translation accepted after exhausting {} retries",
                        self.max_malformed_retries
                    );
                    return Ok(BatchOutcome::Translated { text, malformed_retries });
                }
                _ => return Ok(BatchOutcome::Translated { text, malformed_retries }),
            }
        }
    }

    /// Exponential backoff with jitter for the given attempt number
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.backoff_base.as_millis() as u64;
        let backoff_ms = base_ms.saturating_mul(1u64 << attempt.min(16));
        let jitter_ms = rand::rng().random_range(0..=backoff_ms / 4);
        Duration::from_millis(backoff_ms.saturating_add(jitter_ms))
    }
}
