/*!
 * Core translation orchestrator.
 *
 * This module contains the `Translator`, which owns one full run: building
 * the batch registry from the preprocessed source lines, dispatching the
 * batches concurrently, reassembling the results in order and finalizing the
 * run report. All run state lives on the run itself, constructed fresh per
 * call, so nothing bleeds between runs.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{error, info};
use parking_lot::Mutex;

use crate::app_config::Config;
use crate::providers::openai::OpenAi;
use crate::providers::Provider;

use super::batch::BatchRegistry;
use super::dispatch::TranslationDispatcher;
use super::reassembly::{ReassembledOutput, Reassembler};
use super::retry::InterruptFlag;

/// Log entry captured while a run is in progress
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity label
    pub level: String,
    /// Message text
    pub message: String,
}

impl LogEntry {
    /// Create an error-level entry
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: "ERROR".to_string(), message: message.into() }
    }
}

/// Shared per-run log capture, written by the dispatch tasks
pub type RunLog = Arc<Mutex<Vec<LogEntry>>>;

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every batch produced a result (possibly degraded or malformed)
    Completed,
    /// A fatal error aborted the run; partial results were kept
    Aborted(String),
}

/// Final report of one translation run
#[derive(Debug)]
pub struct RunReport {
    /// Ordered translated text segments
    pub translated: Vec<String>,
    /// Review-pair segments for bilingual checking
    pub review_pairs: Vec<String>,
    /// Error records accumulated during the run
    pub error_log: Vec<String>,
    /// Total number of malformed-batch occurrences
    pub malformed_batches: usize,
    /// Number of batches dispatched
    pub batch_count: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
    /// How the run ended
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Human-readable run summary
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Time elapsed: {:.2}s\nBatches dispatched: {}\nNumber of malformed batches: {}",
            self.elapsed.as_secs_f64(),
            self.batch_count,
            self.malformed_batches
        );

        if let RunOutcome::Aborted(reason) = &self.outcome {
            summary.push_str(&format!("\nRun aborted: {}", reason));
        }

        summary
    }
}

/// Main orchestrator for batch translation runs
pub struct Translator {
    /// The remote translate capability
    provider: Arc<dyn Provider>,
    /// Run settings
    config: Config,
    /// Stop signal shared with the external controller
    interrupt: InterruptFlag,
}

impl Translator {
    /// Create a translator with the OpenAI provider from the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let provider: Arc<dyn Provider> = Arc::new(OpenAi::from_config(&config));
        Ok(Self { provider, config, interrupt: InterruptFlag::new() })
    }

    /// Create a translator with an explicit provider, e.g. a mock in tests
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        Self { provider, config, interrupt: InterruptFlag::new() }
    }

    /// Handle to the stop signal, for wiring up an external controller
    pub fn interrupt_handle(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    /// Run a full translation over the given preprocessed lines
    pub async fn run(&self, lines: &[String]) -> RunReport {
        self.run_with_progress(lines, |_, _| {}).await
    }

    /// Run a full translation, reporting per-batch progress through the
    /// given callback
    pub async fn run_with_progress(
        &self,
        lines: &[String],
        progress: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> RunReport {
        let start = Instant::now();

        self.log_settings();

        let registry = BatchRegistry::build(lines, &self.config.translation);
        let batch_count = registry.batch_count();

        // Run-scoped state, fresh for every run
        let run_log: RunLog = Arc::new(Mutex::new(Vec::new()));
        let malformed_count = Arc::new(AtomicUsize::new(0));

        let dispatcher = TranslationDispatcher::new(
            self.provider.clone(),
            self.interrupt.clone(),
            &self.config.translation,
        );

        let dispatched = dispatcher
            .dispatch(&registry, &run_log, &malformed_count, progress)
            .await;

        let (output, outcome) = match dispatched {
            Ok(results) => {
                info!("Translation complete, starting reassembly...");
                let reassembler = Reassembler::from_config(&self.config.translation);
                (reassembler.reassemble(results), RunOutcome::Completed)
            }
            Err(e) => {
                error!("An error has occurred, outputting results so far...");
                (ReassembledOutput::default(), RunOutcome::Aborted(e.to_string()))
            }
        };

        let error_log = run_log
            .lock()
            .iter()
            .map(|entry| format!("[{}] {}", entry.level, entry.message))
            .collect();

        RunReport {
            translated: output.translated,
            review_pairs: output.review_pairs,
            error_log,
            malformed_batches: malformed_count.load(Ordering::SeqCst),
            batch_count,
            elapsed: start.elapsed(),
            outcome,
        }
    }

    /// Echo the effective run settings into the log
    fn log_settings(&self) {
        let translation = &self.config.translation;
        info!("Translation run starting, settings are as follows:");
        info!("  model: {}", translation.model);
        info!("  message_pairing: {:?}", translation.message_pairing);
        info!("  lines_per_batch: {}", translation.lines_per_batch);
        info!("  sentence_fragmenter: {:?}", translation.sentence_fragmenter);
        info!("  review_mode: {:?}", translation.review_mode);
        info!("  malformed_retries: {}", translation.malformed_retries);
        info!("  batch_timeout_secs: {}", translation.batch_timeout_secs);
        info!("  concurrent_batches: {}", translation.concurrent_batches);
    }
}
