/*!
 * Batch translation of preprocessed Japanese text using a remote LLM.
 *
 * This module contains the core orchestration pipeline. It is split into
 * several submodules:
 *
 * - `prompt`: Line classification and bounded prompt building
 * - `batch`: The ordered registry of (instructions, prompt) pairs
 * - `concurrency`: The gate bounding in-flight remote calls
 * - `retry`: Per-batch backoff, malformed retry and interrupt handling
 * - `dispatch`: Concurrent fan-out and join-all collection of batches
 * - `reassembly`: Order restoration, sentence fragmentation and review pairing
 * - `core`: The run orchestrator and run report
 */

// Re-export main types for easier usage
pub use self::batch::BatchRegistry;
pub use self::core::{RunOutcome, RunReport, Translator};
pub use self::dispatch::{DispatchResult, TranslationDispatcher};
pub use self::prompt::PromptBuilder;
pub use self::retry::{BatchOutcome, InterruptFlag, RetryPolicy};

// Submodules
pub mod batch;
pub mod concurrency;
pub mod core;
pub mod dispatch;
pub mod prompt;
pub mod reassembly;
pub mod retry;
