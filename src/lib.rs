/*!
 * # honyaku
 *
 * A Rust library for batch translation of preprocessed Japanese text using
 * a remote LLM service.
 *
 * ## Features
 *
 * - Partition source text into bounded-size prompt batches, keeping scene
 *   and part markers intact and dropping punctuation-only noise
 * - Dispatch batches concurrently through a bounded concurrency gate
 * - Retry transient API failures with exponential backoff under a per-batch
 *   wall-clock budget, degrading to untranslated passthrough when exceeded
 * - Validate line-count parity and re-request malformed output
 * - Reassemble results in original order with sentence fragmentation and
 *   bilingual review pairing
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `jp_text`: Japanese text classification helpers
 * - `translation`: The batch translation pipeline:
 *   - `translation::prompt`: Prompt building from source lines
 *   - `translation::batch`: The batch pair registry
 *   - `translation::concurrency`: In-flight call limiting
 *   - `translation::retry`: Backoff, malformed retry and interrupts
 *   - `translation::dispatch`: Concurrent batch dispatch
 *   - `translation::reassembly`: Order restoration and review pairing
 *   - `translation::core`: The run orchestrator
 * - `providers`: Clients for the remote translation service
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod jp_text;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ProviderError, TranslationError};
pub use providers::{Message, Provider, Role};
pub use translation::{RunOutcome, RunReport, Translator};
