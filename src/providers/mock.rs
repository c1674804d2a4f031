/*!
 * Mock provider implementation for testing.
 *
 * This module provides a scripted provider that simulates different remote
 * behaviors:
 * - `MockProvider::working()` - Always succeeds, preserving line parity
 * - `MockProvider::malformed()` - Succeeds but collapses the output to one line
 * - `MockProvider::flaky(n)` - Fails the first n calls with a transient error
 * - `MockProvider::failing_transient()` - Always fails with a transient error
 * - `MockProvider::failing_fatal()` - Always fails with a non-retriable error
 * - `MockProvider::slow(ms)` - Succeeds after a delay
 *
 * The provider records its call count and the peak number of concurrent
 * in-flight calls, which the test suite uses to assert gate bounds.
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Message, Provider};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with one translated line per non-blank prompt line
    Working,
    /// Succeeds but returns a single line regardless of the prompt
    Malformed,
    /// Fails the first `fail_first` calls with a transient error, then works
    Flaky { fail_first: usize },
    /// Always fails with a transient (retriable) error
    FailingTransient,
    /// Always fails with a non-retriable error
    FailingFatal,
    /// Succeeds after a simulated delay
    Slow { delay_ms: u64 },
}

/// Mock provider for testing dispatch and retry behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Total number of translate calls received
    calls: Arc<AtomicUsize>,
    /// Number of calls currently in flight
    in_flight: Arc<AtomicUsize>,
    /// Highest number of calls observed in flight at once
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock whose output never matches the prompt's line count
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock that fails the first `fail_first` calls, then works
    pub fn flaky(fail_first: usize) -> Self {
        Self::new(MockBehavior::Flaky { fail_first })
    }

    /// Create a mock that always fails with a transient error
    pub fn failing_transient() -> Self {
        Self::new(MockBehavior::FailingTransient)
    }

    /// Create a mock that always fails with a non-retriable error
    pub fn failing_fatal() -> Self {
        Self::new(MockBehavior::FailingFatal)
    }

    /// Create a mock that succeeds after the given delay
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Total number of translate calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent in-flight calls observed
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Echo-translate: one output line per non-blank prompt line
    fn echo_translate(prompt: &Message) -> String {
        prompt
            .content
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("[EN] {}", line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn translate(
        &self,
        _instructions: &Message,
        prompt: &Message,
    ) -> Result<String, ProviderError> {
        let call_index = self.calls.fetch_add(1, Ordering::SeqCst);

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        // Yield even when no delay is configured so concurrent tasks overlap
        // observably.
        match self.behavior {
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            _ => {
                tokio::task::yield_now().await;
            }
        }

        let result = match self.behavior {
            MockBehavior::Working | MockBehavior::Slow { .. } => Ok(Self::echo_translate(prompt)),
            MockBehavior::Malformed => Ok("mistranslated".to_string()),
            MockBehavior::Flaky { fail_first } => {
                if call_index < fail_first {
                    Err(ProviderError::ConnectionError(
                        "mock connection reset".to_string(),
                    ))
                } else {
                    Ok(Self::echo_translate(prompt))
                }
            }
            MockBehavior::FailingTransient => Err(ProviderError::RateLimitExceeded(
                "mock rate limit".to_string(),
            )),
            MockBehavior::FailingFatal => Err(ProviderError::RequestFailed(
                "mock fatal failure".to_string(),
            )),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "mock"
    }
}
