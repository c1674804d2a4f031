/*!
 * Concurrency gate for in-flight remote calls.
 *
 * A thin counting gate over a semaphore: at most `max_concurrent` holders at
 * a time, callers suspend in `acquire` until a slot frees, and a slot is
 * released when the returned permit drops.
 */

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate bounding the number of concurrent batch translations
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    /// Underlying slot counter
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `max_concurrent` holders
    pub fn new(max_concurrent: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(max_concurrent)) }
    }

    /// Wait for a free slot; the slot is released when the permit drops
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        // The semaphore is never closed, so acquisition can only fail if the
        // gate itself is gone.
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("concurrency gate semaphore closed")
    }

    /// Number of currently free slots
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
