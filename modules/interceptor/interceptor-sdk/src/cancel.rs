//! Cancellation plumbing between a request's caller and its task.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Owner side of a request's cancellation state.
///
/// Hand out [`CancelHandle`]s to callers and [`CancelSignal`]s to the work
/// that should stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn handle(&self) -> CancelHandle {
        CancelHandle {
            inner: self.inner.clone(),
        }
    }

    #[must_use]
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            inner: self.inner.clone(),
        }
    }
}

/// Caller side: requests cancellation.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    inner: CancellationToken,
}

impl CancelHandle {
    /// Request cancellation. Repeated calls, and calls after the request
    /// settled, are no-ops.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

/// Worker side: observes cancellation.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    inner: CancellationToken,
}

impl CancelSignal {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.cancelled()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        let handle = token.handle();
        let signal = token.signal();

        assert!(!signal.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(signal.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_signal_wakes_on_cancel() {
        let token = CancelToken::new();
        let signal = token.signal();
        let handle = token.handle();

        let waiter = tokio::spawn(async move { signal.cancelled().await });
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("signal should resolve")
            .unwrap();
    }
}
