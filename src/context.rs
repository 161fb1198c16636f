//! Cancellation signal threaded through blocking negotiation calls
//!
//! The probe and every token exchange block on network I/O. Callers hand a
//! [`CancelToken`] to [`negotiate`](crate::transport::negotiate); cancelling it
//! aborts the in-flight call and surfaces [`TransportError::Cancelled`] instead
//! of an ordinary network failure. Deadlines compose at the call site, e.g.
//! `tokio::time::timeout` around `negotiate`. The token spawns no tasks of its
//! own.

use crate::error::{Result, TransportError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Clonable cancellation handle shared between a caller and the transports it
/// negotiated
#[derive(Debug, Clone)]
pub struct CancelToken {
    signal: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            signal: Arc::new(sender),
        }
    }

    /// Request cancellation. Idempotent; every clone observes it.
    pub fn cancel(&self) {
        // send_replace stores the value even while nobody is subscribed.
        self.signal.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut receiver = self.signal.subscribe();
        loop {
            if *receiver.borrow() {
                return;
            }
            if receiver.changed().await.is_err() {
                // Sender kept alive by self, so this cannot happen while we
                // are polled; park forever rather than report a spurious cancel.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Run a fallible future, aborting with `Cancelled` if the token fires first
    pub async fn run<T>(&self, future: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(TransportError::Cancelled),
            result = future => result,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
