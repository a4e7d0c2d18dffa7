use crate::error::MappingError;
use futures_util::future::select_all;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a call was aborted before its future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("operation cancelled")]
    Cancelled,
    #[error("operation timed out")]
    Timeout,
}

impl From<Interrupted> for MappingError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => MappingError::Cancelled,
            Interrupted::Timeout => MappingError::Timeout,
        }
    }
}

/// Per-call deadline and cancellation signal.
///
/// A `Context` is cheap to clone. Wrapping a future with [`Context::run`]
/// drops that future as soon as the deadline passes or a signal fires.
/// Dropping a future does not undo work a backend already started, so
/// repositories that write must check the context before committing.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
}

/// Fires the cancellation signal of the contexts derived from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a context whose deadline is `timeout` from now, or the
    /// current deadline if that is earlier.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a context with the earlier of `deadline` and the current one.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Returns a cancellable context and the handle that cancels it.
    ///
    /// Signals inherited from `self` still apply: the derived context is
    /// cancelled when either its own handle or any parent handle fires.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel.push(rx);
        (self, CancelHandle { tx })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.iter().any(|rx| *rx.borrow())
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Checks the context without waiting.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if self.is_expired() {
            return Err(Interrupted::Timeout);
        }
        Ok(())
    }

    /// Drives `fut` to completion unless the context is cancelled or its
    /// deadline passes first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        self.check()?;

        let cancelled = async {
            if self.cancel.is_empty() {
                std::future::pending::<()>().await;
            }

            let signals = self.cancel.iter().cloned().map(|mut rx| {
                Box::pin(async move {
                    // A dropped handle can never fire.
                    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                        std::future::pending::<()>().await;
                    }
                })
            });
            select_all(signals).await;
        };

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| Interrupted::Timeout),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Interrupted::Cancelled),
            output = bounded => output,
        }
    }
}
