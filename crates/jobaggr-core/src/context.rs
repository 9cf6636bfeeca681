//! Cancellation and deadline carrier passed into every source invocation.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

/// A cancellable search context: a [`CancellationToken`] plus an optional
/// deadline.
///
/// Cloning is cheap and clones share the same token. Use [`child`](Self::child)
/// to derive a context that can be cancelled without affecting its parent.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl SearchContext {
    /// A context that is never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token, e.g. one cancelled by a Ctrl-C handler.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Set a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    /// Set an absolute deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Derive a context whose token is a child of this one.
    ///
    /// Cancelling the parent cancels the child; cancelling the child leaves
    /// the parent untouched.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The reason this context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<AppError> {
        if self.token.is_cancelled() {
            return Some(AppError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(AppError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Wait until the context is cancelled or its deadline passes.
    pub async fn done(&self) -> AppError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => AppError::Cancelled,
                    () = tokio::time::sleep_until(deadline) => AppError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                AppError::Cancelled
            }
        }
    }
}
