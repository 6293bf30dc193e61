//! Explicit cancellation and deadline context.
//!
//! Every operation that touches the network, sleeps or waits on a lock takes
//! a [`Context`]. A context carries an optional deadline, a cancellation
//! token and, optionally, a per-call [`Interceptor`].
//!
//! Contexts form a tree: a child derived with [`Context::with_timeout`] is
//! cancelled together with its parent and never outlives the parent's
//! deadline.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use storage_api::Context;
//!
//! # tokio_test::block_on(async {
//! let ctx = Context::background().with_timeout(Duration::from_millis(10));
//! let result: Result<(), _> = ctx.sleep(Duration::from_secs(5)).await;
//! assert!(result.is_err());
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::rest::Interceptor;

/// Reasons a context stops an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was cancelled explicitly.
    #[error("Operation cancelled")]
    Cancelled,

    /// The context deadline passed.
    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation scope for one logical call tree.
#[derive(Clone)]
pub struct Context {
    deadline: Option<Instant>,
    token: CancellationToken,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl Context {
    /// Returns a context with no deadline that is never cancelled unless
    /// [`cancel`](Self::cancel) is called.
    #[must_use]
    pub fn background() -> Self {
        Self {
            deadline: None,
            token: CancellationToken::new(),
            interceptor: None,
        }
    }

    /// Derives a child context that can be cancelled on its own.
    ///
    /// Cancelling the parent still cancels the child.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            token: self.token.child_token(),
            interceptor: self.interceptor.clone(),
        }
    }

    /// Derives a child context with a deadline `timeout` from now.
    ///
    /// The child keeps the earlier of its own and the parent's deadline.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a child context with an absolute deadline.
    ///
    /// The child keeps the earlier of `deadline` and the parent's deadline.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            token: self.token.child_token(),
            interceptor: self.interceptor.clone(),
        }
    }

    /// Derives a child context that runs `interceptor` after the per-resource
    /// and global hooks of every call made with it.
    #[must_use]
    pub fn with_interceptor(&self, interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            deadline: self.deadline,
            token: self.token.child_token(),
            interceptor: Some(interceptor),
        }
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the per-call interceptor, if any.
    #[must_use]
    pub fn interceptor(&self) -> Option<&Arc<dyn Interceptor>> {
        self.interceptor.as_ref()
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fails if the context is already cancelled or past its deadline.
    ///
    /// # Errors
    ///
    /// Returns the [`ContextError`] that ended the context.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.token.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Runs `fut` to completion unless the context ends first.
    ///
    /// # Errors
    ///
    /// Returns the future's own error, or a [`ContextError`] converted into
    /// `E` when the context is cancelled or its deadline passes.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<ContextError>,
    {
        self.check()?;
        let deadline = self.deadline;
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ContextError::Cancelled.into()),
            () = sleep_until(deadline) => Err(ContextError::DeadlineExceeded.into()),
            result = fut => result,
        }
    }

    /// Sleeps for `duration` unless the context ends first.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`] when the context is cancelled or its
    /// deadline passes before the sleep completes.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ContextError> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.deadline)
            .field("cancelled", &self.token.is_cancelled())
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
