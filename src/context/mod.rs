//! Per-call context carrying cancellation and deadlines.
//!
//! Every public store operation takes a [`CallContext`]. The store checks it
//! around embedder calls and hands it to the [`crate::Embedder`], which is
//! expected to poll [`CallContext::check`] during network-bound work. Index
//! traversal itself is CPU-bound and runs to completion once started.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use annstore::{CallContext, Error};
//!
//! let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
//! assert!(ctx.check().is_ok());
//!
//! let token = ctx.cancellation_token();
//! token.cancel();
//! assert!(matches!(ctx.check(), Err(Error::Cancelled)));
//! ```

use std::time::{Duration, Instant};

pub use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Cancellation and deadline state for one store call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Creates a context with no deadline and a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context observing an existing token.
    #[must_use]
    pub const fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derives a context for a sub-call.
    ///
    /// The child keeps this deadline and is cancelled along with its parent,
    /// but cancelling the child leaves the parent running.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Sets a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns a clone of the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fails if the call was cancelled or its deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] or [`Error::DeadlineExceeded`].
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }
}
