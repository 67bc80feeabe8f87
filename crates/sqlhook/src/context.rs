//! Request-scoped context: cancellation, deadline and the call start marker.
//!
//! A [`Context`] is cheap to clone and is passed by reference into every
//! context-aware driver call. Derived contexts observe the cancellation of
//! their parent, and the earliest deadline in the chain wins.
//!
//! ```
//! use sqlhook::Context;
//! use std::time::Duration;
//!
//! let (ctx, cancel) = Context::background().with_cancel();
//! let ctx = ctx.with_timeout(Duration::from_secs(5));
//! assert!(ctx.err().is_none());
//!
//! cancel.cancel();
//! assert!(ctx.err().is_some());
//! ```

use crate::error::{ContextError, Result};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation and timing state carried alongside a database call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
    started_at: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a cancellable context.
    ///
    /// Cancelling the returned handle cancels the new context and everything
    /// derived from it, but not `self`.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let token = match &self.token {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let ctx = Self {
            token: Some(token.clone()),
            ..self.clone()
        };
        (ctx, CancelHandle { token })
    }

    /// Derive a context that expires at `deadline`.
    ///
    /// An earlier deadline already present on `self` is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Derive a context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Derive a context carrying a start marker, read back by [`elapsed`].
    pub fn with_start_time(&self, at: Instant) -> Self {
        Self {
            started_at: Some(at),
            ..self.clone()
        }
    }

    /// The start marker, if one was stamped.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// The effective deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether this context can ever become done.
    ///
    /// `false` for [`Context::background`] and anything derived from it
    /// without a cancel handle or deadline.
    pub fn can_be_canceled(&self) -> bool {
        self.token.is_some() || self.deadline.is_some()
    }

    /// Non-blocking poll: why the context is done, or `None` while it is live.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether the context is done.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Return the context's error if it is done.
    pub fn check(&self) -> Result<()> {
        match self.err() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

/// Cancels the [`Context`] it was created with.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Cancel the associated context. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the associated context is canceled, by this handle or by
    /// one of its ancestors.
    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Time since the start marker on `ctx`, or zero when none was stamped.
///
/// Every hooked call stamps the marker right before the `before` callback
/// runs, so inside `after` this is the duration of the call.
pub fn elapsed(ctx: &Context) -> Duration {
    ctx.started_at()
        .map(|start| start.elapsed())
        .unwrap_or_default()
}
