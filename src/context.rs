//! Cooperative cancellation for blocking helpers.
//!
//! A [`Context`] is a cheap, cloneable handle on a shared cancellation
//! state. Every blocking point in this crate (channel sends, channel
//! receives, per-element loops) selects between its own work and
//! [`Context::done`], returning the [`ContextError`] cause as soon as the
//! context is cancelled.
//!
//! Contexts form a tree: cancelling a parent cancels all of its children,
//! while cancelling a child never affects its parent. The first recorded
//! cause wins.
//!
//! # Examples
//!
//! ```rust
//! use collection::context::{Context, ContextError};
//!
//! let (ctx, cancel) = Context::background().with_cancel();
//! assert_eq!(ctx.err(), None);
//!
//! cancel.cancel();
//! assert_eq!(ctx.err(), Some(ContextError::Canceled));
//! ```

use std::error::Error;
use std::fmt;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::time::Instant;

// =============================================================================
// ContextError
// =============================================================================

/// The cause recorded when a [`Context`] is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextError {
    /// The context was cancelled through a [`CancelHandle`].
    Canceled,
    /// The deadline of the context elapsed.
    DeadlineExceeded,
}

impl fmt::Display for ContextError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => write!(formatter, "context canceled"),
            Self::DeadlineExceeded => write!(formatter, "context deadline exceeded"),
        }
    }
}

impl Error for ContextError {}

// =============================================================================
// Context
// =============================================================================

/// A cancellation signal shared between a caller and the work it starts.
///
/// Cloning a `Context` yields another handle on the same state; use
/// [`Context::with_cancel`] or [`Context::with_timeout`] to derive a child
/// that can be cancelled independently of its parent.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    state: watch::Sender<Option<ContextError>>,
    deadline: Option<Instant>,
    parent: Option<Context>,
}

impl ContextInner {
    fn new(parent: Option<Context>, deadline: Option<Instant>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state,
            deadline,
            parent,
        }
    }

    fn err(&self) -> Option<ContextError> {
        if let Some(cause) = *self.state.borrow() {
            return Some(cause);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(ContextError::DeadlineExceeded);
        }
        self.parent.as_ref().and_then(Context::err)
    }
}

impl Context {
    /// Returns a root context that is never cancelled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::context::Context;
    ///
    /// let ctx = Context::background();
    /// assert!(!ctx.is_cancelled());
    /// ```
    #[must_use]
    pub fn background() -> Self {
        Self {
            inner: Arc::new(ContextInner::new(None, None)),
        }
    }

    /// Derives a child context together with the handle that cancels it.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        self.derive(None)
    }

    /// Derives a child context that is cancelled with
    /// [`ContextError::DeadlineExceeded`] once `deadline` is reached.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> (Self, CancelHandle) {
        self.derive(Some(deadline))
    }

    /// Derives a child context that expires after `timeout`.
    ///
    /// A timeout too large to be represented as an instant yields a child
    /// without a deadline of its own.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::context::{Context, ContextError};
    /// use std::time::Duration;
    ///
    /// let (ctx, _cancel) = Context::background().with_timeout(Duration::ZERO);
    /// assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    /// ```
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelHandle) {
        self.derive(Instant::now().checked_add(timeout))
    }

    fn derive(&self, deadline: Option<Instant>) -> (Self, CancelHandle) {
        let inner = Arc::new(ContextInner::new(Some(self.clone()), deadline));
        let handle = CancelHandle {
            inner: Arc::clone(&inner),
        };
        (Self { inner }, handle)
    }

    /// Returns the earliest deadline of this context and its ancestors.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        let inherited = self.inner.parent.as_ref().and_then(Self::deadline);
        match (self.inner.deadline, inherited) {
            (Some(own), Some(inherited)) => Some(own.min(inherited)),
            (own, inherited) => own.or(inherited),
        }
    }

    /// Returns the cancellation cause, or `None` while the context is live.
    ///
    /// This never blocks.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        self.inner.err()
    }

    /// Returns `true` once the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves with the cancellation cause once the context is cancelled.
    ///
    /// The returned future completes when this context is cancelled, when
    /// its deadline elapses or when any ancestor is cancelled. It never
    /// completes for [`Context::background`].
    pub fn done(&self) -> BoxFuture<'_, ContextError> {
        Box::pin(async move {
            if let Some(cause) = self.err() {
                return cause;
            }

            let mut receiver = self.inner.state.subscribe();
            let own = async move {
                let recorded = receiver
                    .wait_for(Option::is_some)
                    .await
                    .map(|state| *state);
                match recorded {
                    Ok(cause) => cause.unwrap_or(ContextError::Canceled),
                    Err(_) => pending().await,
                }
            };
            let deadline = async {
                match self.inner.deadline {
                    Some(deadline) => {
                        tokio::time::sleep_until(deadline).await;
                        ContextError::DeadlineExceeded
                    }
                    None => pending().await,
                }
            };
            let parent = async {
                match &self.inner.parent {
                    Some(parent) => parent.done().await,
                    None => pending().await,
                }
            };

            tokio::select! {
                cause = own => cause,
                cause = deadline => cause,
                cause = parent => cause,
            }
        })
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Context")
            .field("err", &self.err())
            .field("deadline", &self.deadline())
            .finish()
    }
}

// =============================================================================
// CancelHandle
// =============================================================================

/// Cancels the context it was created with.
///
/// Dropping the handle does not cancel the context.
pub struct CancelHandle {
    inner: Arc<ContextInner>,
}

impl CancelHandle {
    /// Cancels the associated context and all of its descendants.
    ///
    /// Calling `cancel` more than once is a no-op. If the context was already
    /// cancelled through its deadline or an ancestor, that cause is kept.
    pub fn cancel(&self) {
        let cause = self.inner.err().unwrap_or(ContextError::Canceled);
        self.inner.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(cause);
            true
        });
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CancelHandle")
            .field("err", &self.inner.err())
            .finish()
    }
}

static_assertions::assert_impl_all!(Context: Send, Sync, Clone);
static_assertions::assert_impl_all!(CancelHandle: Send, Sync);
