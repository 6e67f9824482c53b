//! Running several async tasks under one shared [`Context`].
//!
//! Every task receives a child of the caller's context. The runners differ
//! only in how they react to failures:
//!
//! - [`all`] waits for every task and aggregates the failures into a
//!   [`RunError`].
//! - [`cancel_on_first_error`] cancels the shared context as soon as one
//!   task fails and returns that failure.
//! - [`sequential`] runs the tasks one after another and stops at the first
//!   failure or cancellation.
//!
//! # Examples
//!
//! ```rust
//! use collection::context::Context;
//! use collection::run::{self, Task};
//! use futures::FutureExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let tasks: Vec<Task<String>> = vec![
//!     Box::new(|_ctx: Context| async { Ok::<(), String>(()) }.boxed()),
//!     Box::new(|_ctx: Context| async { Err::<(), String>("disk full".to_string()) }.boxed()),
//! ];
//!
//! let error = run::all(&Context::background(), tasks).await.unwrap_err();
//! assert_eq!(error.errors(), ["disk full".to_string()]);
//! # }
//! ```

use std::error::Error;
use std::fmt;

use futures::future::BoxFuture;
use tokio::task::{JoinError, JoinSet};

use crate::context::{Context, ContextError};

/// A boxed task accepted by the runners.
pub type Task<E> = Box<dyn FnOnce(Context) -> BoxFuture<'static, Result<(), E>> + Send>;

// =============================================================================
// RunError
// =============================================================================

/// Every failure reported by the tasks passed to [`all`], in completion
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError<E> {
    errors: Vec<E>,
}

impl<E> RunError<E> {
    /// Returns the collected failures.
    #[must_use]
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// Consumes the error, returning the collected failures.
    #[must_use]
    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }
}

impl<E: fmt::Display> fmt::Display for RunError<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} task(s) failed: ", self.errors.len())?;
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{error}")?;
        }
        Ok(())
    }
}

impl<E: Error + 'static> Error for RunError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.errors.first().map(|error| error as &(dyn Error + 'static))
    }
}

// =============================================================================
// Runners
// =============================================================================

fn spawn_all<E, I, F>(ctx: &Context, tasks: I) -> JoinSet<Result<(), E>>
where
    E: Send + 'static,
    I: IntoIterator<Item = F>,
    F: FnOnce(Context) -> BoxFuture<'static, Result<(), E>>,
{
    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(task(ctx.clone()));
    }
    set
}

fn joined<E>(result: Result<Result<(), E>, JoinError>) -> Result<(), E> {
    match result {
        Ok(outcome) => outcome,
        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
        // Tasks are only aborted when the set is dropped.
        Err(_) => Ok(()),
    }
}

/// Runs every task concurrently and waits for all of them.
///
/// Must be called from within a Tokio runtime. A panic inside a task is
/// propagated to the caller.
///
/// # Errors
///
/// Returns a [`RunError`] holding every failure if at least one task failed.
pub async fn all<E, I, F>(ctx: &Context, tasks: I) -> Result<(), RunError<E>>
where
    E: Send + 'static,
    I: IntoIterator<Item = F>,
    F: FnOnce(Context) -> BoxFuture<'static, Result<(), E>>,
{
    let (child, _cancel) = ctx.with_cancel();
    let mut set = spawn_all(&child, tasks);

    let mut errors = Vec::new();
    while let Some(result) = set.join_next().await {
        if let Err(error) = joined(result) {
            errors.push(error);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(failed = errors.len(), "tasks failed");
        Err(RunError { errors })
    }
}

/// Runs every task concurrently; the first failure cancels the others.
///
/// The shared context is cancelled before the failure is returned, and tasks
/// still running are aborted.
///
/// # Errors
///
/// Returns the first failure reported by any task.
pub async fn cancel_on_first_error<E, I, F>(ctx: &Context, tasks: I) -> Result<(), E>
where
    E: Send + 'static,
    I: IntoIterator<Item = F>,
    F: FnOnce(Context) -> BoxFuture<'static, Result<(), E>>,
{
    let (child, cancel) = ctx.with_cancel();
    let mut set = spawn_all(&child, tasks);

    while let Some(result) = set.join_next().await {
        if let Err(error) = joined(result) {
            tracing::debug!(remaining = set.len(), "task failed, cancelling the rest");
            cancel.cancel();
            set.abort_all();
            return Err(error);
        }
    }
    Ok(())
}

/// Runs the tasks one after another in the calling task.
///
/// # Errors
///
/// Returns the first failure, or the context's cause converted into `E` if
/// `ctx` is cancelled before a task starts.
pub async fn sequential<E, I, F>(ctx: &Context, tasks: I) -> Result<(), E>
where
    E: From<ContextError>,
    I: IntoIterator<Item = F>,
    F: FnOnce(Context) -> BoxFuture<'static, Result<(), E>>,
{
    for task in tasks {
        if let Some(cause) = ctx.err() {
            return Err(E::from(cause));
        }
        task(ctx.clone()).await?;
    }
    Ok(())
}
