//! Draining a producer into a consumer strategy.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinError};

use super::error::{CapacityError, ChannelError};
use crate::context::{Context, ContextError};
use crate::set::ConcurrentSet;

/// Default capacity of the channel between producer and consumer.
///
/// A capacity of one keeps the producer at most one item ahead of the
/// consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

const LIST_OPERATION: &str = "convert channel to list";
const COUNT_OPERATION: &str = "count channel";
const MAP_OPERATION: &str = "map channel";
const SET_OPERATION: &str = "convert channel to set";

/// Aborts the producer task when the drain ends, whichever way it ends.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// =============================================================================
// ChannelFn
// =============================================================================

/// Runs a producer against a consumer strategy over a bounded channel.
///
/// The producer is spawned on the Tokio runtime and receives a [`Context`]
/// plus the sending half of the channel; the channel closes once the
/// producer returns and drops its sender. The consumer runs in the calling
/// task. Every receive races [`Context::done`], so cancellation returns
/// promptly even when the producer is stuck.
///
/// All methods must be called from within a Tokio runtime.
///
/// # Examples
///
/// ```rust
/// use collection::channel::ChannelFn;
/// use collection::context::Context;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let channel = ChannelFn::with_capacity(16);
/// let items = channel
///     .list(&Context::background(), |_ctx, sender| async move {
///         for item in ["a", "b", "c"] {
///             if sender.send(item).await.is_err() {
///                 break;
///             }
///         }
///         Ok::<(), std::io::Error>(())
///     })
///     .await
///     .unwrap();
///
/// assert_eq!(items, vec!["a", "b", "c"]);
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelFn {
    capacity: usize,
}

impl ChannelFn {
    /// Creates a `ChannelFn` using [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Creates a `ChannelFn` with the given channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0. Use [`ChannelFn::try_with_capacity`] for a
    /// non-panicking alternative.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(channel) => channel,
            Err(error) => panic!("{error}"),
        }
    }

    /// Creates a `ChannelFn` with the given channel capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `capacity` is 0.
    pub const fn try_with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError);
        }
        Ok(Self { capacity })
    }

    /// Returns the channel capacity.
    #[must_use]
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Collects every emitted item in emission order.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] with operation `"convert channel to list"`
    /// if the producer fails or `ctx` is cancelled; no partial list is
    /// returned.
    pub async fn list<T, E, P, F>(
        &self,
        ctx: &Context,
        producer: P,
    ) -> Result<Vec<T>, ChannelError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        P: FnOnce(Context, mpsc::Sender<T>) -> F,
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        let mut items = Vec::new();
        self.drain(ctx, LIST_OPERATION, producer, |item| items.push(item)).await?;
        Ok(items)
    }

    /// Counts the emitted items.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] with operation `"count channel"` if the
    /// producer fails or `ctx` is cancelled. A failed count never reports a
    /// number, so zero items received successfully is distinguishable from a
    /// failure.
    pub async fn count<T, E, P, F>(
        &self,
        ctx: &Context,
        producer: P,
    ) -> Result<usize, ChannelError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        P: FnOnce(Context, mpsc::Sender<T>) -> F,
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        let mut count = 0_usize;
        self.drain(ctx, COUNT_OPERATION, producer, |_| count += 1).await?;
        Ok(count)
    }

    /// Drains every emitted item into `set` and returns how many items were
    /// received.
    ///
    /// Items are added in one batch once the producer has finished, so a
    /// failed or cancelled drain leaves `set` untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] with operation `"convert channel to set"`
    /// if the producer fails or `ctx` is cancelled.
    pub async fn set<T, E, P, F, S>(
        &self,
        ctx: &Context,
        producer: P,
        set: &S,
    ) -> Result<usize, ChannelError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        P: FnOnce(Context, mpsc::Sender<T>) -> F,
        F: Future<Output = Result<(), E>> + Send + 'static,
        S: ConcurrentSet<T> + ?Sized,
    {
        let mut items = Vec::new();
        self.drain(ctx, SET_OPERATION, producer, |item| items.push(item)).await?;
        let received = items.len();
        set.insert_many(items);
        Ok(received)
    }

    /// Calls `mapper` once per emitted item while the producer runs.
    ///
    /// The mapper is awaited in the calling task, one item at a time, and
    /// races `ctx` like every receive does. Items already mapped stay mapped
    /// when a later item fails.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] with operation `"map channel"`:
    ///
    /// - `Consumer` when `mapper` fails; the producer is cancelled through
    ///   its context and aborted.
    /// - `Producer` when the producer fails, reported once every item it
    ///   emitted has been mapped. When both fail, the producer error wins
    ///   only if its task had already finished when the mapper failed; on a
    ///   multi-threaded runtime a producer failing at the same moment may be
    ///   reported as `Consumer` instead.
    /// - `Cancelled` when `ctx` is cancelled.
    pub async fn map<T, E, P, F, M, G>(
        &self,
        ctx: &Context,
        producer: P,
        mut mapper: M,
    ) -> Result<(), ChannelError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        P: FnOnce(Context, mpsc::Sender<T>) -> F,
        F: Future<Output = Result<(), E>> + Send + 'static,
        M: FnMut(Context, T) -> G,
        G: Future<Output = Result<(), E>>,
    {
        let (producer_ctx, cancel_producer) = ctx.with_cancel();
        let (sender, mut receiver) = mpsc::channel(self.capacity);
        let mut task = tokio::spawn(producer(producer_ctx.clone(), sender));
        let _abort = AbortOnDrop(task.abort_handle());
        let mut done = ctx.done();
        let mut producer_finished = false;

        loop {
            let item = if producer_finished {
                // Only what is already buffered is still mapped.
                match receiver.try_recv() {
                    Ok(item) => item,
                    Err(_) => return Ok(()),
                }
            } else {
                tokio::select! {
                    biased;
                    cause = &mut done => return Err(cancelled(MAP_OPERATION, cause)),
                    item = receiver.recv() => match item {
                        Some(item) => item,
                        None => break,
                    },
                    joined = &mut task => {
                        settle(MAP_OPERATION, joined)?;
                        producer_finished = true;
                        continue;
                    }
                }
            };

            let mapped = tokio::select! {
                biased;
                cause = &mut done => return Err(cancelled(MAP_OPERATION, cause)),
                mapped = mapper(producer_ctx.clone(), item) => mapped,
            };
            if let Err(source) = mapped {
                cancel_producer.cancel();
                if !producer_finished
                    && task.is_finished()
                    && let Err(error) = settle(MAP_OPERATION, (&mut task).await)
                {
                    return Err(error);
                }
                tracing::debug!(operation = MAP_OPERATION, "map function failed");
                return Err(ChannelError::Consumer {
                    operation: MAP_OPERATION,
                    source,
                });
            }
        }

        let joined = tokio::select! {
            biased;
            cause = &mut done => return Err(cancelled(MAP_OPERATION, cause)),
            joined = &mut task => joined,
        };
        settle(MAP_OPERATION, joined)
    }

    async fn drain<T, E, P, F, C>(
        &self,
        ctx: &Context,
        operation: &'static str,
        producer: P,
        mut consume: C,
    ) -> Result<(), ChannelError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        P: FnOnce(Context, mpsc::Sender<T>) -> F,
        F: Future<Output = Result<(), E>> + Send + 'static,
        C: FnMut(T),
    {
        let (sender, mut receiver) = mpsc::channel(self.capacity);
        let mut task = tokio::spawn(producer(ctx.clone(), sender));
        let _abort = AbortOnDrop(task.abort_handle());
        let mut done = ctx.done();

        loop {
            tokio::select! {
                biased;
                cause = &mut done => return Err(cancelled(operation, cause)),
                item = receiver.recv() => match item {
                    Some(item) => consume(item),
                    None => break,
                },
                // A sender clone may outlive the producer.
                joined = &mut task => {
                    settle(operation, joined)?;
                    while let Ok(item) = receiver.try_recv() {
                        consume(item);
                    }
                    return Ok(());
                }
            }
        }

        // The sender may be dropped before the producer returns.
        let joined = tokio::select! {
            biased;
            cause = &mut done => return Err(cancelled(operation, cause)),
            joined = &mut task => joined,
        };
        settle(operation, joined)
    }
}

impl Default for ChannelFn {
    fn default() -> Self {
        Self::new()
    }
}

fn cancelled<E>(operation: &'static str, cause: ContextError) -> ChannelError<E> {
    tracing::debug!(operation, %cause, "channel drain cancelled");
    ChannelError::Cancelled { operation, cause }
}

fn settle<E>(
    operation: &'static str,
    joined: Result<Result<(), E>, JoinError>,
) -> Result<(), ChannelError<E>> {
    match joined {
        Ok(Ok(())) => {
            tracing::trace!(operation, "producer completed");
            Ok(())
        }
        Ok(Err(source)) => {
            tracing::debug!(operation, "producer failed");
            Err(ChannelError::Producer { operation, source })
        }
        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
        Err(_) => Err(cancelled(operation, ContextError::Canceled)),
    }
}

// =============================================================================
// Free Functions
// =============================================================================

/// Collects a producer's items with the default [`ChannelFn`].
///
/// See [`ChannelFn::list`].
///
/// # Errors
///
/// Returns [`ChannelError`] if the producer fails or `ctx` is cancelled.
pub async fn channel_fn_list<T, E, P, F>(
    ctx: &Context,
    producer: P,
) -> Result<Vec<T>, ChannelError<E>>
where
    T: Send + 'static,
    E: Send + 'static,
    P: FnOnce(Context, mpsc::Sender<T>) -> F,
    F: Future<Output = Result<(), E>> + Send + 'static,
{
    ChannelFn::new().list(ctx, producer).await
}

/// Counts a producer's items with the default [`ChannelFn`].
///
/// See [`ChannelFn::count`].
///
/// # Errors
///
/// Returns [`ChannelError`] if the producer fails or `ctx` is cancelled.
pub async fn channel_fn_count<T, E, P, F>(
    ctx: &Context,
    producer: P,
) -> Result<usize, ChannelError<E>>
where
    T: Send + 'static,
    E: Send + 'static,
    P: FnOnce(Context, mpsc::Sender<T>) -> F,
    F: Future<Output = Result<(), E>> + Send + 'static,
{
    ChannelFn::new().count(ctx, producer).await
}

/// Maps a producer's items with the default [`ChannelFn`].
///
/// See [`ChannelFn::map`].
///
/// # Errors
///
/// Returns [`ChannelError`] if the producer or the mapper fails, or `ctx` is
/// cancelled.
pub async fn channel_fn_map<T, E, P, F, M, G>(
    ctx: &Context,
    producer: P,
    mapper: M,
) -> Result<(), ChannelError<E>>
where
    T: Send + 'static,
    E: Send + 'static,
    P: FnOnce(Context, mpsc::Sender<T>) -> F,
    F: Future<Output = Result<(), E>> + Send + 'static,
    M: FnMut(Context, T) -> G,
    G: Future<Output = Result<(), E>>,
{
    ChannelFn::new().map(ctx, producer, mapper).await
}

/// Drains a producer's items into `set` with the default [`ChannelFn`].
///
/// See [`ChannelFn::set`].
///
/// # Errors
///
/// Returns [`ChannelError`] if the producer fails or `ctx` is cancelled.
pub async fn channel_fn_set<T, E, P, F, S>(
    ctx: &Context,
    producer: P,
    set: &S,
) -> Result<usize, ChannelError<E>>
where
    T: Send + 'static,
    E: Send + 'static,
    P: FnOnce(Context, mpsc::Sender<T>) -> F,
    F: Future<Output = Result<(), E>> + Send + 'static,
    S: ConcurrentSet<T> + ?Sized,
{
    ChannelFn::new().set(ctx, producer, set).await
}
