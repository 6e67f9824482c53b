//! Pushing a list into a channel.

use tokio::sync::mpsc;

use super::error::StreamError;
use crate::context::Context;

/// Sends every item of `items` on `sender`, in order.
///
/// Each send races [`Context::done`]: when the context is cancelled the
/// cancellation cause is returned unwrapped and the remaining items are not
/// sent. The channel is never closed by this function; the caller keeps
/// ownership of `sender`.
///
/// # Errors
///
/// - [`StreamError::Cancelled`] if `ctx` is cancelled before every item was
///   sent.
/// - [`StreamError::Closed`] if the receiver is dropped.
///
/// # Examples
///
/// ```rust
/// use collection::channel::stream_list;
/// use collection::context::Context;
/// use tokio::sync::mpsc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (sender, mut receiver) = mpsc::channel(3);
/// stream_list(&Context::background(), [1, 2, 3], &sender).await.unwrap();
/// drop(sender);
///
/// let mut received = Vec::new();
/// while let Some(item) = receiver.recv().await {
///     received.push(item);
/// }
/// assert_eq!(received, vec![1, 2, 3]);
/// # }
/// ```
pub async fn stream_list<T, I>(
    ctx: &Context,
    items: I,
    sender: &mpsc::Sender<T>,
) -> Result<(), StreamError>
where
    I: IntoIterator<Item = T>,
{
    let mut done = ctx.done();
    for item in items {
        tokio::select! {
            biased;
            cause = &mut done => return Err(StreamError::Cancelled(cause)),
            sent = sender.send(item) => {
                if sent.is_err() {
                    tracing::debug!("stream receiver dropped");
                    return Err(StreamError::Closed);
                }
            }
        }
    }
    Ok(())
}
