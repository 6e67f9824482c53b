//! Helpers that drain a producer's channel into a consumer strategy.
//!
//! A producer is an async function that receives a [`Context`] and the
//! sending half of a bounded Tokio channel, emits items, and returns
//! `Ok(())` or an error. The helpers in this module run the producer on the
//! Tokio runtime and consume what it sends:
//!
//! | Helper                | Result                                  |
//! |-----------------------|-----------------------------------------|
//! | [`ChannelFn::list`]   | every item, in emission order           |
//! | [`ChannelFn::count`]  | number of items                         |
//! | [`ChannelFn::set`]    | items added to a [`ConcurrentSet`]      |
//! | [`ChannelFn::map`]    | a function applied to every item        |
//!
//! [`stream_list`] is the reverse direction: it feeds a list into a channel
//! owned by the caller.
//!
//! Every blocking point observes the context, so cancelling it makes these
//! helpers return promptly with [`ChannelError::Cancelled`] or
//! [`StreamError::Cancelled`].
//!
//! [`Context`]: crate::context::Context
//! [`ConcurrentSet`]: crate::set::ConcurrentSet
//!
//! # Examples
//!
//! ```rust
//! use collection::channel::channel_fn_count;
//! use collection::context::Context;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let count = channel_fn_count(&Context::background(), |_ctx, sender| async move {
//!     for item in 0..5 {
//!         sender.send(item).await.map_err(|_| "receiver dropped")?;
//!     }
//!     Ok::<(), &str>(())
//! })
//! .await;
//!
//! assert_eq!(count, Ok(5));
//! # }
//! ```

mod drain;
mod error;
mod stream;

pub use drain::{
    ChannelFn, DEFAULT_CHANNEL_CAPACITY, channel_fn_count, channel_fn_list, channel_fn_map,
    channel_fn_set,
};
pub use error::{CapacityError, ChannelError, StreamError};
pub use stream::stream_list;
