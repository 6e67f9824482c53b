//! # collection
//!
//! Thread-safe generic sets and cancellation-aware channel helpers.
//!
//! ## Overview
//!
//! - **Sets**: [`Set`](set::Set) keyed by native `Eq + Hash`,
//!   [`SetEqual`](set::SetEqual) keyed by a user equality predicate and
//!   [`SetHashCode`](set::SetHashCode) keyed by a user string hash code.
//!   Every instance is guarded by a single mutex, so all of them can be
//!   shared across threads behind an `Arc`.
//! - **Context**: [`Context`](context::Context) carries a cooperative
//!   cancellation signal with a cause.
//! - **Channel helpers**: drain a producer writing into a bounded channel
//!   into a list, a count, a per-item mapper or a set.
//! - **Runner**: execute several async functions concurrently.
//! - **Slice primitives**: stateless helpers such as `filter`, `find`,
//!   `unique` and `intersect`.
//!
//! ## Feature Flags
//!
//! - `serde`: JSON (and any other serde format) support for the sets
//!   (enabled by default)
//! - `fxhash`: back hash-based sets with `rustc-hash`
//! - `ahash`: back hash-based sets with `ahash`
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use collection::prelude::*;
//!
//! let set = Set::from(["b", "a", "b"]);
//! assert_eq!(set.len(), 2);
//! assert_eq!(set.to_string(), "Set[a, b]");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use collection::prelude::*;
/// ```
pub mod prelude {
    pub use crate::channel::*;
    pub use crate::context::*;
    pub use crate::set::*;
}

pub mod channel;
pub mod context;
pub mod run;
pub mod set;
pub mod slice;

pub use context::{CancelHandle, Context, ContextError};
pub use set::{ConcurrentSet, HasEqual, HasHashCode, Set, SetEqual, SetHashCode};
