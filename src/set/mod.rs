//! Thread-safe generic sets.
//!
//! This module provides three set types that share one contract but differ
//! in how they decide that two elements are "the same":
//!
//! - [`Set`]: native identity (`Eq + Hash`), backed by a hash set
//! - [`SetEqual`]: a user equality predicate ([`HasEqual`]), backed by a
//!   vector scanned linearly; insertion order is preserved
//! - [`SetHashCode`]: a user string hash code ([`HasHashCode`]), backed by a
//!   hash map keyed by that code; colliding codes are last-write-wins
//!
//! Every instance guards its storage with a single mutex. Each public
//! operation is atomic with respect to the others on the same instance;
//! sequences of operations (`contains` then `add`) are not.
//!
//! # Examples
//!
//! ```rust
//! use collection::set::{ConcurrentSet, Set};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let set = Arc::new(Set::new());
//! let handles: Vec<_> = (0..4)
//!     .map(|index| {
//!         let set = Arc::clone(&set);
//!         thread::spawn(move || set.add_all([index, index + 1]))
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(set.len(), 5);
//! ```

mod comparable;
mod equal;
mod hash_code;
mod text;

pub use comparable::Set;
pub use equal::{HasEqual, SetEqual};
pub use hash_code::{HasHashCode, HashCollisionError, SetHashCode};
pub use text::{parse_set_from_string, parse_set_from_strings};

// =============================================================================
// Shared Contract
// =============================================================================

/// The capability set shared by [`Set`], [`SetEqual`] and [`SetHashCode`].
///
/// Implementors decide element identity; callers can stay generic over it.
///
/// # Examples
///
/// ```rust
/// use collection::set::{ConcurrentSet, Set};
///
/// fn register<S: ConcurrentSet<&'static str>>(set: &S) {
///     set.insert_many(vec!["a", "b", "a"]);
/// }
///
/// let set = Set::new();
/// register(&set);
/// assert_eq!(set.size(), 2);
/// ```
pub trait ConcurrentSet<T> {
    /// Adds every element, taking the lock once.
    fn insert_many(&self, elements: Vec<T>);

    /// Removes every element that matches one of `elements`.
    fn remove_many(&self, elements: &[T]);

    /// Returns `true` if an element matching `element` is stored.
    fn has(&self, element: &T) -> bool;

    /// Returns `true` if every element of `elements` is stored.
    fn has_all(&self, elements: &[T]) -> bool;

    /// Returns `true` if at least one element of `elements` is stored.
    fn has_any(&self, elements: &[T]) -> bool;

    /// Returns a copy of the stored elements.
    fn snapshot(&self) -> Vec<T>;

    /// Returns the number of stored elements.
    fn size(&self) -> usize;
}

// =============================================================================
// Hashing Configuration
// =============================================================================

#[cfg(feature = "fxhash")]
pub(crate) type DefaultBuildHasher = rustc_hash::FxBuildHasher;

#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
pub(crate) type DefaultBuildHasher = ahash::RandomState;

#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
pub(crate) type DefaultBuildHasher = std::collections::hash_map::RandomState;

// =============================================================================
// Rendering
// =============================================================================

/// Renders elements through `Display` and sorts the result.
pub(crate) fn sorted_strings<'a, T, I>(elements: I) -> Vec<String>
where
    T: std::fmt::Display + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut strings: Vec<String> = elements
        .into_iter()
        .map(|element| element.to_string())
        .collect();
    strings.sort_unstable();
    strings
}

/// Writes `prefix`, the comma-space separated elements and a closing `]`.
pub(crate) fn format_set(
    formatter: &mut std::fmt::Formatter<'_>,
    prefix: &str,
    elements: &[String],
) -> std::fmt::Result {
    write!(formatter, "{prefix}[{}]", elements.join(", "))
}
