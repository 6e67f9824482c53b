//! Stateless helpers over slices.
//!
//! Every function borrows its input and returns a fresh `Vec`; none of them
//! mutate the argument. Functions that need identity use `Eq + Hash` and
//! build a hash index, so they run in linear time.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::hash::Hash;

use crate::context::{Context, ContextError};

// =============================================================================
// NotFoundError
// =============================================================================

/// Returned by [`find`] when no element matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotFoundError;

impl fmt::Display for NotFoundError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "not found")
    }
}

impl Error for NotFoundError {}

// =============================================================================
// Transforms
// =============================================================================

/// Returns the elements matching `predicate`, in order.
///
/// # Examples
///
/// ```rust
/// use collection::slice::filter;
///
/// assert_eq!(filter(&[1, 2, 3, 4], |value| value % 2 == 0), vec![2, 4]);
/// ```
pub fn filter<T, P>(list: &[T], mut predicate: P) -> Vec<T>
where
    T: Clone,
    P: FnMut(&T) -> bool,
{
    list.iter().filter(|element| predicate(element)).cloned().collect()
}

/// Applies `function` to every element and stops at the first error.
///
/// # Errors
///
/// Returns the first error produced by `function`; later elements are not
/// visited.
///
/// # Examples
///
/// ```rust
/// use collection::slice::map;
///
/// let parsed: Result<Vec<i32>, _> = map(&["1", "2"], |value| value.parse::<i32>());
/// assert_eq!(parsed, Ok(vec![1, 2]));
///
/// assert!(map(&["1", "x"], |value| value.parse::<i32>()).is_err());
/// ```
pub fn map<T, U, E, F>(list: &[T], function: F) -> Result<Vec<U>, E>
where
    F: FnMut(&T) -> Result<U, E>,
{
    list.iter().map(function).collect()
}

/// Returns the first element matching `predicate`.
///
/// # Errors
///
/// Returns [`NotFoundError`] if no element matches.
///
/// # Examples
///
/// ```rust
/// use collection::slice::{NotFoundError, find};
///
/// assert_eq!(find(&["a", "b"], |value| *value == "b"), Ok(&"b"));
/// assert_eq!(find(&["a", "b"], |value| *value == "c"), Err(NotFoundError));
/// ```
pub fn find<T, P>(list: &[T], mut predicate: P) -> Result<&T, NotFoundError>
where
    P: FnMut(&T) -> bool,
{
    list.iter()
        .find(|element| predicate(element))
        .ok_or(NotFoundError)
}

/// Removes duplicates, keeping the first occurrence of each element.
///
/// # Examples
///
/// ```rust
/// use collection::slice::unique;
///
/// assert_eq!(unique(&["b", "a", "b", "c", "a"]), vec!["b", "a", "c"]);
/// ```
pub fn unique<T>(list: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::with_capacity(list.len());
    list.iter()
        .filter(|element| seen.insert(*element))
        .cloned()
        .collect()
}

/// Returns the elements of `a` that also occur in `b`.
///
/// The result follows the order of `a` and holds every common element once.
///
/// # Examples
///
/// ```rust
/// use collection::slice::intersect;
///
/// assert_eq!(intersect(&["c", "a", "b"], &["a", "b", "c"]), vec!["c", "a", "b"]);
/// assert_eq!(intersect(&["a", "a", "b", "b"], &["a", "a", "c"]), vec!["a"]);
/// ```
pub fn intersect<T>(a: &[T], b: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let in_b: HashSet<&T> = b.iter().collect();
    let mut seen = HashSet::new();
    a.iter()
        .filter(|element| in_b.contains(element) && seen.insert(*element))
        .cloned()
        .collect()
}

/// Returns the elements of `list` that do not occur in `excluded`.
///
/// # Examples
///
/// ```rust
/// use collection::slice::exclude;
///
/// assert_eq!(exclude(&["a", "b", "c"], &["a"]), vec!["b", "c"]);
/// ```
pub fn exclude<T>(list: &[T], excluded: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let excluded: HashSet<&T> = excluded.iter().collect();
    list.iter()
        .filter(|element| !excluded.contains(element))
        .cloned()
        .collect()
}

/// Concatenates `a` and `b`.
pub fn join<T: Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut result = Vec::with_capacity(a.len() + b.len());
    result.extend_from_slice(a);
    result.extend_from_slice(b);
    result
}

/// Returns the elements in reverse order.
pub fn reverse<T: Clone>(list: &[T]) -> Vec<T> {
    list.iter().rev().cloned().collect()
}

/// Returns a shallow copy of `list`.
pub fn copy<T: Clone>(list: &[T]) -> Vec<T> {
    list.to_vec()
}

// =============================================================================
// Queries
// =============================================================================

/// Returns `true` if `list` holds `value`.
pub fn contains<T: PartialEq>(list: &[T], value: &T) -> bool {
    list.contains(value)
}

/// Returns `true` if every element of `b` occurs in `a`.
///
/// An empty `b` is contained in anything.
///
/// # Examples
///
/// ```rust
/// use collection::slice::contains_all;
///
/// assert!(contains_all(&[1, 2, 3], &[3, 1]));
/// assert!(contains_all::<i32>(&[], &[]));
/// assert!(!contains_all(&[1, 2], &[4]));
/// ```
pub fn contains_all<T>(a: &[T], b: &[T]) -> bool
where
    T: Eq + Hash,
{
    let in_a: HashSet<&T> = a.iter().collect();
    b.iter().all(|element| in_a.contains(element))
}

/// Returns `true` if at least one element of `b` occurs in `a`.
///
/// An empty `b` never matches.
///
/// # Examples
///
/// ```rust
/// use collection::slice::contains_any;
///
/// assert!(contains_any(&[1, 2, 3], &[5, 3]));
/// assert!(!contains_any(&[1, 2, 3], &[]));
/// ```
pub fn contains_any<T>(a: &[T], b: &[T]) -> bool
where
    T: Eq + Hash,
{
    if b.is_empty() {
        return false;
    }
    let in_a: HashSet<&T> = a.iter().collect();
    b.iter().any(|element| in_a.contains(element))
}

/// Returns `true` if both slices hold the same elements in the same order.
pub fn equal<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a == b
}

/// Compares two strings lexicographically by their bytes.
///
/// # Examples
///
/// ```rust
/// use collection::slice::compare;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare("a", "b"), Ordering::Less);
/// assert_eq!(compare(String::from("b"), "b"), Ordering::Equal);
/// ```
pub fn compare<A, B>(a: A, b: B) -> Ordering
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    a.as_ref().cmp(b.as_ref())
}

// =============================================================================
// Iteration
// =============================================================================

/// Calls `function` for every element in order.
///
/// `ctx` is checked before every element; a cancelled context ends the
/// iteration with its cause.
///
/// # Errors
///
/// Returns the first error produced by `function`, or the cancellation cause
/// converted into `E`.
pub fn each<T, E, F>(ctx: &Context, list: &[T], mut function: F) -> Result<(), E>
where
    E: From<ContextError>,
    F: FnMut(&Context, &T) -> Result<(), E>,
{
    for element in list {
        if let Some(cause) = ctx.err() {
            return Err(cause.into());
        }
        function(ctx, element)?;
    }
    Ok(())
}
