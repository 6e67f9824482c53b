//! Thread-safe set keyed by native identity.
//!
//! [`Set`] stores elements in a hash set guarded by a single mutex.
//!
//! - O(1) average `add`, `remove` and `contains`
//! - O(n) `to_vec`, `clone`, `without` and `strings`
//!
//! Iteration order is unspecified.
//!
//! # Examples
//!
//! ```rust
//! use collection::set::Set;
//!
//! let set = Set::from([1, 2, 3]);
//! set.add(3);
//! set.remove(&1);
//!
//! assert_eq!(set.len(), 2);
//! assert!(set.contains(&2));
//! assert!(!set.contains(&1));
//! assert_eq!(set.to_string(), "Set[2, 3]");
//! ```

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use parking_lot::{Mutex, MutexGuard};

use super::{ConcurrentSet, DefaultBuildHasher, format_set, sorted_strings};
use crate::context::{Context, ContextError};

type Storage<T> = HashSet<T, DefaultBuildHasher>;

// =============================================================================
// Set Definition
// =============================================================================

/// A thread-safe set of unique elements identified by `Eq + Hash`.
///
/// All operations take `&self`; share the set between threads behind an
/// `Arc`.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `add`          | O(1)       |
/// | `remove`       | O(1)       |
/// | `contains`     | O(1)       |
/// | `len`          | O(1)       |
/// | `to_vec`       | O(n)       |
/// | `without`      | O(n)       |
/// | `strings`      | O(n log n) |
pub struct Set<T> {
    data: Mutex<Storage<T>>,
}

impl<T> Set<T> {
    /// Creates an empty set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::set::Set;
    ///
    /// let set: Set<i32> = Set::new();
    /// assert!(set.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Storage::default()),
        }
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, Storage<T>> {
        self.data.lock()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the set holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes every element.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl<T: Eq + Hash> Set<T> {
    /// Adds an element. Adding an element already present is a no-op.
    pub fn add(&self, element: T) {
        self.lock().insert(element);
    }

    /// Adds every element while holding the lock once.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::set::Set;
    ///
    /// let set = Set::new();
    /// set.add_all([1, 2, 2, 3]);
    /// assert_eq!(set.len(), 3);
    /// ```
    pub fn add_all<I>(&self, elements: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.lock().extend(elements);
    }

    /// Removes an element. Removing an absent element is a no-op.
    pub fn remove(&self, element: &T) {
        self.lock().remove(element);
    }

    /// Removes every given element while holding the lock once.
    pub fn remove_all<'a, I>(&self, elements: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut data = self.lock();
        for element in elements {
            data.remove(element);
        }
    }

    /// Returns `true` if the element is present.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        self.lock().contains(element)
    }

    /// Returns `true` if every given element is present.
    ///
    /// An empty argument is vacuously contained.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::set::Set;
    ///
    /// let set = Set::from([1, 2]);
    /// assert!(set.contains_all(&[1, 2]));
    /// assert!(!set.contains_all(&[1, 3]));
    /// assert!(set.contains_all(&[]));
    /// ```
    #[must_use]
    pub fn contains_all<'a, I>(&self, elements: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let data = self.lock();
        elements.into_iter().all(|element| data.contains(element))
    }

    /// Returns `true` if at least one given element is present.
    ///
    /// An empty argument never matches.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::set::Set;
    ///
    /// let set = Set::from([1, 2]);
    /// assert!(set.contains_any(&[3, 2]));
    /// assert!(!set.contains_any(&[3]));
    /// assert!(!set.contains_any(&[]));
    /// ```
    #[must_use]
    pub fn contains_any<'a, I>(&self, elements: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let data = self.lock();
        elements.into_iter().any(|element| data.contains(element))
    }

    /// Replaces the whole content with `elements`.
    ///
    /// Duplicates in `elements` collapse. This is how decoded content is
    /// installed into a set that is already shared.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::set::Set;
    ///
    /// let set = Set::from([1, 2, 3]);
    /// set.replace([4, 5, 4]);
    /// assert_eq!(set, Set::from([4, 5]));
    /// ```
    pub fn replace<I>(&self, elements: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut fresh = Storage::default();
        fresh.extend(elements);
        *self.lock() = fresh;
    }
}

impl<T: Eq + Hash + Clone> Set<T> {
    /// Returns a copy of the elements in arbitrary order.
    ///
    /// Mutating the returned vector never affects the set.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.lock().iter().cloned().collect()
    }

    /// Returns a new set holding every element except the given ones.
    ///
    /// The receiver is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::set::Set;
    ///
    /// let set = Set::from(["a", "b", "c"]);
    /// let without = set.without(&["b"]);
    ///
    /// assert_eq!(without, Set::from(["a", "c"]));
    /// assert_eq!(set.len(), 3);
    /// ```
    #[must_use]
    pub fn without<'a, I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut copy = self.lock().clone();
        for element in elements {
            copy.remove(element);
        }
        Self {
            data: Mutex::new(copy),
        }
    }

    /// Calls `function` once per element, stopping at the first error.
    ///
    /// The elements are snapshotted first, so `function` runs without the
    /// lock held and may use the set itself. `ctx` is checked before every
    /// element; a cancelled context ends the iteration with its cause.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `function`, or the cancellation
    /// cause converted into `E`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::context::{Context, ContextError};
    /// use collection::set::Set;
    ///
    /// let set = Set::from([1, 2, 3]);
    /// let mut sum = 0;
    /// let result: Result<(), ContextError> = set.each(&Context::background(), |element| {
    ///     sum += element;
    ///     Ok(())
    /// });
    ///
    /// assert!(result.is_ok());
    /// assert_eq!(sum, 6);
    /// ```
    pub fn each<E, F>(&self, ctx: &Context, mut function: F) -> Result<(), E>
    where
        E: From<ContextError>,
        F: FnMut(&T) -> Result<(), E>,
    {
        for element in &self.to_vec() {
            if let Some(cause) = ctx.err() {
                return Err(cause.into());
            }
            function(element)?;
        }
        Ok(())
    }
}

impl<T: fmt::Display> Set<T> {
    /// Returns every element rendered through `Display`, sorted.
    ///
    /// The sorted order makes the output deterministic, which is what
    /// [`Display`](fmt::Display) for the set relies on.
    #[must_use]
    pub fn strings(&self) -> Vec<String> {
        sorted_strings(self.lock().iter())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T: Eq + Hash + Clone> ConcurrentSet<T> for Set<T> {
    fn insert_many(&self, elements: Vec<T>) {
        self.add_all(elements);
    }

    fn remove_many(&self, elements: &[T]) {
        self.remove_all(elements);
    }

    fn has(&self, element: &T) -> bool {
        self.contains(element)
    }

    fn has_all(&self, elements: &[T]) -> bool {
        self.contains_all(elements)
    }

    fn has_any(&self, elements: &[T]) -> bool {
        self.contains_any(elements)
    }

    fn snapshot(&self) -> Vec<T> {
        self.to_vec()
    }

    fn size(&self) -> usize {
        self.len()
    }
}

impl<T> Default for Set<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Set<T> {
    fn clone(&self) -> Self {
        Self {
            data: Mutex::new(self.data.lock().clone()),
        }
    }
}

impl<T: Eq + Hash + Clone> PartialEq for Set<T> {
    fn eq(&self, other: &Self) -> bool {
        // One lock at a time: two sets have no lock order.
        let other_data = other.lock().clone();
        let data = self.lock();
        data.len() == other_data.len() && data.iter().all(|element| other_data.contains(element))
    }
}

impl<T: Eq + Hash + Clone> Eq for Set<T> {}

impl<T: fmt::Debug> fmt::Debug for Set<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.lock().iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for Set<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_set(formatter, "Set", &self.strings())
    }
}

impl<T: Eq + Hash> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let set = Self::new();
        set.add_all(iter);
        set
    }
}

impl<T: Eq + Hash, const N: usize> From<[T; N]> for Set<T> {
    fn from(elements: [T; N]) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: Eq + Hash> From<Vec<T>> for Set<T> {
    fn from(elements: Vec<T>) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: Eq + Hash> Extend<T> for Set<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.data.get_mut().extend(iter);
    }
}

impl<T> IntoIterator for Set<T> {
    type Item = T;
    type IntoIter = std::collections::hash_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_inner().into_iter()
    }
}

static_assertions::assert_impl_all!(Set<i32>: Send, Sync);
static_assertions::assert_impl_all!(Set<String>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize + Eq + Hash + Clone> serde::Serialize for Set<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let elements = self.to_vec();
        let mut seq = serializer.serialize_seq(Some(elements.len()))?;
        for element in &elements {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct SetVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for SetVisitor<T>
where
    T: serde::Deserialize<'de> + Eq + Hash,
{
    type Value = Set<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut data = Storage::default();
        while let Some(element) = seq.next_element()? {
            data.insert(element);
        }
        Ok(Set {
            data: Mutex::new(data),
        })
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Set<T>
where
    T: serde::Deserialize<'de> + Eq + Hash,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(SetVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![], 0)]
    #[case(vec![1], 1)]
    #[case(vec![1, 2, 3], 3)]
    #[case(vec![1, 1, 2, 2, 3], 3)]
    fn test_length_counts_distinct_elements(#[case] elements: Vec<i32>, #[case] expected: usize) {
        assert_eq!(Set::from(elements).len(), expected);
    }

    #[rstest]
    fn test_remove_absent_element_is_noop() {
        let set = Set::from([1, 2]);
        set.remove(&3);
        assert_eq!(set.len(), 2);
    }

    #[rstest]
    fn test_to_vec_is_defensive_copy() {
        let set = Set::from([1, 2]);
        let mut copy = set.to_vec();
        copy.push(3);
        copy.clear();
        assert_eq!(set.len(), 2);
    }

    #[rstest]
    #[case(Set::new(), "Set[]")]
    #[case(Set::from(["x"]), "Set[x]")]
    #[case(Set::from(["c", "a", "b"]), "Set[a, b, c]")]
    fn test_display(#[case] set: Set<&str>, #[case] expected: &str) {
        assert_eq!(set.to_string(), expected);
    }

    #[rstest]
    fn test_clone_is_independent() {
        let original = Set::from(["a", "b"]);
        let clone = original.clone();

        clone.add("c");
        original.remove(&"a");

        assert_eq!(clone.len(), 3);
        assert_eq!(original.len(), 1);
    }

    #[rstest]
    fn test_each_sees_snapshot_and_may_mutate_set() {
        let set = Set::from([1, 2, 3]);
        let result: Result<(), ContextError> = set.each(&Context::background(), |element| {
            set.add(element + 10);
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(set.len(), 6);
    }

    #[rstest]
    fn test_each_stops_on_cancelled_context() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let mut calls = 0;

        let result: Result<(), ContextError> = Set::from([1, 2]).each(&ctx, |_| {
            calls += 1;
            Ok(())
        });

        assert_eq!(result, Err(ContextError::Canceled));
        assert_eq!(calls, 0);
    }

    #[rstest]
    fn test_equality_with_itself_does_not_deadlock() {
        let set = Set::from([1, 2]);
        assert_eq!(set, set);
    }

    #[rstest]
    fn test_extend_and_into_iter() {
        let mut set = Set::from([1]);
        set.extend([2, 3, 1]);

        let mut elements: Vec<i32> = set.into_iter().collect();
        elements.sort_unstable();

        assert_eq!(elements, vec![1, 2, 3]);
    }
}
