//! Thread-safe set keyed by a user equality predicate.
//!
//! [`SetEqual`] is meant for element types whose notion of "the same" is not
//! `Eq + Hash`, for instance a record compared by a subset of its fields.
//! Elements live in a vector scanned linearly under the lock:
//!
//! - O(n) `add`, `remove` and `contains`
//! - O(n²) to de-duplicate a batch
//!
//! Insertion order is kept; when several elements are equal the first one
//! stays.

use std::fmt;

use parking_lot::{Mutex, MutexGuard};

use super::{ConcurrentSet, format_set, sorted_strings};
use crate::context::{Context, ContextError};

/// Structural equality used by [`SetEqual`].
///
/// The predicate should be reflexive and symmetric; it may be looser than
/// `PartialEq`.
///
/// # Examples
///
/// ```rust
/// use collection::set::HasEqual;
///
/// struct User {
///     id: u32,
///     name: String,
/// }
///
/// impl HasEqual for User {
///     fn equal(&self, other: &Self) -> bool {
///         self.id == other.id
///     }
/// }
///
/// let left = User { id: 1, name: "Alice".to_string() };
/// let right = User { id: 1, name: "Alicia".to_string() };
/// assert!(left.equal(&right));
/// ```
pub trait HasEqual {
    /// Returns `true` if `self` and `other` denote the same element.
    fn equal(&self, other: &Self) -> bool;
}

/// A thread-safe set whose identity is [`HasEqual::equal`].
///
/// # Examples
///
/// ```rust
/// use collection::set::{HasEqual, SetEqual};
///
/// #[derive(Debug, Clone)]
/// struct Tag(String);
///
/// impl HasEqual for Tag {
///     fn equal(&self, other: &Self) -> bool {
///         self.0.eq_ignore_ascii_case(&other.0)
///     }
/// }
///
/// let set = SetEqual::new();
/// set.add_all([Tag("Rust".into()), Tag("rust".into()), Tag("Go".into())]);
///
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.to_vec()[0].0, "Rust");
/// ```
pub struct SetEqual<T> {
    data: Mutex<Vec<T>>,
}

fn position<T: HasEqual>(data: &[T], element: &T) -> Option<usize> {
    data.iter().position(|stored| stored.equal(element))
}

fn push_unique<T: HasEqual>(data: &mut Vec<T>, element: T) {
    if position(data, &element).is_none() {
        data.push(element);
    }
}

impl<T> SetEqual<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
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

impl<T: HasEqual> SetEqual<T> {
    /// Adds an element unless an equal one is already stored.
    pub fn add(&self, element: T) {
        push_unique(&mut self.lock(), element);
    }

    /// Adds every element while holding the lock once.
    ///
    /// Earlier elements win over later equal ones, including equal elements
    /// inside the batch itself.
    pub fn add_all<I>(&self, elements: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut data = self.lock();
        for element in elements {
            push_unique(&mut data, element);
        }
    }

    /// Removes every stored element equal to `element`.
    pub fn remove(&self, element: &T) {
        self.lock().retain(|stored| !stored.equal(element));
    }

    /// Removes every stored element equal to one of `elements`, holding the
    /// lock once.
    pub fn remove_all<'a, I>(&self, elements: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let elements: Vec<&T> = elements.into_iter().collect();
        self.lock()
            .retain(|stored| !elements.iter().any(|element| stored.equal(element)));
    }

    /// Returns `true` if an equal element is stored.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        position(&self.lock(), element).is_some()
    }

    /// Returns `true` if every given element is stored.
    ///
    /// An empty argument is vacuously contained.
    #[must_use]
    pub fn contains_all<'a, I>(&self, elements: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let data = self.lock();
        elements
            .into_iter()
            .all(|element| position(&data, element).is_some())
    }

    /// Returns `true` if at least one given element is stored.
    ///
    /// An empty argument never matches.
    #[must_use]
    pub fn contains_any<'a, I>(&self, elements: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let data = self.lock();
        elements
            .into_iter()
            .any(|element| position(&data, element).is_some())
    }

    /// Replaces the whole content with `elements`, first occurrence winning.
    pub fn replace<I>(&self, elements: I)
    where
        I: IntoIterator<Item = T>,
    {
        let fresh = unique(elements);
        *self.lock() = fresh;
    }
}

fn unique<T: HasEqual, I: IntoIterator<Item = T>>(elements: I) -> Vec<T> {
    let mut data = Vec::new();
    for element in elements {
        push_unique(&mut data, element);
    }
    data
}

impl<T: HasEqual + Clone> SetEqual<T> {
    /// Returns a copy of the elements in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.lock().clone()
    }

    /// Returns a new set holding every element except the given ones.
    ///
    /// The receiver is left untouched.
    #[must_use]
    pub fn without<'a, I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let copy = Self {
            data: Mutex::new(self.to_vec()),
        };
        copy.remove_all(elements);
        copy
    }

    /// Calls `function` once per element in insertion order, stopping at the
    /// first error.
    ///
    /// Runs over a snapshot without holding the lock; `ctx` is checked before
    /// every element.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `function`, or the cancellation
    /// cause converted into `E`.
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

impl<T: fmt::Display> SetEqual<T> {
    /// Returns every element rendered through `Display`, sorted.
    #[must_use]
    pub fn strings(&self) -> Vec<String> {
        sorted_strings(self.lock().iter())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T: HasEqual + Clone> ConcurrentSet<T> for SetEqual<T> {
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

impl<T> Default for SetEqual<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for SetEqual<T> {
    fn clone(&self) -> Self {
        Self {
            data: Mutex::new(self.data.lock().clone()),
        }
    }
}

impl<T: HasEqual + Clone> PartialEq for SetEqual<T> {
    /// Two sets are equal when they hold the same elements under
    /// [`HasEqual::equal`], regardless of order.
    fn eq(&self, other: &Self) -> bool {
        let other_data = other.to_vec();
        let data = self.lock();
        data.len() == other_data.len()
            && data
                .iter()
                .all(|element| position(&other_data, element).is_some())
    }
}

impl<T: fmt::Debug> fmt::Debug for SetEqual<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.lock().iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for SetEqual<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_set(formatter, "SetEqual", &self.strings())
    }
}

impl<T: HasEqual> FromIterator<T> for SetEqual<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: Mutex::new(unique(iter)),
        }
    }
}

impl<T: HasEqual, const N: usize> From<[T; N]> for SetEqual<T> {
    fn from(elements: [T; N]) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: HasEqual> From<Vec<T>> for SetEqual<T> {
    fn from(elements: Vec<T>) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: HasEqual> Extend<T> for SetEqual<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let data = self.data.get_mut();
        for element in iter {
            push_unique(data, element);
        }
    }
}

impl<T> IntoIterator for SetEqual<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_inner().into_iter()
    }
}

static_assertions::assert_impl_all!(SetEqual<String>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize + HasEqual + Clone> serde::Serialize for SetEqual<T> {
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
struct SetEqualVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for SetEqualVisitor<T>
where
    T: serde::Deserialize<'de> + HasEqual,
{
    type Value = SetEqual<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut data = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(element) = seq.next_element()? {
            push_unique(&mut data, element);
        }
        Ok(SetEqual {
            data: Mutex::new(data),
        })
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for SetEqual<T>
where
    T: serde::Deserialize<'de> + HasEqual,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(SetEqualVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
