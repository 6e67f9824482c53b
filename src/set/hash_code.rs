//! Thread-safe set keyed by a user string hash code.
//!
//! [`SetHashCode`] maps [`HasHashCode::hash_code`] to the element that
//! produced it. Operations are O(1) on average.
//!
//! # Collisions
//!
//! Two distinct elements reporting the same hash code are the same element
//! as far as the set is concerned: the one added last replaces the other
//! silently. Callers that prefer to fail on such a collision can use
//! [`SetHashCode::try_add`].

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use parking_lot::{Mutex, MutexGuard};

use super::{ConcurrentSet, DefaultBuildHasher, format_set, sorted_strings};
use crate::context::{Context, ContextError};

type Storage<T> = HashMap<String, T, DefaultBuildHasher>;

/// A stable string identity used by [`SetHashCode`].
///
/// Equal elements must report equal codes; distinct elements reporting the
/// same code overwrite each other in the set.
pub trait HasHashCode {
    /// Returns the identity of `self`.
    fn hash_code(&self) -> String;
}

// =============================================================================
// HashCollisionError
// =============================================================================

/// Returned by [`SetHashCode::try_add`] when a different element already
/// holds the same hash code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashCollisionError {
    /// The hash code both elements reported.
    pub hash_code: String,
}

impl fmt::Display for HashCollisionError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "hash code collision: a different element already uses {:?}",
            self.hash_code
        )
    }
}

impl Error for HashCollisionError {}

// =============================================================================
// SetHashCode Definition
// =============================================================================

/// A thread-safe set whose identity is [`HasHashCode::hash_code`].
///
/// # Examples
///
/// ```rust
/// use collection::set::{HasHashCode, SetHashCode};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct User {
///     email: String,
///     name: String,
/// }
///
/// impl HasHashCode for User {
///     fn hash_code(&self) -> String {
///         self.email.to_lowercase()
///     }
/// }
///
/// let set = SetHashCode::new();
/// set.add(User { email: "a@example.com".into(), name: "Alice".into() });
/// set.add(User { email: "A@example.com".into(), name: "Alicia".into() });
///
/// // Last write wins.
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.to_vec()[0].name, "Alicia");
/// ```
pub struct SetHashCode<T> {
    data: Mutex<Storage<T>>,
}

impl<T> SetHashCode<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Storage::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Storage<T>> {
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

impl<T: HasHashCode> SetHashCode<T> {
    /// Adds an element, replacing any element with the same hash code.
    pub fn add(&self, element: T) {
        let code = element.hash_code();
        self.lock().insert(code, element);
    }

    /// Adds every element while holding the lock once.
    ///
    /// Hash codes are computed before the lock is taken.
    pub fn add_all<I>(&self, elements: I)
    where
        I: IntoIterator<Item = T>,
    {
        let keyed: Vec<(String, T)> = elements
            .into_iter()
            .map(|element| (element.hash_code(), element))
            .collect();
        self.lock().extend(keyed);
    }

    /// Removes the element with the same hash code, if any.
    pub fn remove(&self, element: &T) {
        let code = element.hash_code();
        self.lock().remove(&code);
    }

    /// Removes every element sharing a hash code with one of `elements`.
    pub fn remove_all<'a, I>(&self, elements: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let codes = hash_codes(elements);
        let mut data = self.lock();
        for code in &codes {
            data.remove(code);
        }
    }

    /// Returns `true` if an element with the same hash code is stored.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        let code = element.hash_code();
        self.lock().contains_key(&code)
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
        let codes = hash_codes(elements);
        let data = self.lock();
        codes.iter().all(|code| data.contains_key(code))
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
        let codes = hash_codes(elements);
        let data = self.lock();
        codes.iter().any(|code| data.contains_key(code))
    }

    /// Replaces the whole content with `elements`, last write winning.
    pub fn replace<I>(&self, elements: I)
    where
        I: IntoIterator<Item = T>,
    {
        let fresh: Storage<T> = elements
            .into_iter()
            .map(|element| (element.hash_code(), element))
            .collect();
        *self.lock() = fresh;
    }
}

fn hash_codes<'a, T, I>(elements: I) -> Vec<String>
where
    T: HasHashCode + 'a,
    I: IntoIterator<Item = &'a T>,
{
    elements.into_iter().map(HasHashCode::hash_code).collect()
}

impl<T: HasHashCode + PartialEq> SetHashCode<T> {
    /// Adds an element unless a *different* element holds its hash code.
    ///
    /// Re-adding an element equal to the stored one is accepted and keeps
    /// the set unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`HashCollisionError`] when the stored element with the same
    /// hash code is not equal to `element`; the set is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::set::{HasHashCode, SetHashCode};
    ///
    /// #[derive(Debug, PartialEq)]
    /// struct Word(&'static str);
    ///
    /// impl HasHashCode for Word {
    ///     fn hash_code(&self) -> String {
    ///         self.0.len().to_string()
    ///     }
    /// }
    ///
    /// let set = SetHashCode::new();
    /// assert!(set.try_add(Word("cat")).is_ok());
    /// assert!(set.try_add(Word("cat")).is_ok());
    /// assert!(set.try_add(Word("dog")).is_err());
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn try_add(&self, element: T) -> Result<(), HashCollisionError> {
        let code = element.hash_code();
        let mut data = self.lock();
        match data.get(&code) {
            Some(stored) if *stored != element => Err(HashCollisionError { hash_code: code }),
            Some(_) => Ok(()),
            None => {
                data.insert(code, element);
                Ok(())
            }
        }
    }
}

impl<T: HasHashCode + Clone> SetHashCode<T> {
    /// Returns a copy of the elements in arbitrary order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.lock().values().cloned().collect()
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
        let codes = hash_codes(elements);
        let mut copy = self.lock().clone();
        for code in &codes {
            copy.remove(code);
        }
        Self {
            data: Mutex::new(copy),
        }
    }

    /// Calls `function` once per element, stopping at the first error.
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

impl<T: fmt::Display> SetHashCode<T> {
    /// Returns every element rendered through `Display`, sorted.
    #[must_use]
    pub fn strings(&self) -> Vec<String> {
        sorted_strings(self.lock().values())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T: HasHashCode + Clone> ConcurrentSet<T> for SetHashCode<T> {
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

impl<T> Default for SetHashCode<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for SetHashCode<T> {
    fn clone(&self) -> Self {
        Self {
            data: Mutex::new(self.data.lock().clone()),
        }
    }
}

impl<T> PartialEq for SetHashCode<T> {
    /// Two sets are equal when they hold the same hash codes.
    fn eq(&self, other: &Self) -> bool {
        let other_codes: Vec<String> = other.lock().keys().cloned().collect();
        let data = self.lock();
        data.len() == other_codes.len() && other_codes.iter().all(|code| data.contains_key(code))
    }
}

impl<T: fmt::Debug> fmt::Debug for SetHashCode<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.lock().values()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for SetHashCode<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_set(formatter, "SetHashCode", &self.strings())
    }
}

impl<T: HasHashCode> FromIterator<T> for SetHashCode<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let set = Self::new();
        set.add_all(iter);
        set
    }
}

impl<T: HasHashCode, const N: usize> From<[T; N]> for SetHashCode<T> {
    fn from(elements: [T; N]) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: HasHashCode> From<Vec<T>> for SetHashCode<T> {
    fn from(elements: Vec<T>) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: HasHashCode> Extend<T> for SetHashCode<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.data
            .get_mut()
            .extend(iter.into_iter().map(|element| (element.hash_code(), element)));
    }
}

impl<T> IntoIterator for SetHashCode<T> {
    type Item = T;
    type IntoIter = std::collections::hash_map::IntoValues<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_inner().into_values()
    }
}

static_assertions::assert_impl_all!(SetHashCode<String>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize + HasHashCode + Clone> serde::Serialize for SetHashCode<T> {
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
struct SetHashCodeVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for SetHashCodeVisitor<T>
where
    T: serde::Deserialize<'de> + HasHashCode,
{
    type Value = SetHashCode<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut data = Storage::default();
        while let Some(element) = seq.next_element::<T>()? {
            data.insert(element.hash_code(), element);
        }
        Ok(SetHashCode {
            data: Mutex::new(data),
        })
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for SetHashCode<T>
where
    T: serde::Deserialize<'de> + HasHashCode,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(SetHashCodeVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
