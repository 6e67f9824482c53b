//! Comma-separated text codec for string-derived [`Set`]s.
//!
//! Decoding splits on `,`, trims surrounding whitespace from every token and
//! drops empty tokens, so `" a, b ,,c,"` holds `a`, `b` and `c`. Encoding
//! joins the sorted elements with `,` and never quotes or escapes them;
//! elements must not contain commas to survive a round trip.
//!
//! Any element type that converts from `String` (and, for encoding, exposes
//! itself as `&str`) works, including newtypes:
//!
//! ```rust
//! use collection::set::Set;
//!
//! #[derive(Debug, Clone, PartialEq, Eq, Hash)]
//! struct Region(String);
//!
//! impl From<String> for Region {
//!     fn from(value: String) -> Self {
//!         Self(value)
//!     }
//! }
//!
//! impl AsRef<str> for Region {
//!     fn as_ref(&self) -> &str {
//!         &self.0
//!     }
//! }
//!
//! let regions: Set<Region> = "eu-west, us-east,".parse().unwrap();
//! assert_eq!(regions.len(), 2);
//! assert_eq!(regions.marshal_text(), "eu-west,us-east");
//! ```

use std::convert::Infallible;
use std::hash::Hash;
use std::str::FromStr;

use super::Set;

const SEPARATOR: &str = ",";

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<T> Set<T>
where
    T: Eq + Hash + AsRef<str>,
{
    /// Encodes the set as comma-separated text, elements sorted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::set::Set;
    ///
    /// let set = Set::from(["b".to_string(), "a".to_string()]);
    /// assert_eq!(set.marshal_text(), "a,b");
    /// assert_eq!(Set::<String>::new().marshal_text(), "");
    /// ```
    #[must_use]
    pub fn marshal_text(&self) -> String {
        let mut values: Vec<String> = self
            .lock()
            .iter()
            .map(|element| element.as_ref().to_owned())
            .collect();
        values.sort_unstable();
        values.join(SEPARATOR)
    }
}

impl<T> Set<T>
where
    T: Eq + Hash + From<String>,
{
    /// Replaces the content with the elements parsed from `text`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collection::set::Set;
    ///
    /// let set = Set::from(["old".to_string()]);
    /// set.unmarshal_text(" new1 ,new2,,new1");
    ///
    /// assert_eq!(set, Set::from(["new1".to_string(), "new2".to_string()]));
    /// ```
    pub fn unmarshal_text(&self, text: &str) {
        self.replace(tokens(text).map(|token| T::from(token.to_owned())));
    }
}

impl<T> FromStr for Set<T>
where
    T: Eq + Hash + From<String>,
{
    type Err = Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(parse_set_from_string(text))
    }
}

/// Builds a set from string values, trimming each one and dropping empty
/// values.
///
/// # Examples
///
/// ```rust
/// use collection::set::{Set, parse_set_from_strings};
///
/// let set: Set<String> = parse_set_from_strings(["a", " b ", "", "a"]);
/// assert_eq!(set.len(), 2);
/// ```
pub fn parse_set_from_strings<T, I, S>(values: I) -> Set<T>
where
    T: Eq + Hash + From<String>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter_map(|value| {
            let trimmed = value.as_ref().trim();
            (!trimmed.is_empty()).then(|| T::from(trimmed.to_owned()))
        })
        .collect()
}

/// Builds a set from comma-separated text.
///
/// # Examples
///
/// ```rust
/// use collection::set::{Set, parse_set_from_string};
///
/// let set: Set<String> = parse_set_from_string(" a , b , c ");
/// assert!(set.contains(&"b".to_string()));
/// assert_eq!(set.len(), 3);
/// ```
pub fn parse_set_from_string<T>(text: &str) -> Set<T>
where
    T: Eq + Hash + From<String>,
{
    parse_set_from_strings(tokens(text))
}
