use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::computations::AggregateTask;
use super::partition::{combo_partition, ComboPartition};
use crate::error::{Error, Result};

/// Maximum number of dimensions a [`Key`] may carry.
pub const MAX_DIMS: usize = 32;

/// A hashable key for a quantity that includes its dimensionality.
///
/// Quantities in a scenario can be indexed by one or more dimensions. A
/// report may use quantity `foo` indexed by `a`, `b` and `c`:
///
/// 1. in its full resolution, i.e. indexed by a, b, and c;
/// 2. aggregated over any one dimension, e.g. over c and thus indexed by a
///    and b;
/// 3. aggregated over any two dimensions; etc.
///
/// The key for (1) displays, hashes and compares as `foo:a-b-c`; the key
/// for (2) is `foo:a-b`, and so forth.
///
/// ```
/// use scenario_report::Key;
///
/// let key: Key = "foo:a-b".parse().unwrap();
/// assert_eq!(key, Key::new("foo", ["a", "b"]).unwrap());
/// assert!(key.matches("foo:a-b"));
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    name: String,
    dims: Vec<String>,
    repr: String,
}

impl Key {
    /// Create a key. The name must be non-empty and contain no `:`; dimension
    /// names must be non-empty, unique, and contain neither `:` nor `-`.
    pub fn new<I, S>(name: impl Into<String>, dims: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();

        if name.is_empty() {
            return Err(Error::InvalidKey("empty quantity name".into()));
        }
        if name.contains(':') {
            return Err(Error::InvalidKey(format!("name {name:?} contains ':'")));
        }
        if dims.len() > MAX_DIMS {
            return Err(Error::InvalidKey(format!(
                "{} dimensions, at most {MAX_DIMS} allowed",
                dims.len()
            )));
        }
        for (i, dim) in dims.iter().enumerate() {
            if dim.is_empty() {
                return Err(Error::InvalidKey(format!("empty dimension in '{name}'")));
            }
            if dim.contains(':') || dim.contains('-') {
                return Err(Error::InvalidKey(format!(
                    "dimension {dim:?} contains ':' or '-'"
                )));
            }
            if dims[..i].contains(dim) {
                return Err(Error::InvalidKey(format!("dimension {dim:?} repeated")));
            }
        }

        Ok(Self::from_parts(name, dims))
    }

    /// A key with no dimensions.
    pub fn scalar(name: impl Into<String>) -> Result<Self> {
        Self::new(name, std::iter::empty::<String>())
    }

    // Callers guarantee the parts are valid.
    fn from_parts(name: String, dims: Vec<String>) -> Self {
        let repr = format!("{}:{}", name, dims.join("-"));
        Key { name, dims, repr }
    }

    /// Copy `value` if it is already a key, otherwise parse it.
    pub fn from_str_or_key<'a>(value: impl Into<KeyLike<'a>>) -> Result<Self> {
        match value.into() {
            KeyLike::Key(key) => Ok(key.clone()),
            KeyLike::Str(s) => s.parse(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// The canonical form, e.g. `name:dim1-dim2-dim3`.
    pub fn as_str(&self) -> &str {
        &self.repr
    }

    /// Whether `other` is this key's canonical form.
    pub fn matches(&self, other: &str) -> bool {
        self.repr == other
    }

    /// Yield `(key, task)` for all possible aggregations of the key.
    ///
    /// Each derived key keeps a subset of the dimensions; its task sums the
    /// quantity of `self` over the others. The full-resolution key itself is
    /// not yielded.
    pub fn aggregates(&self) -> Aggregates<'_> {
        Aggregates {
            source: self,
            partitions: combo_partition(&self.dims),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.repr == other.repr
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.repr.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.repr.cmp(&other.repr)
    }
}

// Eq, Hash and Ord all go through `repr`, so lookups by `&str` agree.
impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.repr
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, dims) = s.split_once(':').ok_or_else(|| Error::KeyParse(s.to_string()))?;
        if dims.is_empty() {
            Key::new(name, std::iter::empty::<String>())
        } else {
            Key::new(name, dims.split('-'))
        }
    }
}

impl TryFrom<&str> for Key {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for Key {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.repr
    }
}

/// Either a [`Key`] or its canonical string; see [`Key::from_str_or_key`].
#[derive(Debug, Clone, Copy)]
pub enum KeyLike<'a> {
    Key(&'a Key),
    Str(&'a str),
}

impl<'a> From<&'a Key> for KeyLike<'a> {
    fn from(key: &'a Key) -> Self {
        KeyLike::Key(key)
    }
}

impl<'a> From<&'a str> for KeyLike<'a> {
    fn from(s: &'a str) -> Self {
        KeyLike::Str(s)
    }
}

impl<'a> From<&'a String> for KeyLike<'a> {
    fn from(s: &'a String) -> Self {
        KeyLike::Str(s)
    }
}

/// Iterator returned by [`Key::aggregates`].
#[derive(Debug, Clone)]
pub struct Aggregates<'a> {
    source: &'a Key,
    partitions: ComboPartition<'a, String>,
}

impl Iterator for Aggregates<'_> {
    type Item = (Key, AggregateTask);

    fn next(&mut self) -> Option<Self::Item> {
        let (kept, aggregated) = self.partitions.next()?;
        let key = Key::from_parts(self.source.name.clone(), kept);
        let task = AggregateTask::new(self.source.clone(), aggregated);
        Some((key, task))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.partitions.size_hint()
    }
}

impl ExactSizeIterator for Aggregates<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn key(name: &str, dims: &[&str]) -> Key {
        Key::new(name, dims.iter().copied()).unwrap()
    }

    #[test]
    fn canonical_form() {
        assert_eq!(key("foo", &["a", "b"]).to_string(), "foo:a-b");
        assert_eq!(key("x", &[]).as_str(), "x:");
        assert_eq!(format!("{:?}", key("foo", &["a"])), "foo:a");
    }

    #[test]
    fn parse() {
        let k: Key = "foo:a-b-c".parse().unwrap();
        assert_eq!(k.name(), "foo");
        assert_eq!(k.dims(), &["a", "b", "c"]);

        let scalar: Key = "x:".parse().unwrap();
        assert!(scalar.dims().is_empty());
        assert_eq!(scalar, key("x", &[]));

        // A '-' in the name survives because only the first ':' splits.
        let k: Key = "emission-factor:t".parse().unwrap();
        assert_eq!(k.name(), "emission-factor");
    }

    #[test]
    fn parse_failures() {
        assert!(matches!("foo".parse::<Key>(), Err(Error::KeyParse(_))));
        assert!(matches!("foo:a:b".parse::<Key>(), Err(Error::InvalidKey(_))));
        assert!(matches!("foo:a--b".parse::<Key>(), Err(Error::InvalidKey(_))));
        assert!(matches!(":a".parse::<Key>(), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn construction_is_validated() {
        assert!(Key::new("foo", ["a", "a"]).is_err());
        assert!(Key::new("foo", ["a-b"]).is_err());
        assert!(Key::new("fo:o", ["a"]).is_err());
        assert!(Key::new("foo", [""]).is_err());
        let many: Vec<String> = (0..=MAX_DIMS).map(|i| format!("d{i}")).collect();
        assert!(Key::new("foo", many).is_err());
    }

    #[test]
    fn dimension_order_matters() {
        assert_ne!(key("foo", &["a", "b"]), key("foo", &["b", "a"]));
    }

    #[test]
    fn from_str_or_key_copies() {
        let original = key("foo", &["a", "b"]);
        let copy = Key::from_str_or_key(&original).unwrap();
        assert_eq!(copy, original);
        assert!(!std::ptr::eq(copy.dims().as_ptr(), original.dims().as_ptr()));

        let parsed = Key::from_str_or_key("foo:a-b").unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn string_lookup_in_hash_map() {
        let mut map = HashMap::new();
        map.insert(key("foo", &["a", "b"]), 1);
        assert_eq!(map.get("foo:a-b"), Some(&1));
        assert_eq!(map.get("foo:b-a"), None);
    }

    #[test]
    fn serde_uses_canonical_string() {
        let k = key("foo", &["a", "b"]);
        let json = serde_json::to_string(&k).unwrap();
        assert_eq!(json, "\"foo:a-b\"");
        let back: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(back, k);
        assert!(serde_json::from_str::<Key>("\"nocolon\"").is_err());
    }

    #[test]
    fn scalar_key_has_no_aggregates() {
        let scalar = Key::scalar("x").unwrap();
        assert_eq!(scalar, "x:".parse::<Key>().unwrap());
        assert!(scalar.dims().is_empty());
        assert_eq!(scalar.aggregates().count(), 0);
        assert!(Key::scalar("").is_err());
        assert!(Key::scalar("a:b").is_err());
    }

    #[test]
    fn aggregates_of_three_dims() {
        let source = key("foo", &["a", "b", "c"]);
        let aggs: Vec<_> = source.aggregates().collect();
        assert_eq!(aggs.len(), 7);

        let keys: Vec<String> = aggs.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(
            keys,
            vec!["foo:", "foo:c", "foo:b", "foo:b-c", "foo:a", "foo:a-c", "foo:a-b"]
        );

        for (k, task) in &aggs {
            assert_eq!(task.source(), &source);
            let mut all: Vec<&String> = k.dims().iter().chain(task.dimensions()).collect();
            all.sort();
            assert_eq!(all, vec!["a", "b", "c"]);
            assert!(!task.dimensions().is_empty());
        }
    }
}
