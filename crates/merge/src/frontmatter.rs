//! Ordered frontmatter model
//!
//! Frontmatter is a small key/value map at the top of a post. Key order is
//! user-visible (it round-trips through serialization), so the map keeps
//! insertion order instead of sorting.

use serde::{Deserialize, Serialize};

/// Keys the engine understands and normalizes
pub const RECOGNIZED_KEYS: [&str; 6] = [
    "title",
    "author",
    "created_at",
    "modified_at",
    "draft",
    "labels",
];

/// Keys whose both-sides-changed disagreement is reported as a field conflict
///
/// `labels` is absent: label edits merge as set deltas. `modified_at` is
/// absent: it is stripped before merging.
pub const CONFLICT_TRACKED_KEYS: [&str; 4] = ["title", "author", "created_at", "draft"];

/// A frontmatter value: a plain scalar or a list of strings
///
/// Everything that is not a `labels`-style inline list is kept as an opaque
/// scalar string. The merge compares values for equality only, so scalar
/// typing (dates, booleans) is left to the consumers that care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Opaque scalar text, stored exactly as written
    Scalar(String),
    /// An inline list such as `labels: [a, b]`
    List(Vec<String>),
}

impl Value {
    /// Build a scalar value
    pub fn scalar(text: impl Into<String>) -> Self {
        Value::Scalar(text.into())
    }

    /// Build a list value
    pub fn list(items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// The list items, treating a scalar as a single-item list
    pub fn as_items(&self) -> Vec<String> {
        match self {
            Value::Scalar(s) => {
                if s.is_empty() {
                    Vec::new()
                } else {
                    vec![s.clone()]
                }
            }
            Value::List(items) => items.clone(),
        }
    }
}

/// An insertion-ordered frontmatter map
///
/// Lookups are linear. Frontmatter maps hold a handful of keys, so a `Vec`
/// beats a hash map here and keeps ordering trivial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontmatterMap {
    entries: Vec<(String, Value)>,
}

impl FrontmatterMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// True when `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a value, preserving the key's original position
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Remove a key, returning its value if it was present
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, Value)> for FrontmatterMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}
