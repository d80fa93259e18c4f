use super::Value;
use crate::Name;

use indexmap::IndexMap;
use std::hash::{BuildHasher, Hash, Hasher};

/// An ordered map from attribute name to value: one row of a dataset.
///
/// Equality ignores attribute order; iteration preserves insertion order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tuple {
    fields: IndexMap<Name, Value>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<Name>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Inserts `value` as the first attribute, replacing any existing value.
    pub fn insert_first(&mut self, name: impl Into<Name>, value: impl Into<Value>) {
        self.fields.shift_insert(0, name.into(), value.into());
    }

    /// Removes an attribute, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    /// Renames an attribute in place, keeping its position.
    pub fn rename(&mut self, from: &str, to: impl Into<Name>) {
        if let Some(index) = self.fields.get_index_of(from) {
            let value = self.fields.shift_remove_index(index).map(|(_, v)| v);
            if let Some(value) = value {
                self.fields.shift_insert(index, to.into(), value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Value)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.fields.keys()
    }

    /// Keeps only the attributes for which `f` returns `true`.
    pub fn retain(&mut self, mut f: impl FnMut(&Name, &Value) -> bool) {
        self.fields.retain(|name, value| f(name, value));
    }

    /// Returns `true` if every attribute of `filter` is present in `self` with
    /// an equal value. An empty filter matches every tuple.
    pub fn matches(&self, filter: &Tuple) -> bool {
        filter
            .iter()
            .all(|(name, expected)| self.get(name) == Some(expected))
    }

    /// Copies every attribute of `other` into `self`, overriding existing
    /// values.
    pub fn merge(&mut self, other: &Tuple) {
        for (name, value) in other.iter() {
            self.fields.insert(name.clone(), value.clone());
        }
    }
}

impl Hash for Tuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-insensitive, to agree with `PartialEq`.
        let build =
            std::hash::BuildHasherDefault::<std::collections::hash_map::DefaultHasher>::default();
        let mut combined = 0u64;
        for entry in &self.fields {
            combined = combined.wrapping_add(build.hash_one(entry));
        }
        self.fields.len().hash(state);
        combined.hash(state);
    }
}

impl FromIterator<(Name, Value)> for Tuple {
    fn from_iter<I: IntoIterator<Item = (Name, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Tuple {
    type Item = (Name, Value);
    type IntoIter = indexmap::map::IntoIter<Name, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = (&'a Name, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Name, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
