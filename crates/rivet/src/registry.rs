use crate::{Error, Name, Result};

use indexmap::IndexMap;

/// An immutable, ordered mapping from name to component.
///
/// Lookups of unknown names fail with a not-found error labelled with the
/// registry's `kind`. Rebinding produces a new registry; a registry is never
/// modified once handed to a [`Container`](crate::Container).
#[derive(Debug, Clone)]
pub struct Registry<T> {
    kind: &'static str,
    entries: IndexMap<Name, T>,
}

impl<T> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Builds a registry from `(name, component)` pairs. Later duplicates
    /// replace earlier ones.
    pub fn from_entries(kind: &'static str, entries: impl IntoIterator<Item = (Name, T)>) -> Self {
        Self {
            kind,
            entries: entries.into_iter().collect(),
        }
    }

    /// What the registry holds: `relation`, `command`, `mapper`, ...
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn get(&self, name: &str) -> Result<&T> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::not_found(self.kind, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &T)> {
        self.entries.iter()
    }

    /// Returns a new registry with every component passed through `f`.
    pub fn map<U>(&self, mut f: impl FnMut(&Name, &T) -> U) -> Registry<U> {
        Registry {
            kind: self.kind,
            entries: self
                .entries
                .iter()
                .map(|(name, value)| (name.clone(), f(name, value)))
                .collect(),
        }
    }

    /// Returns a new registry holding the components for which `f` returns
    /// `true`.
    pub fn filter(&self, mut f: impl FnMut(&Name, &T) -> bool) -> Registry<T>
    where
        T: Clone,
    {
        Registry {
            kind: self.kind,
            entries: self
                .entries
                .iter()
                .filter(|(name, value)| f(*name, *value))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }

    /// Adds an entry. Only used while assembling a container.
    pub(crate) fn insert(&mut self, name: Name, value: T) -> Option<T> {
        self.entries.insert(name, value)
    }
}

impl<'a, T> IntoIterator for &'a Registry<T> {
    type Item = (&'a Name, &'a T);
    type IntoIter = indexmap::map::Iter<'a, Name, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
