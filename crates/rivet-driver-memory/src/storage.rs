use rivet_core::{driver::Capability, Error, Name, Result, Tuple, Value};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The table of datasets held by a [`Memory`](crate::Memory) gateway.
///
/// Looking up an unknown dataset creates it, empty. [`Storage::contains`]
/// reports existence without creating.
#[derive(Debug, Default)]
pub struct Storage {
    datasets: Mutex<HashMap<Name, Dataset>>,
}

/// A handle to one in-memory dataset: an ordered sequence of tuples.
///
/// Handles are cheap to clone and all clones observe the same rows.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: Name,
    inner: Arc<Mutex<Rows>>,
}

#[derive(Debug, Default, Clone)]
struct Rows {
    tuples: Vec<Tuple>,
    last_id: i64,
}

/// Saved copy of every dataset, used to implement rollback.
#[derive(Debug)]
pub(crate) struct Snapshot {
    datasets: Vec<(Name, Rows)>,
}

impl Storage {
    pub fn new() -> Storage {
        Storage::default()
    }

    /// Returns the dataset named `name`, creating an empty one on first
    /// access.
    pub fn dataset(&self, name: &str) -> Dataset {
        let mut datasets = self.datasets();

        if let Some(dataset) = datasets.get(name) {
            return dataset.clone();
        }

        tracing::trace!(dataset = %name, "creating empty dataset");
        let name = Name::from(name);
        datasets
            .entry(name.clone())
            .or_insert_with(|| Dataset::new(name))
            .clone()
    }

    /// Returns `true` if the dataset has been created. Never creates it.
    pub fn contains(&self, name: &str) -> bool {
        self.datasets().contains_key(name)
    }

    /// Names of all datasets created so far, sorted.
    pub fn names(&self) -> Vec<Name> {
        let mut names: Vec<_> = self.datasets().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        let datasets = self
            .datasets()
            .iter()
            .map(|(name, dataset)| (name.clone(), dataset.rows().clone()))
            .collect();
        Snapshot { datasets }
    }

    /// Restores every dataset to its saved state. Datasets created after the
    /// snapshot are dropped.
    pub(crate) fn restore(&self, snapshot: Snapshot) {
        let mut datasets = self.datasets();
        let mut saved: HashMap<_, _> = snapshot.datasets.into_iter().collect();

        datasets.retain(|name, _| saved.contains_key(name));

        for (name, dataset) in datasets.iter() {
            if let Some(rows) = saved.remove(name) {
                *dataset.rows() = rows;
            }
        }
    }

    fn datasets(&self) -> MutexGuard<'_, HashMap<Name, Dataset>> {
        self.datasets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Dataset {
    fn new(name: Name) -> Dataset {
        Dataset {
            name,
            inner: Arc::new(Mutex::new(Rows::default())),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows().tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().tuples.is_empty()
    }

    /// All tuples, in insertion order.
    pub fn to_vec(&self) -> Vec<Tuple> {
        self.rows().tuples.clone()
    }

    pub fn read(&self, filter: &Tuple) -> Vec<Tuple> {
        self.rows()
            .tuples
            .iter()
            .filter(|tuple| tuple.matches(filter))
            .cloned()
            .collect()
    }

    /// Appends a tuple. See [`Dataset::insert_all`].
    pub fn insert(&self, tuple: Tuple, capability: &Capability) -> Result<Tuple> {
        let mut stored = self.insert_all(vec![tuple], capability)?;
        stored
            .pop()
            .ok_or_else(|| rivet_core::err!("insert into `{}` stored nothing", self.name))
    }

    /// Appends `tuples` as one unit: either all of them are stored or, on
    /// error, none are.
    ///
    /// A tuple omitting the primary key gets the next integer key when the
    /// capability generates keys, and is rejected otherwise. A key already
    /// present in the dataset or earlier in the batch is rejected.
    pub fn insert_all(&self, tuples: Vec<Tuple>, capability: &Capability) -> Result<Vec<Tuple>> {
        let primary_key = capability.primary_key;
        let mut rows = self.rows();
        let mut last_id = rows.last_id;
        let mut staged: Vec<Tuple> = Vec::with_capacity(tuples.len());

        for mut tuple in tuples {
            match tuple.get(primary_key) {
                None | Some(Value::Null) if capability.generated_keys => {
                    last_id += 1;
                    tuple.insert_first(primary_key, last_id);
                }
                None | Some(Value::Null) => {
                    return Err(Error::validation(format!(
                        "`{primary_key}` is required in dataset `{}`",
                        self.name
                    )));
                }
                Some(key) => {
                    let key = key.clone();
                    if rows.has_key(primary_key, &key) || has_key(&staged, primary_key, &key) {
                        return Err(self.duplicate(primary_key, &key));
                    }

                    if let Value::I64(id) = key {
                        last_id = last_id.max(id);
                    }
                }
            }

            staged.push(tuple);
        }

        rows.last_id = last_id;
        rows.tuples.extend(staged.iter().cloned());
        Ok(staged)
    }

    /// Applies `changes` to every tuple matching `filter`, returning the
    /// updated tuples.
    ///
    /// Changing the primary key is rejected, leaving every tuple untouched,
    /// when the new key is held by another tuple or would be given to more
    /// than one.
    pub fn update(&self, filter: &Tuple, changes: &Tuple, primary_key: &str) -> Result<Vec<Tuple>> {
        let mut rows = self.rows();

        if let Some(key) = changes.get(primary_key).filter(|key| !key.is_null()) {
            let matched = rows.tuples.iter().filter(|t| t.matches(filter)).count();
            let taken = rows
                .tuples
                .iter()
                .any(|t| !t.matches(filter) && t.get(primary_key) == Some(key));

            if taken || matched > 1 {
                return Err(self.duplicate(primary_key, key));
            }

            if let (Value::I64(id), 1) = (key, matched) {
                rows.last_id = rows.last_id.max(*id);
            }
        }

        let mut updated = vec![];
        for tuple in rows.tuples.iter_mut().filter(|t| t.matches(filter)) {
            tuple.merge(changes);
            updated.push(tuple.clone());
        }

        Ok(updated)
    }

    /// Removes every tuple matching `filter`, returning the removed tuples.
    pub fn delete(&self, filter: &Tuple) -> Vec<Tuple> {
        let mut rows = self.rows();
        let (deleted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut rows.tuples)
            .into_iter()
            .partition(|tuple| tuple.matches(filter));

        rows.tuples = kept;
        deleted
    }

    fn rows(&self) -> MutexGuard<'_, Rows> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn duplicate(&self, primary_key: &str, key: &Value) -> Error {
        Error::validation(format!(
            "duplicate {primary_key} {key:?} in dataset `{}`",
            self.name
        ))
    }
}

impl Rows {
    fn has_key(&self, primary_key: &str, key: &Value) -> bool {
        has_key(&self.tuples, primary_key, key)
    }
}

fn has_key(tuples: &[Tuple], primary_key: &str, key: &Value) -> bool {
    tuples.iter().any(|tuple| tuple.get(primary_key) == Some(key))
}
