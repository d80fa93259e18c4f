mod storage;
pub use storage::{Dataset, Storage};

use rivet_core::{
    async_trait,
    driver::{operation, Capability, Gateway, Operation, Response},
    Error, Name, Result,
};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, PoisonError,
};

/// The in-memory reference gateway.
///
/// Datasets live in a [`Storage`] table and spring into existence, empty, the
/// first time they are addressed. One transaction may be open at a time; it
/// is implemented as a snapshot of the whole storage restored on rollback.
#[derive(Debug)]
pub struct Memory {
    storage: Storage,
    connected: AtomicBool,
    snapshot: Mutex<Option<storage::Snapshot>>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            storage: Storage::new(),
            connected: AtomicBool::new(true),
            snapshot: Mutex::new(None),
        }
    }

    /// Direct access to the dataset table.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn transaction(&self, op: operation::Transaction) -> Result<Response> {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);

        match op {
            operation::Transaction::Start => {
                if snapshot.is_some() {
                    return Err(Error::transaction("transaction already in progress"));
                }
                *snapshot = Some(self.storage.snapshot());
            }
            operation::Transaction::Commit => {
                if snapshot.take().is_none() {
                    return Err(Error::transaction("commit without a transaction"));
                }
            }
            operation::Transaction::Rollback => {
                let Some(saved) = snapshot.take() else {
                    return Err(Error::transaction("rollback without a transaction"));
                };
                self.storage.restore(saved);
            }
        }

        tracing::debug!(op = ?op, "memory transaction");
        Ok(Response::count(0))
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for Memory {
    fn capability(&self) -> &'static Capability {
        &Capability::MEMORY
    }

    fn contains_dataset(&self, name: &str) -> bool {
        self.storage.contains(name)
    }

    async fn exec(&self, dataset: &Name, op: Operation) -> Result<Response> {
        if !self.is_connected() {
            return Err(Error::disconnected("memory"));
        }

        let capability = self.capability();

        match op {
            Operation::Read(op) => {
                let tuples = self.storage.dataset(dataset).read(&op.filter);
                Ok(Response::tuples(tuples))
            }
            Operation::Insert(op) => {
                let tuples = self
                    .storage
                    .dataset(dataset)
                    .insert_all(op.tuples, capability)?;
                Ok(Response::tuples(tuples))
            }
            Operation::Update(op) => {
                let tuples = self.storage.dataset(dataset).update(
                    &op.filter,
                    &op.changes,
                    capability.primary_key,
                )?;
                Ok(Response::tuples(tuples))
            }
            Operation::Delete(op) => {
                let tuples = self.storage.dataset(dataset).delete(&op.filter);
                Ok(Response::tuples(tuples))
            }
            Operation::Transaction(op) => self.transaction(op),
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::Release);
        tracing::debug!("memory gateway disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
