use crate::{Error, Gateway, Name, Result};
use rivet_core::driver::operation;

use std::sync::Arc;

/// An open transaction on one gateway.
///
/// Writes made through the gateway while the transaction is open are undone
/// by [`rollback`](Self::rollback). If dropped without calling
/// [`commit`](Self::commit) or `rollback`, the transaction is rolled back on
/// the current tokio runtime.
#[derive(Debug)]
pub struct Transaction {
    gateway: Arc<dyn Gateway>,

    /// Whether commit or rollback has been called.
    finished: bool,
}

impl Transaction {
    pub async fn begin(gateway: &Arc<dyn Gateway>) -> Result<Transaction> {
        if !gateway.capability().transactions {
            return Err(Error::transaction("gateway does not support transactions"));
        }

        exec(gateway, operation::Transaction::Start).await?;

        Ok(Transaction {
            gateway: gateway.clone(),
            finished: false,
        })
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub async fn commit(mut self) -> Result<()> {
        self.finished = true;
        exec(&self.gateway, operation::Transaction::Commit).await
    }

    pub async fn rollback(mut self) -> Result<()> {
        self.finished = true;
        exec(&self.gateway, operation::Transaction::Rollback).await
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("transaction dropped outside a runtime; not rolled back");
            return;
        };

        let gateway = self.gateway.clone();
        handle.spawn(async move {
            if let Err(err) = exec(&gateway, operation::Transaction::Rollback).await {
                tracing::warn!(error = %err, "rollback of dropped transaction failed");
            }
        });
    }
}

async fn exec(gateway: &Arc<dyn Gateway>, op: operation::Transaction) -> Result<()> {
    // Transaction control is not addressed to a dataset.
    gateway.exec(&Name::from(""), op.into()).await?;
    Ok(())
}
