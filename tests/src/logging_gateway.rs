use rivet::{
    driver::{Capability, Operation, Response},
    Gateway, Name, Result,
};
use rivet_core::async_trait;

use std::sync::{Arc, Mutex};

/// A gateway wrapper recording every operation it forwards.
#[derive(Debug)]
pub struct LoggingGateway {
    inner: Arc<dyn Gateway>,

    /// Dataset and operation, in execution order
    ops_log: Arc<Mutex<Vec<GatewayOp>>>,
}

#[derive(Debug, Clone)]
pub struct GatewayOp {
    pub dataset: Name,
    pub operation: Operation,
}

impl LoggingGateway {
    pub fn new(inner: Arc<dyn Gateway>) -> Self {
        Self {
            inner,
            ops_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a handle to access the operations log
    pub fn ops_log_handle(&self) -> Arc<Mutex<Vec<GatewayOp>>> {
        self.ops_log.clone()
    }
}

#[async_trait]
impl Gateway for LoggingGateway {
    fn capability(&self) -> &'static Capability {
        self.inner.capability()
    }

    fn contains_dataset(&self, name: &str) -> bool {
        self.inner.contains_dataset(name)
    }

    async fn exec(&self, dataset: &Name, operation: Operation) -> Result<Response> {
        self.ops_log.lock().unwrap().push(GatewayOp {
            dataset: dataset.clone(),
            operation: operation.clone(),
        });

        self.inner.exec(dataset, operation).await
    }

    async fn disconnect(&self) -> Result<()> {
        self.inner.disconnect().await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}
