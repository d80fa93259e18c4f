mod capability;
pub use capability::Capability;

mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::{async_trait, Name};

use std::fmt::Debug;

/// A named connection to a backing store.
///
/// A gateway owns zero or more datasets, addressed by name. Relations and
/// commands never touch a dataset directly; they send an [`Operation`] through
/// the gateway that owns it.
#[async_trait]
pub trait Gateway: Debug + Send + Sync + 'static {
    /// Describes what the adapter supports.
    fn capability(&self) -> &'static Capability;

    /// Returns `true` if a dataset named `name` exists. Never creates one.
    fn contains_dataset(&self, name: &str) -> bool;

    /// Execute an operation against the dataset named `dataset`.
    ///
    /// A dataset that has never been written to behaves as an empty one; it is
    /// not an error to read from or delete within it.
    async fn exec(&self, dataset: &Name, op: Operation) -> crate::Result<Response>;

    /// Release the underlying connection.
    async fn disconnect(&self) -> crate::Result<()>;

    /// Returns `false` once `disconnect` has completed.
    fn is_connected(&self) -> bool;
}
