mod delete;
pub use delete::Delete;

mod insert;
pub use insert::Insert;

mod read;
pub use read::Read;

mod transaction;
pub use transaction::Transaction;

mod update;
pub use update::Update;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Read the tuples matching a filter
    Read(Read),

    /// Insert new tuples, returning them as stored
    Insert(Insert),

    /// Update the tuples matching a filter, returning them as updated
    Update(Update),

    /// Delete the tuples matching a filter, returning them
    Delete(Delete),

    /// Execute a transaction lifecycle op
    Transaction(Transaction),
}
