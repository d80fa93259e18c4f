use super::Error;

/// Error when a transaction lifecycle operation is issued out of order, e.g.
/// committing with no transaction open.
#[derive(Debug)]
pub(super) struct TransactionError {
    message: Box<str>,
}

impl std::error::Error for TransactionError {}

impl core::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "transaction error: {}", self.message)
    }
}

impl Error {
    /// Creates a transaction lifecycle error.
    pub fn transaction(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Transaction(TransactionError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a transaction
    /// lifecycle error.
    pub fn is_transaction(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Transaction(_)))
    }
}
