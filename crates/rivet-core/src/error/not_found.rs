use super::Error;

/// Error when a registry lookup misses.
///
/// `kind` names what was being looked up (`relation`, `command`, `mapper`,
/// `gateway`, ...) and `name` is the requested key.
#[derive(Debug)]
pub(super) struct NotFoundError {
    kind: &'static str,
    name: Box<str>,
}

impl std::error::Error for NotFoundError {}

impl core::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{} `{}` not found", self.kind, self.name)
    }
}

impl Error {
    /// Creates a not-found error for a registry lookup.
    pub fn not_found(kind: &'static str, name: impl core::fmt::Display) -> Error {
        Error::from(super::ErrorKind::NotFound(NotFoundError {
            kind,
            name: name.to_string().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a not-found
    /// error.
    pub fn is_not_found(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::NotFound(_)))
    }
}
