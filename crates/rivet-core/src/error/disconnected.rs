use super::Error;

/// Error when an operation reaches a gateway after `disconnect`.
#[derive(Debug)]
pub(super) struct DisconnectedError {
    gateway: Box<str>,
}

impl std::error::Error for DisconnectedError {}

impl core::fmt::Display for DisconnectedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "gateway `{}` is disconnected", self.gateway)
    }
}

impl Error {
    /// Creates a disconnected-gateway error.
    pub fn disconnected(gateway: impl core::fmt::Display) -> Error {
        Error::from(super::ErrorKind::Disconnected(DisconnectedError {
            gateway: gateway.to_string().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a
    /// disconnected-gateway error.
    pub fn is_disconnected(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Disconnected(_)))
    }
}
