use crate::driver::TransportError;

/// Result of an optional controller operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome<T> {
    Supported(T),
    /// Not implemented by the connected controller
    Unsupported,
    /// Failed this time only
    TransientError(TransportError),
}

impl<T> OperationOutcome<T> {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    pub fn supported(self) -> Option<T> {
        match self {
            Self::Supported(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationOutcome<U> {
        match self {
            Self::Supported(value) => OperationOutcome::Supported(f(value)),
            Self::Unsupported => OperationOutcome::Unsupported,
            Self::TransientError(e) => OperationOutcome::TransientError(e),
        }
    }
}
