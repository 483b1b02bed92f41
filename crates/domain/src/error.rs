use thiserror::Error;

use crate::driver::TransportError;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid driver configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid address specification: {0}")]
    InvalidAddressSpec(String),

    #[error("Chunk limit {requested} is not allowed for group {group} (ceiling {ceiling})")]
    ChunkLimitExceeded {
        group: String,
        requested: u32,
        ceiling: u32,
    },

    #[error("No live session with the controller")]
    NotConnected,

    #[error("Acquisition halted after a fatal condition")]
    Halted,

    #[error("A session handle is already held")]
    HandleInUse,

    #[error("Operation {0} is not available on this controller")]
    OperationUnsupported(String),

    #[error("Read failed: {0}")]
    TransientReadFailure(TransportError),

    #[error("Transport broken: {0}")]
    TransportBroken(TransportError),

    #[error("Fatal condition: {0}")]
    FatalCondition(TransportError),
}

impl DomainError {
    /// True when the session can no longer be used for this cycle
    pub fn interrupts_session(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Halted | Self::TransportBroken(_) | Self::FatalCondition(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
