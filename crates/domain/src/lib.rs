//! Domain layer - CNC acquisition core with no I/O
//!
//! This crate contains:
//! - Connection state machine and hysteresis bookkeeping
//! - The foreign transport interface (trait)
//! - Error classification and the method availability cache
//! - Address sets, variable groups and chunk planning
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Pure functions wherever possible
//! - Testable in isolation

pub mod address;
pub mod classification;
pub mod driver;
pub mod error;

// Re-export commonly used types
pub use address::{AddressSet, GroupTable, ReadChunk, ReadResult, ReaderSettings, VariableGroup};
pub use classification::{
    ClassificationTable, ErrorAction, ErrorCategory, ErrorClassifier, MethodAvailabilityCache,
    OperationOutcome,
};
pub use driver::{
    Clock, CncTransport, ConnectionState, ControlEvent, ControllerKind, HysteresisSettings,
    MachineFamily, TransportError,
};
pub use error::DomainError;
