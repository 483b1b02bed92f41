//! Application layer - CNC acquisition use cases
//!
//! This crate contains:
//! - The connection supervisor and its handle registry
//! - The batched range reader
//! - The driver composition used by polling hosts

pub mod driver;
pub mod reader;
pub mod supervisor;

pub use driver::CncDriver;
pub use reader::{BatchedRangeReader, ChunkSource};
pub use supervisor::{ConnectionSupervisor, HandleRegistry, Session, StatusMessage, StatusNotifier};
