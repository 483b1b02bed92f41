use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use super::connection_state::ConnectionState;
use crate::address::VariableGroup;

/// Raw failure reported by the foreign control interface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed with code {code}: {message}")]
pub struct TransportError {
    pub operation: String,
    pub code: i64,
    pub message: String,
}

impl TransportError {
    pub fn new(operation: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            code,
            message: message.into(),
        }
    }
}

/// Foreign control interface a driver instance talks to.
///
/// Implementations wrap a vendor library, a COM server or a simulator. Calls may
/// block up to a timeout owned by the implementation.
#[async_trait]
pub trait CncTransport: Send {
    /// Live session token. Never cloned by the supervisor.
    type Handle: Send + Sync + Debug;
    type Value: Clone + Send + Sync + Debug;

    /// Open a new session
    async fn open(&mut self) -> Result<Self::Handle, TransportError>;

    /// Close a session. The handle is consumed even when closing fails.
    async fn close(&mut self, handle: Self::Handle) -> Result<(), TransportError>;

    /// Read `len` consecutive addresses of `group` starting at `start`
    async fn read_chunk(
        &mut self,
        handle: &Self::Handle,
        group: &VariableGroup,
        start: u32,
        len: u32,
    ) -> Result<Vec<Self::Value>, TransportError>;

    /// Read a single address with the group's single-address primitive
    async fn read_single(
        &mut self,
        handle: &Self::Handle,
        group: &VariableGroup,
        address: u32,
    ) -> Result<Self::Value, TransportError> {
        let mut values = self.read_chunk(handle, group, address, 1).await?;
        values.pop().ok_or_else(|| {
            TransportError::new(group.single_operation.clone(), 0, "empty reply")
        })
    }

    /// Poll the control state. `None` means the controller has no status primitive,
    /// in which case an open session counts as available.
    async fn control_state(
        &mut self,
        _handle: &Self::Handle,
    ) -> Result<Option<ConnectionState>, TransportError> {
        Ok(None)
    }

    /// Transport identifier for logs
    fn name(&self) -> &str;
}
