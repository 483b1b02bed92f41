use async_trait::async_trait;
use domain::{
    CncTransport, DomainError, ErrorAction, OperationOutcome, TransportError, VariableGroup,
};

use super::ConnectionSupervisor;
use crate::reader::ChunkSource;

/// Live session lent by the supervisor for the duration of one acquisition.
///
/// Every failed call goes through the classifier before it reaches the caller.
pub struct Session<'a, T: CncTransport> {
    supervisor: &'a mut ConnectionSupervisor<T>,
}

impl<'a, T: CncTransport> Session<'a, T> {
    pub(super) fn new(supervisor: &'a mut ConnectionSupervisor<T>) -> Self {
        Self { supervisor }
    }

    pub fn driver_id(&self) -> &str {
        &self.supervisor.driver_id
    }

    /// Turn a raw foreign result into a typed outcome.
    ///
    /// Broken transports and fatal conditions are returned as errors.
    pub fn settle<R>(
        &mut self,
        operation: &str,
        result: Result<R, TransportError>,
    ) -> Result<OperationOutcome<R>, DomainError> {
        let error = match result {
            Ok(value) => return Ok(OperationOutcome::Supported(value)),
            Err(error) => error,
        };
        match self.supervisor.absorb(operation, &error) {
            ErrorAction::Ignore => Ok(OperationOutcome::TransientError(error)),
            ErrorAction::MarkUnavailable(_) => Ok(OperationOutcome::Unsupported),
            ErrorAction::ForceDisconnect => Err(DomainError::TransportBroken(error)),
            ErrorAction::FatalHalt => Err(DomainError::FatalCondition(error)),
        }
    }

    /// Read one address, short-circuiting operations the controller does not support
    pub async fn read_optional(
        &mut self,
        group: &VariableGroup,
        address: u32,
    ) -> Result<OperationOutcome<T::Value>, DomainError> {
        let operation = group.single_operation.as_str();
        if !self.supervisor.is_operation_available(operation) {
            return Ok(OperationOutcome::Unsupported);
        }
        let supervisor = &mut *self.supervisor;
        let handle = supervisor.registry.get().ok_or(DomainError::NotConnected)?;
        let result = supervisor.transport.read_single(handle, group, address).await;
        self.settle(operation, result)
    }

    async fn read_run(
        &mut self,
        group: &VariableGroup,
        start: u32,
        len: u32,
    ) -> Result<OperationOutcome<Vec<T::Value>>, DomainError> {
        let operation = group.chunk_operation.as_str();
        if !self.supervisor.is_operation_available(operation) {
            return Ok(OperationOutcome::Unsupported);
        }
        let supervisor = &mut *self.supervisor;
        let handle = supervisor.registry.get().ok_or(DomainError::NotConnected)?;
        let result = supervisor.transport.read_chunk(handle, group, start, len).await;
        self.settle(operation, result)
    }
}

fn into_read<V>(operation: &str, outcome: OperationOutcome<V>) -> Result<V, DomainError> {
    match outcome {
        OperationOutcome::Supported(value) => Ok(value),
        OperationOutcome::Unsupported => Err(DomainError::OperationUnsupported(operation.to_string())),
        OperationOutcome::TransientError(e) => Err(DomainError::TransientReadFailure(e)),
    }
}

#[async_trait]
impl<'a, T: CncTransport> ChunkSource for Session<'a, T> {
    type Value = T::Value;

    async fn read_chunk(
        &mut self,
        group: &VariableGroup,
        start: u32,
        len: u32,
    ) -> Result<Vec<T::Value>, DomainError> {
        let outcome = self.read_run(group, start, len).await?;
        into_read(&group.chunk_operation, outcome)
    }

    async fn read_single(&mut self, group: &VariableGroup, address: u32) -> Result<T::Value, DomainError> {
        let outcome = self.read_optional(group, address).await?;
        into_read(&group.single_operation, outcome)
    }

    fn is_operation_available(&self, operation: &str) -> bool {
        self.supervisor.is_operation_available(operation)
    }

    fn is_interrupted(&self) -> bool {
        let supervisor = &*self.supervisor;
        supervisor.halted || supervisor.session_broken || !supervisor.registry.is_held()
    }
}
