//! Composition of supervisor and reader used by a host polling loop
use std::sync::Arc;

use domain::{
    AddressSet, Clock, CncTransport, DomainError, GroupTable, OperationOutcome, ReadResult,
};
use infrastructure::config::DriverConfig;
use infrastructure::drivers::DriverFactory;
use tracing::{debug, info};

use crate::reader::BatchedRangeReader;
use crate::supervisor::ConnectionSupervisor;

/// One CNC driver instance. A host runs [`CncDriver::start_cycle`] and then any
/// number of reads per acquisition cycle, never two cycles at once.
pub struct CncDriver<T: CncTransport> {
    supervisor: ConnectionSupervisor<T>,
    reader: BatchedRangeReader,
    groups: GroupTable,
}

impl<T: CncTransport> CncDriver<T> {
    pub fn new(supervisor: ConnectionSupervisor<T>, reader: BatchedRangeReader, groups: GroupTable) -> Self {
        Self {
            supervisor,
            reader,
            groups,
        }
    }

    /// Build a driver with the classifier and variable layout of the configured controller
    pub fn from_config(transport: T, config: &DriverConfig, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        let components = DriverFactory::components(config)?;
        info!(
            driver_id = %config.driver_id,
            controller = config.controller.as_str(),
            groups = components.groups.groups().len(),
            "Driver configured"
        );
        let supervisor = ConnectionSupervisor::new(
            config.driver_id.clone(),
            transport,
            components.classifier,
            clock,
            config.connection.clone(),
        );
        Ok(Self::new(
            supervisor,
            BatchedRangeReader::new(config.reader.clone()),
            components.groups,
        ))
    }

    pub fn id(&self) -> &str {
        self.supervisor.driver_id()
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor<T> {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut ConnectionSupervisor<T> {
        &mut self.supervisor
    }

    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    /// Connectivity check at the start of an acquisition cycle
    pub async fn start_cycle(&mut self) -> bool {
        self.supervisor.run_cycle().await
    }

    pub fn is_usable(&self) -> bool {
        self.supervisor.is_usable()
    }

    pub async fn read_variables(&mut self, addresses: &AddressSet) -> Result<ReadResult<T::Value>, DomainError> {
        let mut session = self.supervisor.session()?;
        let result = self.reader.read_groups(&mut session, &self.groups, addresses).await?;
        debug!(
            driver_id = %self.supervisor.driver_id(),
            requested = addresses.len(),
            read = result.len(),
            interrupted = result.is_interrupted(),
            "Variables read"
        );
        Ok(result)
    }

    /// Read addresses given as `"X-Y"`, `"X-Y-Z"` or a separator-prefixed list
    pub async fn read_variable_spec(&mut self, spec: &str) -> Result<ReadResult<T::Value>, DomainError> {
        let addresses = parse_address_spec(spec)?;
        self.read_variables(&addresses).await
    }

    pub async fn read_variables_one_by_one(
        &mut self,
        addresses: &AddressSet,
    ) -> Result<ReadResult<T::Value>, DomainError> {
        let mut session = self.supervisor.session()?;
        self.reader.read_one_by_one(&mut session, &self.groups, addresses).await
    }

    /// Single read with a typed outcome
    pub async fn read_variable(&mut self, address: u32) -> Result<OperationOutcome<T::Value>, DomainError> {
        let group = self
            .groups
            .group_of(address)
            .ok_or_else(|| DomainError::InvalidAddressSpec(address.to_string()))?;
        let mut session = self.supervisor.session()?;
        session.read_optional(group, address).await
    }

    pub async fn shutdown(&mut self) {
        self.supervisor.shutdown().await;
    }
}

fn parse_address_spec(spec: &str) -> Result<AddressSet, DomainError> {
    let spec = spec.trim();
    match spec.chars().next() {
        Some(c) if c.is_ascii_digit() => AddressSet::parse_range(spec),
        Some(_) => AddressSet::parse_list(spec),
        None => Err(DomainError::InvalidAddressSpec(spec.to_string())),
    }
}
