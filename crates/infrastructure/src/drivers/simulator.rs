use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use domain::address::VariableGroup;
use domain::driver::{CncTransport, ConnectionState, TransportError};
use serde::Deserialize;

use super::error_codes::focas;

/// Faults the simulated controller starts with
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SimulatorConfig {
    /// Chunk reads longer than this fail with EW_BUSY
    #[serde(default)]
    pub reliable_chunk_len: Option<u32>,
    /// Addresses whose reads fail with EW_NUMBER, alone or inside a chunk
    #[serde(default)]
    pub bad_addresses: Vec<u32>,
    /// Operations answered with EW_VERSION
    #[serde(default)]
    pub unsupported_operations: Vec<String>,
    /// Number of opens failing with EW_SOCKET before one succeeds
    #[serde(default)]
    pub open_failures: u32,
    /// Polled control state. Absent means the controller has no status primitive.
    #[serde(default)]
    pub control_state: Option<ConnectionState>,
}

/// Calls received by the simulated controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    pub opens: usize,
    pub closes: usize,
    pub state_polls: usize,
    /// `(start, len)` of every chunk read
    pub chunk_reads: Vec<(u32, u32)>,
    pub single_reads: Vec<u32>,
}

#[derive(Debug, Default)]
struct SimulatorState {
    reliable_chunk_len: Option<u32>,
    bad_addresses: BTreeSet<u32>,
    unsupported: HashSet<String>,
    open_failures: u32,
    control_state: Option<ConnectionState>,
    broken: bool,
    close_fails: bool,
    next_handle: u32,
    open_handles: HashSet<u32>,
    stats: SimulatorStats,
}

impl SimulatorState {
    fn check_session(&self, operation: &str, handle: &SimulatorHandle) -> Result<(), TransportError> {
        if self.broken || !self.open_handles.contains(&handle.0) {
            return Err(TransportError::new(operation, focas::EW_HANDLE, "invalid handle"));
        }
        if self.unsupported.contains(operation) {
            return Err(TransportError::new(operation, focas::EW_VERSION, "not supported"));
        }
        Ok(())
    }
}

/// Session token of the simulated controller
#[derive(Debug, PartialEq, Eq)]
pub struct SimulatorHandle(u32);

/// In-memory controller. Address `a` holds `a * 0.5`.
pub struct SimulatedController {
    name: String,
    inner: Arc<Mutex<SimulatorState>>,
}

/// Shared remote control of a [`SimulatedController`] for fault injection
#[derive(Clone)]
pub struct SimulatorControl {
    inner: Arc<Mutex<SimulatorState>>,
}

fn lock(inner: &Mutex<SimulatorState>) -> MutexGuard<'_, SimulatorState> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

impl SimulatedController {
    pub fn new(name: impl Into<String>, config: SimulatorConfig) -> Self {
        let state = SimulatorState {
            reliable_chunk_len: config.reliable_chunk_len,
            bad_addresses: config.bad_addresses.into_iter().collect(),
            unsupported: config.unsupported_operations.into_iter().collect(),
            open_failures: config.open_failures,
            control_state: config.control_state,
            next_handle: 1,
            ..SimulatorState::default()
        };
        Self {
            name: name.into(),
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn control(&self) -> SimulatorControl {
        SimulatorControl {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn value_of(address: u32) -> f64 {
        f64::from(address) * 0.5
    }
}

impl SimulatorControl {
    /// Every call fails with a broken-transport code while set
    pub fn set_broken(&self, broken: bool) {
        lock(&self.inner).broken = broken;
    }

    pub fn fail_next_opens(&self, count: u32) {
        lock(&self.inner).open_failures = count;
    }

    pub fn set_close_fails(&self, fails: bool) {
        lock(&self.inner).close_fails = fails;
    }

    pub fn fail_address(&self, address: u32) {
        lock(&self.inner).bad_addresses.insert(address);
    }

    pub fn heal_address(&self, address: u32) {
        lock(&self.inner).bad_addresses.remove(&address);
    }

    pub fn set_reliable_chunk_len(&self, len: Option<u32>) {
        lock(&self.inner).reliable_chunk_len = len;
    }

    pub fn mark_unsupported(&self, operation: &str) {
        lock(&self.inner).unsupported.insert(operation.to_string());
    }

    pub fn set_control_state(&self, state: Option<ConnectionState>) {
        lock(&self.inner).control_state = state;
    }

    pub fn open_sessions(&self) -> usize {
        lock(&self.inner).open_handles.len()
    }

    pub fn stats(&self) -> SimulatorStats {
        lock(&self.inner).stats.clone()
    }

    pub fn reset_stats(&self) {
        lock(&self.inner).stats = SimulatorStats::default();
    }
}

#[async_trait]
impl CncTransport for SimulatedController {
    type Handle = SimulatorHandle;
    type Value = f64;

    async fn open(&mut self) -> Result<SimulatorHandle, TransportError> {
        let mut state = lock(&self.inner);
        state.stats.opens += 1;
        if state.open_failures > 0 {
            state.open_failures -= 1;
            return Err(TransportError::new("sim_open", focas::EW_SOCKET, "connection refused"));
        }
        if state.broken {
            return Err(TransportError::new("sim_open", focas::EW_SOCKET, "host unreachable"));
        }
        let id = state.next_handle;
        state.next_handle += 1;
        state.open_handles.insert(id);
        tracing::debug!(simulator = %self.name, handle = id, "Simulator session opened");
        Ok(SimulatorHandle(id))
    }

    async fn close(&mut self, handle: SimulatorHandle) -> Result<(), TransportError> {
        let mut state = lock(&self.inner);
        state.stats.closes += 1;
        state.open_handles.remove(&handle.0);
        if state.close_fails {
            return Err(TransportError::new("sim_close", focas::EW_HANDLE, "close failed"));
        }
        tracing::debug!(simulator = %self.name, handle = handle.0, "Simulator session closed");
        Ok(())
    }

    async fn read_chunk(
        &mut self,
        handle: &SimulatorHandle,
        group: &VariableGroup,
        start: u32,
        len: u32,
    ) -> Result<Vec<f64>, TransportError> {
        let mut state = lock(&self.inner);
        state.stats.chunk_reads.push((start, len));
        let operation = group.chunk_operation.as_str();
        state.check_session(operation, handle)?;

        if state.reliable_chunk_len.is_some_and(|max| len > max) {
            return Err(TransportError::new(operation, focas::EW_BUSY, "buffer overrun"));
        }
        let end = start.saturating_add(len);
        if state.bad_addresses.range(start..end).next().is_some() {
            return Err(TransportError::new(operation, focas::EW_NUMBER, "bad variable number"));
        }
        Ok((start..end).map(Self::value_of).collect())
    }

    async fn read_single(
        &mut self,
        handle: &SimulatorHandle,
        group: &VariableGroup,
        address: u32,
    ) -> Result<f64, TransportError> {
        let mut state = lock(&self.inner);
        state.stats.single_reads.push(address);
        let operation = group.single_operation.as_str();
        state.check_session(operation, handle)?;

        if state.bad_addresses.contains(&address) {
            return Err(TransportError::new(operation, focas::EW_NUMBER, "bad variable number"));
        }
        Ok(Self::value_of(address))
    }

    async fn control_state(
        &mut self,
        handle: &SimulatorHandle,
    ) -> Result<Option<ConnectionState>, TransportError> {
        let mut state = lock(&self.inner);
        state.stats.state_polls += 1;
        if state.broken || !state.open_handles.contains(&handle.0) {
            return Err(TransportError::new("sim_state", focas::EW_HANDLE, "invalid handle"));
        }
        Ok(state.control_state)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
