//! Batched range reading with bisection and single-address fallback
use async_trait::async_trait;
use domain::address::plan_chunks;
use domain::{AddressSet, DomainError, GroupTable, ReadChunk, ReadResult, ReaderSettings, VariableGroup};
use tracing::{debug, info, warn};

/// Where the reader gets its values from
#[async_trait]
pub trait ChunkSource: Send {
    type Value: Send;

    /// Read `len` consecutive addresses of `group` from `start`
    async fn read_chunk(
        &mut self,
        group: &VariableGroup,
        start: u32,
        len: u32,
    ) -> Result<Vec<Self::Value>, DomainError>;

    async fn read_single(&mut self, group: &VariableGroup, address: u32) -> Result<Self::Value, DomainError>;

    fn is_operation_available(&self, operation: &str) -> bool;

    /// True once the session can no longer serve reads this cycle
    fn is_interrupted(&self) -> bool;
}

/// How a run of single reads ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// The group's single-address primitive is not supported
    SinglesUnsupported,
    Interrupted,
}

/// Reads address sets in protocol-legal chunks.
///
/// A failed chunk is bisected; halves shorter than `min_chunk_len` are read
/// address by address and failing addresses are left out of the result.
#[derive(Debug, Clone, Default)]
pub struct BatchedRangeReader {
    settings: ReaderSettings,
}

impl BatchedRangeReader {
    pub fn new(settings: ReaderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    /// Read the addresses of `addresses` that belong to `group`, using chunks of at
    /// most `chunk_limit` addresses.
    pub async fn read_many<S: ChunkSource>(
        &self,
        source: &mut S,
        group: &VariableGroup,
        addresses: &AddressSet,
        chunk_limit: u32,
    ) -> Result<ReadResult<S::Value>, DomainError> {
        group.validate()?;
        if chunk_limit == 0 || chunk_limit > group.max_chunk_len {
            return Err(DomainError::ChunkLimitExceeded {
                group: group.name.clone(),
                requested: chunk_limit,
                ceiling: group.max_chunk_len,
            });
        }
        if source.is_interrupted() {
            return Err(DomainError::NotConnected);
        }
        let requested = self.restrict(group, addresses);
        self.run_group(source, group, &requested, chunk_limit, true).await
    }

    /// Split `addresses` by variable group and read every group with its own ceiling
    pub async fn read_groups<S: ChunkSource>(
        &self,
        source: &mut S,
        table: &GroupTable,
        addresses: &AddressSet,
    ) -> Result<ReadResult<S::Value>, DomainError> {
        self.read_table(source, table, addresses, true).await
    }

    /// Slow mode: every address with the single-address primitive
    pub async fn read_one_by_one<S: ChunkSource>(
        &self,
        source: &mut S,
        table: &GroupTable,
        addresses: &AddressSet,
    ) -> Result<ReadResult<S::Value>, DomainError> {
        self.read_table(source, table, addresses, false).await
    }

    async fn read_table<S: ChunkSource>(
        &self,
        source: &mut S,
        table: &GroupTable,
        addresses: &AddressSet,
        chunked: bool,
    ) -> Result<ReadResult<S::Value>, DomainError> {
        if source.is_interrupted() {
            return Err(DomainError::NotConnected);
        }

        let (groups, unmatched) = table.split(addresses);
        if !unmatched.is_empty() {
            warn!(
                count = unmatched.len(),
                first = ?unmatched.first(),
                "Addresses outside every variable group skipped"
            );
        }

        let mut result = ReadResult::new();
        for (group, subset) in groups {
            if source.is_interrupted() {
                result.mark_interrupted();
                break;
            }
            let part = self
                .run_group(source, group, &subset, group.max_chunk_len, chunked)
                .await?;
            result.merge(part);
        }
        Ok(result)
    }

    fn restrict(&self, group: &VariableGroup, addresses: &AddressSet) -> AddressSet {
        let requested: AddressSet = addresses.within(group.first..=group.last).collect();
        if requested.len() != addresses.len() {
            warn!(
                group = %group.name,
                skipped = addresses.len() - requested.len(),
                "Addresses outside the group range skipped"
            );
        }
        requested
    }

    async fn run_group<S: ChunkSource>(
        &self,
        source: &mut S,
        group: &VariableGroup,
        requested: &AddressSet,
        chunk_limit: u32,
        chunked: bool,
    ) -> Result<ReadResult<S::Value>, DomainError> {
        let mut result = ReadResult::new();
        let mut chunked = chunked && source.is_operation_available(&group.chunk_operation);
        let mut singles = source.is_operation_available(&group.single_operation);
        let mut calls = 0usize;

        let mut pending = plan_chunks(requested, chunk_limit, group.max_padding);
        pending.reverse();

        while let Some(chunk) = pending.pop() {
            if source.is_interrupted() {
                result.mark_interrupted();
                break;
            }

            if !chunked {
                if !singles {
                    warn!(group = %group.name, "No read primitive available, group skipped");
                    break;
                }
                match self
                    .read_individually(source, group, chunk, requested, &mut calls, &mut result)
                    .await
                {
                    Flow::Continue => continue,
                    Flow::SinglesUnsupported => {
                        warn!(group = %group.name, "Single reads unsupported, group skipped");
                        break;
                    }
                    Flow::Interrupted => {
                        result.mark_interrupted();
                        break;
                    }
                }
            }

            self.pause(&mut calls).await;
            match source.read_chunk(group, chunk.start, chunk.len).await {
                Ok(values) if values.len() == chunk.len as usize => {
                    for (offset, value) in values.into_iter().enumerate() {
                        let address = chunk.start + offset as u32;
                        if requested.contains(address) {
                            result.insert(address, value);
                        }
                    }
                    continue;
                }
                Ok(values) => {
                    warn!(
                        group = %group.name,
                        chunk = %chunk,
                        received = values.len(),
                        "Short chunk reply"
                    );
                }
                Err(DomainError::OperationUnsupported(operation)) => {
                    info!(group = %group.name, %operation, "Chunk reads unsupported, reading addresses one by one");
                    chunked = false;
                    pending.push(chunk);
                    continue;
                }
                Err(e) if e.interrupts_session() => {
                    warn!(group = %group.name, chunk = %chunk, error = %e, "Session lost during batch");
                    result.mark_interrupted();
                    break;
                }
                Err(e) => {
                    debug!(group = %group.name, chunk = %chunk, error = %e, "Chunk read failed");
                }
            }

            // Without single reads the chunk primitive is bisected down to one address
            let min_len = if singles { self.settings.min_chunk_len.max(1) } else { 1 };
            if let Some((left, right)) = self.split(chunk, requested, min_len) {
                pending.extend(right);
                pending.extend(left);
                continue;
            }
            if !singles {
                debug!(group = %group.name, chunk = %chunk, "Address omitted");
                for address in chunk.requested(requested) {
                    result.record_failure(address);
                }
                continue;
            }

            debug!(group = %group.name, chunk = %chunk, "Falling back to single reads");
            match self
                .read_individually(source, group, chunk, requested, &mut calls, &mut result)
                .await
            {
                Flow::Continue => {}
                Flow::SinglesUnsupported => {
                    info!(group = %group.name, "Single reads unsupported, bisecting chunks down to one address");
                    singles = false;
                    pending.push(chunk);
                }
                Flow::Interrupted => {
                    result.mark_interrupted();
                    break;
                }
            }
        }

        debug!(
            group = %group.name,
            requested = requested.len(),
            read = result.len(),
            calls,
            "Group read complete"
        );
        Ok(result)
    }

    /// Halves of a failed chunk trimmed to requested addresses, or `None` when the
    /// halves would be shorter than `min_len`
    fn split(
        &self,
        chunk: ReadChunk,
        requested: &AddressSet,
        min_len: u32,
    ) -> Option<(Option<ReadChunk>, Option<ReadChunk>)> {
        if chunk.len / 2 < min_len {
            return None;
        }
        let (left, right) = chunk.bisect()?;
        Some((left.trim(requested), right.trim(requested)))
    }

    async fn read_individually<S: ChunkSource>(
        &self,
        source: &mut S,
        group: &VariableGroup,
        chunk: ReadChunk,
        requested: &AddressSet,
        calls: &mut usize,
        result: &mut ReadResult<S::Value>,
    ) -> Flow {
        let addresses: Vec<u32> = chunk.requested(requested).collect();
        for address in addresses {
            if source.is_interrupted() {
                return Flow::Interrupted;
            }
            self.pause(calls).await;
            match source.read_single(group, address).await {
                Ok(value) => result.insert(address, value),
                Err(DomainError::OperationUnsupported(operation)) => {
                    debug!(group = %group.name, %operation, address, "Single read unsupported");
                    return Flow::SinglesUnsupported;
                }
                Err(e) if e.interrupts_session() => {
                    result.record_failure(address);
                    warn!(group = %group.name, address, error = %e, "Session lost during single reads");
                    return Flow::Interrupted;
                }
                Err(e) => {
                    debug!(group = %group.name, address, error = %e, "Address omitted");
                    result.record_failure(address);
                }
            }
        }
        Flow::Continue
    }

    async fn pause(&self, calls: &mut usize) {
        let delay = self.settings.chunk_delay();
        if *calls > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        *calls += 1;
    }
}
