use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::address_set::AddressSet;

/// Contiguous address run `[start, start + len)` read with one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadChunk {
    pub start: u32,
    pub len: u32,
}

impl ReadChunk {
    pub fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// Chunk spanning `first..=last`
    pub fn spanning(first: u32, last: u32) -> Self {
        Self::new(first, last - first + 1)
    }

    /// Last address covered (inclusive)
    pub fn last(&self) -> u32 {
        self.start + self.len.saturating_sub(1)
    }

    pub fn contains(&self, address: u32) -> bool {
        address >= self.start && address - self.start < self.len
    }

    /// Split at `start + len / 2`. Single-address chunks cannot be split.
    pub fn bisect(&self) -> Option<(ReadChunk, ReadChunk)> {
        if self.len < 2 {
            return None;
        }
        let half = self.len / 2;
        Some((
            ReadChunk::new(self.start, half),
            ReadChunk::new(self.start + half, self.len - half),
        ))
    }

    /// Shrink to the first and last requested address it covers
    pub fn trim(&self, requested: &AddressSet) -> Option<ReadChunk> {
        let mut inside = requested.within(self.start..=self.last());
        let first = inside.next()?;
        let last = inside.next_back().unwrap_or(first);
        Some(ReadChunk::spanning(first, last))
    }

    /// Requested addresses covered by this chunk
    pub fn requested<'a>(&self, requested: &'a AddressSet) -> impl Iterator<Item = u32> + 'a {
        requested.within(self.start..=self.last())
    }
}

impl std::fmt::Display for ReadChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, u64::from(self.start) + u64::from(self.len))
    }
}

/// Greedy partition of `addresses` into the fewest chunks of at most `chunk_limit`
/// addresses. Gaps between requested addresses are padded as long as the chunk
/// stays within the limit and, when set, within `max_padding` unrequested addresses.
pub fn plan_chunks(addresses: &AddressSet, chunk_limit: u32, max_padding: Option<u32>) -> Vec<ReadChunk> {
    let limit = chunk_limit.max(1);
    let mut chunks = Vec::new();
    let mut iter = addresses.iter();
    let Some(first) = iter.next() else {
        return chunks;
    };

    let (mut start, mut last, mut padding) = (first, first, 0u32);
    for address in iter {
        let gap = address - last - 1;
        let fits = address - start < limit
            && max_padding.is_none_or(|max| padding.saturating_add(gap) <= max);
        if fits {
            last = address;
            padding += gap;
        } else {
            chunks.push(ReadChunk::spanning(start, last));
            (start, last, padding) = (address, address, 0);
        }
    }
    chunks.push(ReadChunk::spanning(start, last));
    chunks
}

/// Tuning of the batched reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderSettings {
    /// Failed chunks shorter than this are read address by address instead of bisected
    #[serde(default = "default_min_chunk_len")]
    pub min_chunk_len: u32,

    /// Pause between two foreign read calls
    #[serde(default)]
    pub chunk_delay_ms: u64,
}

fn default_min_chunk_len() -> u32 {
    4
}

impl ReaderSettings {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            min_chunk_len: default_min_chunk_len(),
            chunk_delay_ms: 0,
        }
    }
}
