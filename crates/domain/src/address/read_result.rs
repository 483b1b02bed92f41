use std::collections::{BTreeMap, BTreeSet};

/// Values read from the controller, keyed by address.
///
/// A missing key means "not readable this cycle", never a zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult<V> {
    values: BTreeMap<u32, V>,
    failed: BTreeSet<u32>,
    interrupted: bool,
}

impl<V> ReadResult<V> {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            failed: BTreeSet::new(),
            interrupted: false,
        }
    }

    pub fn insert(&mut self, address: u32, value: V) {
        self.failed.remove(&address);
        self.values.insert(address, value);
    }

    /// Record an address whose single read failed
    pub fn record_failure(&mut self, address: u32) {
        if !self.values.contains_key(&address) {
            self.failed.insert(address);
        }
    }

    /// Mark the batch as cut short by a broken session
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    pub fn get(&self, address: u32) -> Option<&V> {
        self.values.get(&address)
    }

    pub fn contains(&self, address: u32) -> bool {
        self.values.contains_key(&address)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &V)> {
        self.values.iter().map(|(a, v)| (*a, v))
    }

    /// Addresses that were attempted individually and failed
    pub fn failed(&self) -> impl Iterator<Item = u32> + '_ {
        self.failed.iter().copied()
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn merge(&mut self, other: ReadResult<V>) {
        for address in other.failed {
            self.record_failure(address);
        }
        for (address, value) in other.values {
            self.insert(address, value);
        }
        self.interrupted |= other.interrupted;
    }

    pub fn into_values(self) -> BTreeMap<u32, V> {
        self.values
    }
}

impl<V> Default for ReadResult<V> {
    fn default() -> Self {
        Self::new()
    }
}
