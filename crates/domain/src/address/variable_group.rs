use serde::{Deserialize, Serialize};

use super::address_set::AddressSet;
use crate::error::{DomainError, Result};

/// Address sub-range served by one pair of read primitives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableGroup {
    pub name: String,
    /// First address of the group (inclusive)
    pub first: u32,
    /// Last address of the group (inclusive)
    pub last: u32,
    /// Primitive reading a contiguous run
    pub chunk_operation: String,
    /// Primitive reading one address
    pub single_operation: String,
    /// Protocol ceiling for one chunk read
    pub max_chunk_len: u32,
    /// Upper bound on unrequested addresses a chunk may cover
    #[serde(default)]
    pub max_padding: Option<u32>,
}

impl VariableGroup {
    pub fn new(
        name: impl Into<String>,
        first: u32,
        last: u32,
        chunk_operation: impl Into<String>,
        single_operation: impl Into<String>,
        max_chunk_len: u32,
    ) -> Self {
        Self {
            name: name.into(),
            first,
            last,
            chunk_operation: chunk_operation.into(),
            single_operation: single_operation.into(),
            max_chunk_len,
            max_padding: None,
        }
    }

    pub fn with_max_padding(mut self, max_padding: u32) -> Self {
        self.max_padding = Some(max_padding);
        self
    }

    pub fn contains(&self, address: u32) -> bool {
        (self.first..=self.last).contains(&address)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "variable group without a name".to_string(),
            ));
        }
        if self.first > self.last {
            return Err(DomainError::InvalidConfiguration(format!(
                "group {}: first address {} is after last address {}",
                self.name, self.first, self.last
            )));
        }
        if self.max_chunk_len == 0 {
            return Err(DomainError::InvalidConfiguration(format!(
                "group {}: max_chunk_len must be at least 1",
                self.name
            )));
        }
        if self.chunk_operation.is_empty() || self.single_operation.is_empty() {
            return Err(DomainError::InvalidConfiguration(format!(
                "group {}: read operations must be named",
                self.name
            )));
        }
        Ok(())
    }

    fn overlaps(&self, other: &VariableGroup) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// Disjoint variable groups of one controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTable {
    groups: Vec<VariableGroup>,
}

impl GroupTable {
    /// Validate and sort `groups` by first address
    pub fn new(mut groups: Vec<VariableGroup>) -> Result<Self> {
        for group in &groups {
            group.validate()?;
        }
        groups.sort_by_key(|g| g.first);
        for pair in groups.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "groups {} and {} overlap",
                    pair[0].name, pair[1].name
                )));
            }
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[VariableGroup] {
        &self.groups
    }

    pub fn find(&self, name: &str) -> Option<&VariableGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn group_of(&self, address: u32) -> Option<&VariableGroup> {
        self.groups.iter().find(|g| g.contains(address))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Split `addresses` into per-group sets. The second value holds addresses
    /// no group covers.
    pub fn split(&self, addresses: &AddressSet) -> (Vec<(&VariableGroup, AddressSet)>, AddressSet) {
        let mut matched = Vec::new();
        let mut covered = 0usize;
        for group in &self.groups {
            let subset: AddressSet = addresses.within(group.first..=group.last).collect();
            if !subset.is_empty() {
                covered += subset.len();
                matched.push((group, subset));
            }
        }

        let unmatched = if covered == addresses.len() {
            AddressSet::new()
        } else {
            addresses.iter().filter(|a| self.group_of(*a).is_none()).collect()
        };
        (matched, unmatched)
    }
}
