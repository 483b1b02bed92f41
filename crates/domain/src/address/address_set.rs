use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::error::{DomainError, Result};

/// Widest span a single range spec may cover
const MAX_RANGE_SPAN: u32 = 100_000;

/// Sorted set of numbered controller addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet(BTreeSet<u32>);

impl AddressSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: u32) -> bool {
        self.0.insert(address)
    }

    pub fn contains(&self, address: u32) -> bool {
        self.0.contains(&address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Addresses within `range`, in ascending order
    pub fn within(&self, range: RangeInclusive<u32>) -> impl DoubleEndedIterator<Item = u32> + '_ {
        self.0.range(range).copied()
    }

    /// Parse `"X-Y"` or `"X-Y-Z"` where Z is a stride
    pub fn parse_range(spec: &str) -> Result<Self> {
        let invalid = || DomainError::InvalidAddressSpec(spec.to_string());
        let parts: Vec<&str> = spec.trim().split('-').map(str::trim).collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }
        let first: u32 = parts[0].parse().map_err(|_| invalid())?;
        let last: u32 = parts[1].parse().map_err(|_| invalid())?;
        let stride: u32 = match parts.get(2) {
            Some(s) => s.parse().map_err(|_| invalid())?,
            None => 1,
        };
        if stride == 0 || last.saturating_sub(first) >= MAX_RANGE_SPAN {
            return Err(invalid());
        }

        Ok((first..=last).step_by(stride as usize).collect())
    }

    /// Parse a list whose first character is the separator, e.g. `",1,2,3"` or `"|7|9"`
    pub fn parse_list(spec: &str) -> Result<Self> {
        let mut chars = spec.chars();
        let separator = chars
            .next()
            .ok_or_else(|| DomainError::InvalidAddressSpec(spec.to_string()))?;
        chars
            .as_str()
            .split(separator)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse::<u32>()
                    .map_err(|_| DomainError::InvalidAddressSpec(spec.to_string()))
            })
            .collect()
    }
}

impl FromIterator<u32> for AddressSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<u32> for AddressSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<const N: usize> From<[u32; N]> for AddressSet {
    fn from(addresses: [u32; N]) -> Self {
        addresses.into_iter().collect()
    }
}
