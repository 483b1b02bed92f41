use std::collections::HashSet;

/// Operations the connected controller reported as not supported
#[derive(Debug, Clone, Default)]
pub struct MethodAvailabilityCache {
    unavailable: HashSet<String>,
}

impl MethodAvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self, operation: &str) -> bool {
        !self.unavailable.contains(operation)
    }

    /// Returns true if the operation was not already marked
    pub fn mark_unavailable(&mut self, operation: impl Into<String>) -> bool {
        self.unavailable.insert(operation.into())
    }

    /// Forget everything. Called on every reconnect.
    pub fn reset(&mut self) {
        self.unavailable.clear();
    }

    pub fn unavailable(&self) -> impl Iterator<Item = &str> {
        self.unavailable.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.unavailable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unavailable.is_empty()
    }
}
