//! Mapping of raw foreign error codes to recovery actions
mod availability;
mod outcome;

pub use availability::MethodAvailabilityCache;
pub use outcome::OperationOutcome;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Recovery action for a failed foreign call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorAction {
    /// Failure of this single call only
    Ignore,
    /// The operation is not implemented by the connected controller
    MarkUnavailable(String),
    /// The session itself is broken
    ForceDisconnect,
    /// Unrecoverable, stop all further work
    FatalHalt,
}

/// Category of a known error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    TransportBroken,
    Unsupported,
    Fatal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransportBroken => "transport_broken",
            Self::Unsupported => "unsupported",
            Self::Fatal => "fatal",
        }
    }
}

/// Pure mapping from a raw error code to an action
#[cfg_attr(test, mockall::automock)]
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, operation: &str, code: i64) -> ErrorAction;
}

/// Table-driven classifier. Codes not in the table are ignored.
#[derive(Debug, Clone, Default)]
pub struct ClassificationTable {
    name: String,
    rules: HashMap<i64, ErrorCategory>,
}

impl ClassificationTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: HashMap::new(),
        }
    }

    /// Builder-style rule registration
    pub fn with(mut self, code: i64, category: ErrorCategory) -> Self {
        self.rules.insert(code, category);
        self
    }

    /// Add or replace a rule. Returns the previous category of `code`.
    pub fn insert(&mut self, code: i64, category: ErrorCategory) -> Option<ErrorCategory> {
        self.rules.insert(code, category)
    }

    pub fn category(&self, code: i64) -> Option<ErrorCategory> {
        self.rules.get(&code).copied()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl ErrorClassifier for ClassificationTable {
    fn classify(&self, operation: &str, code: i64) -> ErrorAction {
        match self.category(code) {
            Some(ErrorCategory::TransportBroken) => ErrorAction::ForceDisconnect,
            Some(ErrorCategory::Unsupported) => ErrorAction::MarkUnavailable(operation.to_string()),
            Some(ErrorCategory::Fatal) => ErrorAction::FatalHalt,
            None => ErrorAction::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ClassificationTable {
        ClassificationTable::new("test")
            .with(-8, ErrorCategory::TransportBroken)
            .with(-7, ErrorCategory::Unsupported)
            .with(1638, ErrorCategory::Fatal)
    }

    #[test]
    fn test_classify_known_codes() {
        let table = table();
        assert_eq!(table.classify("cnc_rdmacro", -8), ErrorAction::ForceDisconnect);
        assert_eq!(
            table.classify("cnc_rdexecpt", -7),
            ErrorAction::MarkUnavailable("cnc_rdexecpt".to_string())
        );
        assert_eq!(table.classify("any", 1638), ErrorAction::FatalHalt);
    }

    #[test]
    fn test_unknown_code_is_ignored() {
        assert_eq!(table().classify("cnc_rdmacro", 5), ErrorAction::Ignore);
        assert_eq!(ClassificationTable::default().classify("x", -8), ErrorAction::Ignore);
    }

    #[test]
    fn test_insert_overrides_rule() {
        let mut table = table();
        let previous = table.insert(-7, ErrorCategory::TransportBroken);
        assert_eq!(previous, Some(ErrorCategory::Unsupported));
        assert_eq!(table.classify("op", -7), ErrorAction::ForceDisconnect);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_mock_classifier() {
        let mut mock = MockErrorClassifier::new();
        mock.expect_classify()
            .withf(|op, code| op == "cnc_rdparam" && *code == 42)
            .times(1)
            .returning(|_, _| ErrorAction::FatalHalt);

        let classifier: &dyn ErrorClassifier = &mock;
        assert_eq!(classifier.classify("cnc_rdparam", 42), ErrorAction::FatalHalt);
    }
}
