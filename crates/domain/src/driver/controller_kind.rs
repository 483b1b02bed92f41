use serde::{Deserialize, Serialize};

/// Family of control interface a driver talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    /// Native library with numeric session handles
    Focas,
    /// COM automation server
    Mitsubishi,
    /// COM automation server with pushed state events
    HeidenhainDnc,
    /// Reflection-loaded vendor assembly
    Okuma,
    Simulator,
}

impl ControllerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Focas => "focas",
            Self::Mitsubishi => "mitsubishi",
            Self::HeidenhainDnc => "heidenhain_dnc",
            Self::Okuma => "okuma",
            Self::Simulator => "simulator",
        }
    }

    /// Whether the controller pushes state events instead of being polled
    pub fn pushes_events(&self) -> bool {
        matches!(self, Self::HeidenhainDnc)
    }
}
