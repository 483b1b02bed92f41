use serde::{Deserialize, Serialize};

/// Okuma machine family. Selects the vendor API namespace once, at driver construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineFamily {
    #[default]
    Mill,
    Lathe,
    Grinder,
}

impl MachineFamily {
    /// Namespace holding the data API classes of this family
    pub fn api_namespace(&self) -> &'static str {
        match self {
            Self::Mill => "Okuma.CMDATAPI.DataAPI",
            Self::Lathe => "Okuma.CLDATAPI.DataAPI",
            Self::Grinder => "Okuma.CGDATAPI.DataApi",
        }
    }

    /// Fully qualified operation name of a subsystem method
    pub fn qualify(&self, subsystem: &str, method: &str) -> String {
        format!("{}.{}.{}", self.api_namespace(), subsystem, method)
    }
}
