use config::{Config, ConfigError, Environment, File, FileFormat};
use domain::address::{ReaderSettings, VariableGroup};
use domain::classification::ErrorCategory;
use domain::driver::{ControllerKind, HysteresisSettings, MachineFamily};
use serde::{Deserialize, Serialize};

/// Extra classification rule merged over the built-in vendor table
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ErrorRule {
    // Vendor codes are usually written in hex, so accept "0x8202000A" as well as integers
    #[serde(deserialize_with = "parse_hex_or_int")]
    pub code: i64,
    pub category: ErrorCategory,
}

fn parse_hex_or_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct V;
    impl serde::de::Visitor<'_> for V {
        type Value = i64;
        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "hex string like 0xNNNNNNNN or integer")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            i64::try_from(v).map_err(|_| E::custom(format!("value out of range: {v}")))
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v)
        }
        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let s = s.trim();
            let (negative, digits) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s),
            };
            let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
                Some(hex) => {
                    i64::from_str_radix(hex, 16).map_err(|e| E::custom(format!("parse hex: {e}")))?
                }
                None => digits
                    .parse::<i64>()
                    .map_err(|e| E::custom(format!("parse int: {e}")))?,
            };
            Ok(if negative { -value } else { value })
        }
    }
    deserializer.deserialize_any(V)
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DriverConfig {
    pub driver_id: String,
    pub controller: ControllerKind,
    /// Okuma only, resolved once at construction
    #[serde(default)]
    pub machine_family: Option<MachineFamily>,
    #[serde(default)]
    pub connection: HysteresisSettings,
    #[serde(default)]
    pub reader: ReaderSettings,
    /// Replaces the built-in layout of the controller when not empty
    #[serde(default)]
    pub variable_groups: Vec<VariableGroup>,
    #[serde(default)]
    pub error_rules: Vec<ErrorRule>,
    /// Transport specific settings (simulator faults for instance)
    #[serde(default)]
    pub transport: Option<serde_json::Value>,
}

impl DriverConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("controller", "simulator")?
            // Local config file, required so a driver never starts half configured
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(true))
            // Per run mode overrides, e.g. config/production.toml
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. CNC__CONNECTION__SECURE_DURATION_SECS=60)
            .add_source(Environment::with_prefix("CNC").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse an in-memory TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = DriverConfig::from_toml_str(
            r#"
            driver_id = "lathe-1"
            controller = "focas"
            "#,
        )
        .unwrap();

        assert_eq!(config.driver_id, "lathe-1");
        assert_eq!(config.controller, ControllerKind::Focas);
        assert_eq!(config.connection, HysteresisSettings::default());
        assert_eq!(config.reader, ReaderSettings::default());
        assert!(config.variable_groups.is_empty());
        assert!(config.error_rules.is_empty());
        assert!(config.machine_family.is_none());
    }

    #[test]
    fn test_overrides_and_hex_codes() {
        let config = DriverConfig::from_toml_str(
            r#"
            driver_id = "mill-7"
            controller = "mitsubishi"

            [connection]
            connection_interval_secs = 30
            secure_duration_secs = 60

            [reader]
            min_chunk_len = 8
            chunk_delay_ms = 20

            [[error_rules]]
            code = "0x80A00101"
            category = "transport_broken"

            [[error_rules]]
            code = -8
            category = "fatal"
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.connection_interval_secs, 30);
        assert_eq!(config.connection.disconnection_interval_secs, 10);
        assert_eq!(config.connection.secure_duration_secs, 60);
        assert_eq!(config.reader.min_chunk_len, 8);
        assert_eq!(config.reader.chunk_delay_ms, 20);
        assert_eq!(
            config.error_rules,
            vec![
                ErrorRule {
                    code: 0x80A0_0101,
                    category: ErrorCategory::TransportBroken
                },
                ErrorRule {
                    code: -8,
                    category: ErrorCategory::Fatal
                },
            ]
        );
    }

    #[test]
    fn test_okuma_family_and_groups() {
        let config = DriverConfig::from_toml_str(
            r#"
            driver_id = "okuma-2"
            controller = "okuma"
            machine_family = "lathe"

            [[variable_groups]]
            name = "common"
            first = 1
            last = 200
            chunk_operation = "GetCommonVariableValues"
            single_operation = "GetCommonVariableValue"
            max_chunk_len = 100
            max_padding = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.machine_family, Some(MachineFamily::Lathe));
        assert_eq!(config.variable_groups.len(), 1);
        assert_eq!(config.variable_groups[0].max_padding, Some(10));
    }

    #[test]
    fn test_unknown_controller_rejected() {
        let result = DriverConfig::from_toml_str(
            r#"
            driver_id = "x"
            controller = "fanuc_over_serial"
            "#,
        );
        assert!(result.is_err());
    }
}
