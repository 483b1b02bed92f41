pub mod error_codes;
pub mod layouts;
mod simulator;

pub use simulator::{
    SimulatedController, SimulatorConfig, SimulatorControl, SimulatorHandle, SimulatorStats,
};

use std::sync::Arc;

use domain::DomainError;
use domain::address::GroupTable;
use domain::classification::{ClassificationTable, ErrorClassifier};
use domain::driver::ControllerKind;

use crate::config::DriverConfig;

/// Pieces a driver instance is assembled from
pub struct DriverComponents {
    pub classifier: Arc<dyn ErrorClassifier>,
    pub groups: GroupTable,
}

/// Factory for controller specific driver parts
pub struct DriverFactory;

impl DriverFactory {
    /// Built-in table of the controller with the configured rules merged over it
    pub fn classifier(config: &DriverConfig) -> ClassificationTable {
        let mut table = error_codes::builtin_table(config.controller);
        for rule in &config.error_rules {
            let code = error_codes::normalize_code(config.controller, rule.code);
            if let Some(previous) = table.insert(code, rule.category) {
                tracing::debug!(
                    driver_id = %config.driver_id,
                    code,
                    previous = previous.as_str(),
                    category = rule.category.as_str(),
                    "Error rule overridden"
                );
            }
        }
        table
    }

    /// Configured variable groups, or the built-in layout when none are configured
    pub fn groups(config: &DriverConfig) -> Result<GroupTable, DomainError> {
        if config.machine_family.is_some() && config.controller != ControllerKind::Okuma {
            tracing::warn!(
                driver_id = %config.driver_id,
                controller = config.controller.as_str(),
                "machine_family only applies to Okuma controllers"
            );
        }
        let groups = if config.variable_groups.is_empty() {
            layouts::builtin_layout(config.controller, config.machine_family)
        } else {
            config.variable_groups.clone()
        };
        GroupTable::new(groups)
    }

    pub fn components(config: &DriverConfig) -> Result<DriverComponents, DomainError> {
        Ok(DriverComponents {
            classifier: Arc::new(Self::classifier(config)),
            groups: Self::groups(config)?,
        })
    }

    /// Simulated controller configured from the `transport` section
    pub fn simulator(config: &DriverConfig) -> Result<SimulatedController, DomainError> {
        if config.controller != ControllerKind::Simulator {
            return Err(DomainError::InvalidConfiguration(format!(
                "{} is not a simulator",
                config.controller.as_str()
            )));
        }
        let sim_config: SimulatorConfig = match &config.transport {
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                DomainError::InvalidConfiguration(format!("Invalid simulator config: {}", e))
            })?,
            None => SimulatorConfig::default(),
        };
        Ok(SimulatedController::new(config.driver_id.clone(), sim_config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::classification::{ErrorAction, ErrorCategory};
    use serde_json::json;

    use crate::config::ErrorRule;

    fn config(controller: ControllerKind) -> DriverConfig {
        DriverConfig {
            driver_id: "test".to_string(),
            controller,
            machine_family: None,
            connection: Default::default(),
            reader: Default::default(),
            variable_groups: Vec::new(),
            error_rules: Vec::new(),
            transport: None,
        }
    }

    #[test]
    fn test_configured_rules_merge_over_builtin() {
        let mut config = config(ControllerKind::Focas);
        config.error_rules = vec![
            ErrorRule {
                code: error_codes::focas::EW_BUSY,
                category: ErrorCategory::TransportBroken,
            },
            ErrorRule {
                code: error_codes::focas::EW_VERSION,
                category: ErrorCategory::Fatal,
            },
        ];
        let table = DriverFactory::classifier(&config);
        assert_eq!(table.classify("op", -1), ErrorAction::ForceDisconnect);
        assert_eq!(table.classify("op", -7), ErrorAction::FatalHalt);
        assert_eq!(table.classify("op", -8), ErrorAction::ForceDisconnect);
    }

    #[test]
    fn test_heidenhain_rules_are_normalized() {
        let mut config = config(ControllerKind::HeidenhainDnc);
        config.error_rules = vec![ErrorRule {
            code: 0x8004_0001,
            category: ErrorCategory::TransportBroken,
        }];
        let table = DriverFactory::classifier(&config);
        assert_eq!(
            table.classify("op", 0x8004_0001_u32 as i32 as i64),
            ErrorAction::ForceDisconnect
        );
    }

    #[test]
    fn test_groups_default_to_builtin_layout() {
        let groups = DriverFactory::groups(&config(ControllerKind::Focas)).unwrap();
        assert_eq!(groups.groups().len(), 4);
        assert!(DriverFactory::groups(&config(ControllerKind::Mitsubishi)).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_configured_groups_rejected() {
        let mut config = config(ControllerKind::Mitsubishi);
        config.variable_groups = vec![domain::address::VariableGroup::new("bad", 10, 1, "r", "r", 4)];
        assert!(DriverFactory::components(&config).is_err());
    }

    #[test]
    fn test_create_simulator() {
        let mut config = config(ControllerKind::Simulator);
        config.transport = Some(json!({
            "reliable_chunk_len": 64,
            "bad_addresses": [300],
            "control_state": "available"
        }));
        assert!(DriverFactory::simulator(&config).is_ok());

        config.transport = Some(json!({ "bad_addresses": "nope" }));
        assert!(DriverFactory::simulator(&config).is_err());

        assert!(DriverFactory::simulator(&self::config(ControllerKind::Focas)).is_err());
    }
}
