//! Infrastructure layer - Controller specifics, configuration and logging

pub mod config;
pub mod drivers;
pub mod telemetry;

pub use config::{DriverConfig, ErrorRule};
pub use drivers::{DriverComponents, DriverFactory, SimulatedController, SimulatorControl};
pub use telemetry::init_tracing;
