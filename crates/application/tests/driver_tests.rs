use std::sync::Arc;
use std::time::Duration;

use application::CncDriver;
use domain::driver::ManualClock;
use domain::{AddressSet, DomainError, OperationOutcome};
use infrastructure::drivers::{SimulatedController, SimulatorControl};
use infrastructure::{DriverConfig, DriverFactory};

const CONFIG: &str = r#"
driver_id = "sim-mill"
controller = "simulator"

[connection]
connection_interval_secs = 15
disconnection_interval_secs = 10
secure_duration_secs = 300

[reader]
min_chunk_len = 4

[transport]
reliable_chunk_len = 64
bad_addresses = [300]
"#;

fn driver() -> (CncDriver<SimulatedController>, SimulatorControl, Arc<ManualClock>) {
    infrastructure::init_tracing("warn");
    let config = DriverConfig::from_toml_str(CONFIG).unwrap();
    let sim = DriverFactory::simulator(&config).unwrap();
    let control = sim.control();
    let clock = Arc::new(ManualClock::default());
    let driver = CncDriver::from_config(sim, &config, clock.clone()).unwrap();
    (driver, control, clock)
}

#[tokio::test]
async fn test_reads_fail_before_the_first_cycle() {
    let (mut driver, control, _clock) = driver();

    let result = driver.read_variable_spec("1-20").await;
    assert!(matches!(result, Err(DomainError::NotConnected)));
    assert_eq!(control.stats().opens, 0);
}

#[tokio::test]
async fn test_range_spec_read() {
    let (mut driver, control, _clock) = driver();
    assert_eq!(driver.id(), "sim-mill");
    assert!(driver.start_cycle().await);

    let result = driver.read_variable_spec("1-20").await.unwrap();
    assert_eq!(result.len(), 20);
    assert!(!result.is_interrupted());
    assert_eq!(result.get(20), Some(&10.0));
    assert_eq!(control.stats().chunk_reads, vec![(1, 20)]);

    let strided = driver.read_variable_spec("10-30-10").await.unwrap();
    assert_eq!(strided.addresses().collect::<Vec<_>>(), vec![10, 20, 30]);

    let listed = driver.read_variable_spec(";7;9").await.unwrap();
    assert_eq!(listed.len(), 2);

    assert!(matches!(
        driver.read_variable_spec("abc").await,
        Err(DomainError::InvalidAddressSpec(_))
    ));
    assert!(matches!(
        driver.read_variable_spec("0-4294967295").await,
        Err(DomainError::InvalidAddressSpec(_))
    ));
}

#[tokio::test]
async fn test_bad_address_is_isolated() {
    let (mut driver, _control, _clock) = driver();
    assert!(driver.start_cycle().await);

    let result = driver.read_variable_spec("250-350").await.unwrap();
    assert_eq!(result.len(), 100);
    assert!(!result.contains(300));
    assert_eq!(result.failed().collect::<Vec<_>>(), vec![300]);
    assert_eq!(result.get(299), Some(&149.5));
    assert!(driver.is_usable());
}

#[tokio::test]
async fn test_one_by_one_reads_only_singles() {
    let (mut driver, control, _clock) = driver();
    assert!(driver.start_cycle().await);

    let addresses = AddressSet::from([1, 2, 3, 10000]);
    let result = driver.read_variables_one_by_one(&addresses).await.unwrap();

    assert_eq!(result.len(), 3);
    let stats = control.stats();
    assert!(stats.chunk_reads.is_empty());
    assert_eq!(stats.single_reads, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_broken_transport_interrupts_then_reconnects() {
    let (mut driver, control, clock) = driver();
    assert!(driver.start_cycle().await);

    control.set_broken(true);
    let result = driver.read_variable_spec("1-100").await.unwrap();
    assert!(result.is_interrupted());
    assert!(result.is_empty());
    assert!(!driver.is_usable());
    assert_eq!(control.stats().chunk_reads.len(), 1);
    assert!(matches!(
        driver.read_variable_spec("1-100").await,
        Err(DomainError::NotConnected)
    ));

    control.set_broken(false);
    clock.advance(Duration::from_secs(16));
    assert!(!driver.start_cycle().await);
    assert_eq!(control.stats().closes, 1);
    assert_eq!(control.open_sessions(), 0);

    clock.advance(Duration::from_secs(10));
    assert!(driver.start_cycle().await);
    assert_eq!(control.stats().opens, 2);

    let result = driver.read_variable_spec("1-10").await.unwrap();
    assert_eq!(result.len(), 10);
}

#[tokio::test]
async fn test_unsupported_single_read_is_remembered() {
    let (mut driver, control, _clock) = driver();
    assert!(driver.start_cycle().await);
    control.mark_unsupported("sim_read");

    let first = driver.read_variable(5).await.unwrap();
    assert!(matches!(first, OperationOutcome::Unsupported));
    let second = driver.read_variable(6).await.unwrap();
    assert!(matches!(second, OperationOutcome::Unsupported));

    assert_eq!(control.stats().single_reads, vec![5]);
    assert!(!driver.supervisor().is_operation_available("sim_read"));
    assert!(driver.is_usable());
}

#[tokio::test]
async fn test_single_read_outcomes() {
    let (mut driver, _control, _clock) = driver();
    assert!(driver.start_cycle().await);

    match driver.read_variable(8).await.unwrap() {
        OperationOutcome::Supported(value) => assert_eq!(value, 4.0),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(matches!(
        driver.read_variable(300).await.unwrap(),
        OperationOutcome::TransientError(_)
    ));
    assert!(matches!(
        driver.read_variable(20000).await,
        Err(DomainError::InvalidAddressSpec(_))
    ));
}

#[tokio::test]
async fn test_shutdown_closes_the_session() {
    let (mut driver, control, _clock) = driver();
    assert!(driver.start_cycle().await);

    driver.shutdown().await;
    assert_eq!(control.open_sessions(), 0);
    assert!(!driver.is_usable());
}
