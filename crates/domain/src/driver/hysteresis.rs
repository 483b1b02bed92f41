use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum intervals between connect and disconnect attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HysteresisSettings {
    /// Minimum time after a connect attempt before another connect or disconnect
    #[serde(default = "default_connection_interval")]
    pub connection_interval_secs: u64,

    /// Minimum time after a disconnect before another connect or disconnect
    #[serde(default = "default_disconnection_interval")]
    pub disconnection_interval_secs: u64,

    /// Grace period during which an unhealthy fresh session is kept
    #[serde(default = "default_secure_duration")]
    pub secure_duration_secs: u64,
}

fn default_connection_interval() -> u64 {
    15
}

fn default_disconnection_interval() -> u64 {
    10
}

fn default_secure_duration() -> u64 {
    300
}

impl HysteresisSettings {
    pub fn connection_interval(&self) -> Duration {
        Duration::from_secs(self.connection_interval_secs)
    }

    pub fn disconnection_interval(&self) -> Duration {
        Duration::from_secs(self.disconnection_interval_secs)
    }

    pub fn secure_duration(&self) -> Duration {
        Duration::from_secs(self.secure_duration_secs)
    }
}

impl Default for HysteresisSettings {
    fn default() -> Self {
        Self {
            connection_interval_secs: default_connection_interval(),
            disconnection_interval_secs: default_disconnection_interval(),
            secure_duration_secs: default_secure_duration(),
        }
    }
}

/// Timestamps of the last connect/disconnect actions.
///
/// `None` means the action never happened, which never blocks anything.
#[derive(Debug, Clone, Default)]
pub struct Hysteresis {
    settings: HysteresisSettings,
    last_connect_attempt: Option<DateTime<Utc>>,
    last_connected: Option<DateTime<Utc>>,
    last_disconnect: Option<DateTime<Utc>>,
}

/// Time elapsed since `since`. A clock that went backwards counts as no time elapsed.
fn elapsed(now: DateTime<Utc>, since: Option<DateTime<Utc>>) -> Option<Duration> {
    since.map(|t| (now - t).to_std().unwrap_or(Duration::ZERO))
}

impl Hysteresis {
    pub fn new(settings: HysteresisSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &HysteresisSettings {
        &self.settings
    }

    /// Whether a connect or disconnect may run at `now`
    pub fn permits(&self, now: DateTime<Utc>) -> bool {
        let after_disconnect = elapsed(now, self.last_disconnect)
            .is_none_or(|e| e >= self.settings.disconnection_interval());
        let after_connect = elapsed(now, self.last_connect_attempt)
            .is_none_or(|e| e >= self.settings.connection_interval());
        after_disconnect && after_connect
    }

    /// Whether a session established at the last successful connect has outlived the grace period
    pub fn secure_duration_elapsed(&self, now: DateTime<Utc>) -> bool {
        elapsed(now, self.last_connected).is_none_or(|e| e > self.settings.secure_duration())
    }

    pub fn record_connect_attempt(&mut self, at: DateTime<Utc>) {
        self.last_connect_attempt = Some(at);
    }

    pub fn record_connected(&mut self, at: DateTime<Utc>) {
        self.last_connected = Some(at);
    }

    pub fn record_disconnect(&mut self, at: DateTime<Utc>) {
        self.last_disconnect = Some(at);
    }

    pub fn last_connected(&self) -> Option<DateTime<Utc>> {
        self.last_connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: i64) -> chrono::Duration {
        chrono::Duration::seconds(n)
    }

    #[test]
    fn test_default_settings() {
        let settings = HysteresisSettings::default();
        assert_eq!(settings.connection_interval(), Duration::from_secs(15));
        assert_eq!(settings.disconnection_interval(), Duration::from_secs(10));
        assert_eq!(settings.secure_duration(), Duration::from_secs(300));
    }

    #[test]
    fn test_fresh_hysteresis_permits() {
        let hysteresis = Hysteresis::new(HysteresisSettings::default());
        assert!(hysteresis.permits(Utc::now()));
        assert!(hysteresis.secure_duration_elapsed(Utc::now()));
    }

    #[test]
    fn test_connect_attempt_blocks_for_connection_interval() {
        let t0 = Utc::now();
        let mut hysteresis = Hysteresis::new(HysteresisSettings::default());
        hysteresis.record_connect_attempt(t0);

        assert!(!hysteresis.permits(t0 + secs(1)));
        assert!(!hysteresis.permits(t0 + secs(14)));
        assert!(hysteresis.permits(t0 + secs(15)));
    }

    #[test]
    fn test_disconnect_blocks_for_disconnection_interval() {
        let t0 = Utc::now();
        let mut hysteresis = Hysteresis::new(HysteresisSettings::default());
        hysteresis.record_disconnect(t0);

        assert!(!hysteresis.permits(t0 + secs(9)));
        assert!(hysteresis.permits(t0 + secs(10)));
    }

    #[test]
    fn test_secure_duration_counts_from_successful_connect() {
        let t0 = Utc::now();
        let mut hysteresis = Hysteresis::new(HysteresisSettings::default());
        hysteresis.record_connected(t0);

        assert!(!hysteresis.secure_duration_elapsed(t0 + secs(60)));
        assert!(!hysteresis.secure_duration_elapsed(t0 + secs(300)));
        assert!(hysteresis.secure_duration_elapsed(t0 + secs(301)));
    }

    #[test]
    fn test_clock_going_backwards_blocks() {
        let t0 = Utc::now();
        let mut hysteresis = Hysteresis::new(HysteresisSettings::default());
        hysteresis.record_connect_attempt(t0);
        assert!(!hysteresis.permits(t0 - secs(3600)));
    }
}
