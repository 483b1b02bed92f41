use serde::{Deserialize, Serialize};

/// Control state of a CNC session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session, or the session was just torn down
    #[default]
    Uninitialized,
    /// The controller host does not answer
    HostUnavailable,
    /// The host answers, the control service is not ready yet
    HostAvailable,
    /// Waiting for the operator to grant access
    AwaitingPermission,
    /// Access refused, needs operator intervention
    NoPermission,
    /// Session usable for acquisition
    Available,
    /// The machine is shutting down
    ShuttingDown,
    /// The control service stopped
    Stopped,
}

/// Asynchronous status notification pushed by a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlEvent {
    HostNotAvailable,
    HostAvailable,
    WaitPermission,
    PermissionDenied,
    MachineAvailable,
    MachineShuttingDown,
    Stopped,
    ConnectionLost,
}

impl ConnectionState {
    /// Only `Available` lets acquisition code use the session
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// States in which a still-held handle must be released
    pub fn requires_release(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::HostUnavailable => "host_unavailable",
            Self::HostAvailable => "host_available",
            Self::AwaitingPermission => "awaiting_permission",
            Self::NoPermission => "no_permission",
            Self::Available => "available",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        }
    }

    /// Next state after `event`. Pairs without a transition keep the current state.
    pub fn on_event(self, event: ControlEvent) -> Self {
        use ConnectionState as S;
        use ControlEvent as E;

        match (self, event) {
            (S::NoPermission, _) => S::NoPermission,
            (_, E::Stopped) => S::Stopped,
            (S::Uninitialized, E::HostNotAvailable) => S::HostUnavailable,
            (S::HostUnavailable, E::HostAvailable) => S::HostAvailable,
            (S::HostAvailable, E::HostNotAvailable) => S::HostUnavailable,
            (S::HostAvailable, E::WaitPermission) => S::AwaitingPermission,
            (S::AwaitingPermission, E::PermissionDenied) => S::NoPermission,
            (S::AwaitingPermission, E::MachineAvailable) => S::Available,
            (S::Available, E::MachineShuttingDown) => S::ShuttingDown,
            (S::Stopped, E::ConnectionLost) => S::HostUnavailable,
            (state, _) => state,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_EVENTS: [ControlEvent; 8] = [
        ControlEvent::HostNotAvailable,
        ControlEvent::HostAvailable,
        ControlEvent::WaitPermission,
        ControlEvent::PermissionDenied,
        ControlEvent::MachineAvailable,
        ControlEvent::MachineShuttingDown,
        ControlEvent::Stopped,
        ControlEvent::ConnectionLost,
    ];

    #[test]
    fn test_initial_state_is_uninitialized() {
        let state = ConnectionState::default();
        assert_eq!(state, ConnectionState::Uninitialized);
        assert!(!state.is_usable());
        assert!(state.requires_release());
    }

    #[test]
    fn test_only_available_is_usable() {
        assert!(ConnectionState::Available.is_usable());
        assert!(!ConnectionState::HostAvailable.is_usable());
        assert!(!ConnectionState::ShuttingDown.is_usable());
        assert!(!ConnectionState::NoPermission.is_usable());
    }

    #[test]
    fn test_nominal_startup_sequence() {
        let state = ConnectionState::Uninitialized
            .on_event(ControlEvent::HostNotAvailable)
            .on_event(ControlEvent::HostAvailable)
            .on_event(ControlEvent::WaitPermission)
            .on_event(ControlEvent::MachineAvailable);
        assert_eq!(state, ConnectionState::Available);
    }

    #[test]
    fn test_host_lost_before_permission() {
        let state = ConnectionState::HostAvailable.on_event(ControlEvent::HostNotAvailable);
        assert_eq!(state, ConnectionState::HostUnavailable);
    }

    #[test]
    fn test_permission_denied() {
        let state = ConnectionState::AwaitingPermission.on_event(ControlEvent::PermissionDenied);
        assert_eq!(state, ConnectionState::NoPermission);
    }

    #[test]
    fn test_shutdown_from_available() {
        let state = ConnectionState::Available.on_event(ControlEvent::MachineShuttingDown);
        assert_eq!(state, ConnectionState::ShuttingDown);
    }

    #[test]
    fn test_stopped_from_any_state_except_no_permission() {
        for state in [
            ConnectionState::Uninitialized,
            ConnectionState::HostUnavailable,
            ConnectionState::HostAvailable,
            ConnectionState::AwaitingPermission,
            ConnectionState::Available,
            ConnectionState::ShuttingDown,
        ] {
            assert_eq!(state.on_event(ControlEvent::Stopped), ConnectionState::Stopped);
        }
    }

    #[test]
    fn test_connection_lost_after_stop() {
        let state = ConnectionState::Stopped.on_event(ControlEvent::ConnectionLost);
        assert_eq!(state, ConnectionState::HostUnavailable);
    }

    #[test]
    fn test_no_permission_ignores_every_event() {
        for event in ALL_EVENTS {
            assert_eq!(
                ConnectionState::NoPermission.on_event(event),
                ConnectionState::NoPermission
            );
        }
    }

    #[test]
    fn test_unhandled_pairs_keep_state() {
        assert_eq!(
            ConnectionState::Uninitialized.on_event(ControlEvent::MachineAvailable),
            ConnectionState::Uninitialized
        );
        assert_eq!(
            ConnectionState::Available.on_event(ControlEvent::HostAvailable),
            ConnectionState::Available
        );
        assert_eq!(
            ConnectionState::HostUnavailable.on_event(ControlEvent::ConnectionLost),
            ConnectionState::HostUnavailable
        );
    }
}
