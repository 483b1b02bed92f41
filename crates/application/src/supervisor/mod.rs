//! Connection supervision: when to open, close or leave the controller session alone
mod handle_registry;
mod notifier;
mod session;

pub use handle_registry::HandleRegistry;
pub use notifier::{StatusMessage, StatusNotifier};
pub use session::Session;

use std::sync::Arc;

use domain::driver::Hysteresis;
use domain::{
    Clock, CncTransport, ConnectionState, DomainError, ErrorAction, ErrorClassifier,
    HysteresisSettings, MethodAvailabilityCache, TransportError,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Hysteresis-governed owner of one controller session.
///
/// All connect and disconnect I/O happens inside [`ConnectionSupervisor::evaluate`].
/// Callbacks running elsewhere only queue messages through a [`StatusNotifier`].
pub struct ConnectionSupervisor<T: CncTransport> {
    driver_id: String,
    transport: T,
    registry: HandleRegistry<T::Handle>,
    classifier: Arc<dyn ErrorClassifier>,
    clock: Arc<dyn Clock>,
    hysteresis: Hysteresis,
    availability: MethodAvailabilityCache,
    state: ConnectionState,
    disconnect_requested: bool,
    session_broken: bool,
    halted: bool,
    inbox: mpsc::UnboundedReceiver<StatusMessage>,
    notifier: StatusNotifier,
}

impl<T: CncTransport> ConnectionSupervisor<T> {
    pub fn new(
        driver_id: impl Into<String>,
        transport: T,
        classifier: Arc<dyn ErrorClassifier>,
        clock: Arc<dyn Clock>,
        settings: HysteresisSettings,
    ) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        Self {
            driver_id: driver_id.into(),
            transport,
            registry: HandleRegistry::new(),
            classifier,
            clock,
            hysteresis: Hysteresis::new(settings),
            availability: MethodAvailabilityCache::new(),
            state: ConnectionState::default(),
            disconnect_requested: false,
            session_broken: false,
            halted: false,
            inbox,
            notifier: StatusNotifier::new(tx),
        }
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    /// Sender for callback contexts
    pub fn notifier(&self) -> StatusNotifier {
        self.notifier.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// True when acquisition code may use the session this cycle
    pub fn is_usable(&self) -> bool {
        !self.halted && !self.session_broken && self.registry.is_held() && self.state.is_usable()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn has_session(&self) -> bool {
        self.registry.is_held()
    }

    pub fn disconnect_requested(&self) -> bool {
        self.disconnect_requested
    }

    pub fn request_disconnect(&mut self) {
        if !self.disconnect_requested {
            info!(driver_id = %self.driver_id, "Disconnect requested");
        }
        self.disconnect_requested = true;
    }

    pub fn cancel_disconnect_request(&mut self) {
        if self.disconnect_requested {
            info!(driver_id = %self.driver_id, "Disconnect request cancelled");
        }
        self.disconnect_requested = false;
    }

    pub fn is_operation_available(&self, operation: &str) -> bool {
        self.availability.is_available(operation)
    }

    pub fn availability(&self) -> &MethodAvailabilityCache {
        &self.availability
    }

    /// Lend the live session to a reader. Fails when the session is not usable.
    pub fn session(&mut self) -> Result<Session<'_, T>, DomainError> {
        if self.halted {
            return Err(DomainError::Halted);
        }
        if !self.is_usable() {
            return Err(DomainError::NotConnected);
        }
        Ok(Session::new(self))
    }

    /// One acquisition cycle entry: apply queued messages, refresh the polled
    /// state, then decide. Returns whether the session is usable.
    pub async fn run_cycle(&mut self) -> bool {
        self.drain_inbox();
        self.refresh_state().await;
        let healthy = self.is_usable();
        let disconnect_permitted = self.registry.is_held();
        self.evaluate(healthy, disconnect_permitted).await;
        self.is_usable()
    }

    /// Decision step, called once per acquisition cycle before any read
    pub async fn evaluate(&mut self, healthy: bool, disconnect_permitted: bool) {
        self.drain_inbox();

        if self.halted {
            debug!(driver_id = %self.driver_id, "Acquisition halted, nothing to evaluate");
            return;
        }

        if self.disconnect_requested && !disconnect_permitted {
            info!(driver_id = %self.driver_id, "Disconnect request dropped, no session to close");
            self.disconnect_requested = false;
        }

        if self.disconnect_requested {
            self.disconnect().await;
            return;
        }

        if healthy {
            return;
        }

        if disconnect_permitted {
            if self.hysteresis.secure_duration_elapsed(self.clock.now()) {
                self.disconnect().await;
            } else {
                warn!(
                    driver_id = %self.driver_id,
                    "Session unhealthy but recently established, waiting"
                );
            }
        } else {
            self.connect().await;
        }
    }

    /// Classify a failed foreign call and apply the resulting action
    pub fn report_error(&mut self, error: &TransportError) -> ErrorAction {
        self.absorb(&error.operation, error)
    }

    /// Close any live session regardless of hysteresis
    pub async fn shutdown(&mut self) {
        self.release_handle().await;
    }

    fn absorb(&mut self, operation: &str, error: &TransportError) -> ErrorAction {
        let action = self.classifier.classify(operation, error.code);
        match &action {
            ErrorAction::Ignore => {
                debug!(driver_id = %self.driver_id, operation, code = error.code, error = %error, "Controller call failed");
            }
            ErrorAction::MarkUnavailable(name) => {
                if self.availability.mark_unavailable(name.clone()) {
                    info!(driver_id = %self.driver_id, operation = %name, code = error.code, "Operation not supported by this controller");
                }
            }
            ErrorAction::ForceDisconnect => {
                warn!(driver_id = %self.driver_id, operation, code = error.code, error = %error, "Session broken");
                self.session_broken = true;
                if self.registry.is_held() {
                    self.disconnect_requested = true;
                }
            }
            ErrorAction::FatalHalt => {
                error!(driver_id = %self.driver_id, operation, code = error.code, error = %error, "Fatal controller error, acquisition halted");
                self.halted = true;
            }
        }
        action
    }

    fn drain_inbox(&mut self) {
        while let Ok(message) = self.inbox.try_recv() {
            match message {
                StatusMessage::Event(event) => {
                    let next = self.state.on_event(event);
                    debug!(driver_id = %self.driver_id, ?event, from = %self.state, to = %next, "Control event");
                    self.set_state(next);
                }
                StatusMessage::RequestDisconnect => self.request_disconnect(),
                StatusMessage::CancelDisconnectRequest => self.cancel_disconnect_request(),
            }
        }
    }

    async fn refresh_state(&mut self) {
        if self.halted {
            return;
        }
        let Some(handle) = self.registry.get() else {
            return;
        };
        match self.transport.control_state(handle).await {
            Ok(Some(state)) => self.set_state(state),
            Ok(None) => {}
            Err(e) => {
                self.report_error(&e);
            }
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        let previous = self.state;
        if previous == next {
            return;
        }
        self.state = next;

        match next {
            ConnectionState::Available => {
                info!(driver_id = %self.driver_id, from = %previous, "Controller available");
            }
            s if s.requires_release() && self.registry.is_held() => {
                error!(driver_id = %self.driver_id, from = %previous, to = %next, "Controller lost");
            }
            s if s.requires_release() => {
                info!(driver_id = %self.driver_id, from = %previous, to = %next, "Controller state changed");
            }
            _ => {
                warn!(driver_id = %self.driver_id, from = %previous, to = %next, "Controller state changed");
            }
        }

        if next.is_usable() && self.disconnect_requested {
            info!(driver_id = %self.driver_id, "New session available, disconnect request cleared");
            self.disconnect_requested = false;
        }
        if next.requires_release() && self.registry.is_held() {
            self.request_disconnect();
        }
    }

    async fn connect(&mut self) {
        if self.registry.is_held() {
            debug!(driver_id = %self.driver_id, "Session already open");
            return;
        }
        let now = self.clock.now();
        if !self.hysteresis.permits(now) {
            warn!(driver_id = %self.driver_id, "Connect deferred by hysteresis");
            return;
        }
        self.hysteresis.record_connect_attempt(now);

        info!(driver_id = %self.driver_id, transport = self.transport.name(), "Opening controller session");
        let handle = match self.transport.open().await {
            Ok(handle) => handle,
            Err(e) => {
                error!(driver_id = %self.driver_id, error = %e, "Failed to open controller session");
                self.report_error(&e);
                self.set_state(ConnectionState::Uninitialized);
                return;
            }
        };

        let connected_at = self.clock.now();
        if let Err(handle) = self.registry.acquire(handle, connected_at) {
            warn!(driver_id = %self.driver_id, "Handle slot occupied, closing the new session");
            if let Err(e) = self.transport.close(handle).await {
                warn!(driver_id = %self.driver_id, error = %e, "Failed to close surplus session");
            }
            return;
        }
        self.hysteresis.record_connected(connected_at);
        self.availability.reset();
        self.session_broken = false;

        let polled = match self.registry.get() {
            Some(handle) => self.transport.control_state(handle).await,
            None => Ok(None),
        };
        match polled {
            Ok(Some(state)) => self.set_state(state),
            Ok(None) => self.set_state(ConnectionState::Available),
            Err(e) => {
                self.report_error(&e);
            }
        }
    }

    async fn disconnect(&mut self) {
        let now = self.clock.now();
        if !self.hysteresis.permits(now) {
            warn!(driver_id = %self.driver_id, "Disconnect deferred by hysteresis");
            return;
        }
        self.hysteresis.record_disconnect(now);
        self.disconnect_requested = false;
        self.release_handle().await;
    }

    async fn release_handle(&mut self) {
        match self.registry.release() {
            Some(handle) => {
                info!(driver_id = %self.driver_id, "Closing controller session");
                if let Err(e) = self.transport.close(handle).await {
                    error!(driver_id = %self.driver_id, error = %e, "Close failed, session dropped anyway");
                }
            }
            None => debug!(driver_id = %self.driver_id, "No session to close"),
        }
        self.session_broken = false;
        self.set_state(ConnectionState::Uninitialized);
    }
}
