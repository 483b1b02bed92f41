use domain::ControlEvent;
use tokio::sync::mpsc;

/// Message queued by a callback context for the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    Event(ControlEvent),
    RequestDisconnect,
    CancelDisconnectRequest,
}

/// Cloneable sender for controller callbacks.
///
/// Sending never performs I/O; messages are applied at the start of the next
/// supervisor evaluation.
#[derive(Debug, Clone)]
pub struct StatusNotifier {
    tx: mpsc::UnboundedSender<StatusMessage>,
}

impl StatusNotifier {
    pub(crate) fn new(tx: mpsc::UnboundedSender<StatusMessage>) -> Self {
        Self { tx }
    }

    /// Returns false once the supervisor is gone
    pub fn push_event(&self, event: ControlEvent) -> bool {
        self.tx.send(StatusMessage::Event(event)).is_ok()
    }

    pub fn request_disconnect(&self) -> bool {
        self.tx.send(StatusMessage::RequestDisconnect).is_ok()
    }

    pub fn cancel_disconnect_request(&self) -> bool {
        self.tx.send(StatusMessage::CancelDisconnectRequest).is_ok()
    }
}
