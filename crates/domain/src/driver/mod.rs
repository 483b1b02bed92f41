mod clock;
mod connection_state;
mod controller_kind;
mod hysteresis;
mod machine_family;
mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use connection_state::{ConnectionState, ControlEvent};
pub use controller_kind::ControllerKind;
pub use hysteresis::{Hysteresis, HysteresisSettings};
pub use machine_family::MachineFamily;
pub use transport::{CncTransport, TransportError};
