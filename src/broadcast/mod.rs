/// Status broadcast module
///
/// Turns per-signal recognition state into the `name:bool,` payload and
/// delivers it to a transport, debounced.

pub mod broadcaster;
pub mod emulation;
pub mod status;
pub mod transport;

pub use broadcaster::{StatusBroadcaster, StatusPublisher};
pub use emulation::SignalEmulator;
pub use status::{encode_status, format_status};
pub use transport::{
    StatusTransport, StdoutTransport, TransportSettings, DEFAULT_CHARACTERISTIC_UUID,
    DEFAULT_SERVICE_UUID,
};
