/// Status transport
///
/// The downstream consumer of status payloads, typically a wireless
/// characteristic. Writes are only attempted while connected.
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::error::TransportError;

pub const DEFAULT_SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914f";
pub const DEFAULT_CHARACTERISTIC_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26a7";

/// Identifiers of the remote service and characteristic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSettings {
    pub service_uuid: String,
    pub characteristic_uuid: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            service_uuid: DEFAULT_SERVICE_UUID.to_string(),
            characteristic_uuid: DEFAULT_CHARACTERISTIC_UUID.to_string(),
        }
    }
}

pub trait StatusTransport: Send {
    fn is_connected(&self) -> bool;

    fn write(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Get transport name (for logging)
    fn name(&self) -> &'static str;
}

/// Writes each payload as one line on stdout; always connected
pub struct StdoutTransport {
    out: io::Stdout,
}

impl StdoutTransport {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTransport for StdoutTransport {
    fn is_connected(&self) -> bool {
        true
    }

    fn write(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut out = self.out.lock();
        out.write_all(payload)
            .and_then(|_| out.write_all(b"\n"))
            .and_then(|_| out.flush())
            .map_err(TransportError::WriteFailed)
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identifiers() {
        let settings = TransportSettings::default();
        assert_eq!(settings.service_uuid, "4fafc201-1fb5-459e-8fcc-c5c9c331914f");
        assert_eq!(settings.characteristic_uuid, "beb5483e-36e1-4688-b7f5-ea07361b26a7");
    }

    #[test]
    fn test_stdout_transport_is_connected() {
        let transport = StdoutTransport::new();
        assert!(transport.is_connected());
        assert_eq!(transport.name(), "stdout");
    }
}
