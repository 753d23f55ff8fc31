/// Debounced status broadcaster
///
/// Runs on its own thread. Every update cancels the pending write and
/// restarts the quiet period, so only the latest status is written, at most
/// once per debounce interval. Each quiet period ends in a write even when
/// the text is unchanged. Writes are skipped while the transport is
/// disconnected; on reconnection the latest status is written again.
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use super::emulation::SignalEmulator;
use super::status::{describe_payload, encode_status, format_status};
use super::transport::StatusTransport;
use crate::detection::Predictions;
use crate::utils::Debouncer;

/// How often connection state is checked while idle
const CONNECTION_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
enum StatusUpdate {
    Predictions(Predictions),
    Emulate { signal: String, active: bool },
    RetainSignals(Vec<String>),
    Shutdown,
}

/// Cheap handle for feeding the broadcaster
#[derive(Clone)]
pub struct StatusPublisher {
    tx: Sender<StatusUpdate>,
}

impl StatusPublisher {
    pub fn publish_predictions(&self, predictions: Predictions) {
        let _ = self.tx.send(StatusUpdate::Predictions(predictions));
    }

    pub fn set_emulation(&self, signal: &str, active: bool) {
        let _ = self.tx.send(StatusUpdate::Emulate {
            signal: signal.to_string(),
            active,
        });
    }

    /// Drop emulation entries for signals not in `names`
    pub fn retain_signals(&self, names: Vec<String>) {
        let _ = self.tx.send(StatusUpdate::RetainSignals(names));
    }
}

pub struct StatusBroadcaster {
    tx: Sender<StatusUpdate>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StatusBroadcaster {
    pub fn spawn(transport: Box<dyn StatusTransport>, debounce: Duration) -> std::io::Result<Self> {
        let (tx, rx) = unbounded();
        tracing::info!(
            "Status broadcaster started ({}, debounce {} ms)",
            transport.name(),
            debounce.as_millis()
        );

        let handle = thread::Builder::new()
            .name("status-broadcast".to_string())
            .spawn(move || {
                let mut worker = BroadcastWorker::new(transport, debounce);
                worker.run(rx);
            })?;

        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    pub fn publisher(&self) -> StatusPublisher {
        StatusPublisher {
            tx: self.tx.clone(),
        }
    }

    /// Stop the thread; a pending write is flushed first
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(StatusUpdate::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusBroadcaster {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct BroadcastWorker {
    transport: Box<dyn StatusTransport>,
    debouncer: Debouncer<Vec<u8>>,
    emulator: SignalEmulator,
    live: Option<Predictions>,
    latest: Option<Vec<u8>>,
    connected: bool,
}

impl BroadcastWorker {
    fn new(transport: Box<dyn StatusTransport>, debounce: Duration) -> Self {
        let connected = transport.is_connected();
        Self {
            transport,
            debouncer: Debouncer::with_duration(debounce),
            emulator: SignalEmulator::new(),
            live: None,
            latest: None,
            connected,
        }
    }

    fn run(&mut self, rx: Receiver<StatusUpdate>) {
        loop {
            let wait = self
                .debouncer
                .deadline()
                .unwrap_or_else(|| Instant::now() + CONNECTION_POLL);

            match rx.recv_deadline(wait) {
                Ok(StatusUpdate::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                    self.flush();
                    break;
                }
                Ok(update) => self.handle(update, Instant::now()),
                Err(RecvTimeoutError::Timeout) => {}
            }

            self.poll(Instant::now());
        }
        tracing::debug!("Status broadcaster stopped");
    }

    fn handle(&mut self, update: StatusUpdate, now: Instant) {
        match update {
            StatusUpdate::Predictions(predictions) => self.live = Some(predictions),
            StatusUpdate::Emulate { signal, active } => {
                if !self.emulator.set(&signal, active) {
                    return;
                }
                // The release is sent even with no live status yet
                if !self.emulator.is_overriding() && self.live.is_none() {
                    self.live = Some(Predictions::new());
                }
            }
            StatusUpdate::RetainSignals(names) => {
                self.emulator.retain(|name| names.iter().any(|n| n == name));
            }
            StatusUpdate::Shutdown => return,
        }
        self.schedule(now);
    }

    /// Recompute the outgoing payload and restart the quiet period
    fn schedule(&mut self, now: Instant) {
        let payload = match &self.live {
            Some(live) => Some(format_status(self.emulator.effective(live))),
            None => self
                .emulator
                .is_overriding()
                .then(|| format_status(self.emulator.states())),
        };

        if let Some(text) = payload {
            let bytes = encode_status(&text);
            self.latest = Some(bytes.clone());
            self.debouncer.push(bytes, now);
        }
    }

    /// Track connection changes and write a payload whose quiet period ended
    fn poll(&mut self, now: Instant) {
        let connected = self.transport.is_connected();
        if connected != self.connected {
            self.connected = connected;
            if connected {
                tracing::info!("Transport {} connected", self.transport.name());
                if let Some(latest) = self.latest.clone() {
                    self.debouncer.push(latest, now);
                }
            } else {
                tracing::info!("Transport {} disconnected", self.transport.name());
            }
        }

        if let Some(payload) = self.debouncer.take_ready(now) {
            self.write(payload);
        }
    }

    fn flush(&mut self) {
        if let Some(deadline) = self.debouncer.deadline() {
            if let Some(payload) = self.debouncer.take_ready(deadline) {
                self.write(payload);
            }
        }
    }

    fn write(&mut self, payload: Vec<u8>) {
        if !self.transport.is_connected() {
            tracing::trace!("Transport not connected, status skipped");
            return;
        }

        match self.transport.write(&payload) {
            Ok(()) => tracing::trace!("Status sent: {}", describe_payload(&payload)),
            Err(err) => tracing::warn!("Status write failed: {err}"),
        }
    }
}
