// Integration tests for HandSignal
// These drive the public API end to end: detector -> session -> transport

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use handsignal::broadcast::StatusTransport;
use handsignal::detection::HandDetector;
use handsignal::error::TransportError;
use handsignal::messaging::{Command, CommandResult, Event};
use handsignal::state::AcquisitionMode;
use handsignal::{
    Config, DetectionError, Frame, Landmark, Session, Settings, Signal, SignalStore, Snapshot,
    MAX_SIGNALS,
};

/// Replays a fixed list of detector results, then reports exhaustion
struct ScriptedDetector {
    results: VecDeque<Result<Vec<Frame>, DetectionError>>,
}

impl ScriptedDetector {
    fn new(results: Vec<Result<Vec<Frame>, DetectionError>>) -> Box<Self> {
        Box::new(Self {
            results: results.into(),
        })
    }
}

impl HandDetector for ScriptedDetector {
    fn detect(&mut self) -> Result<Vec<Frame>, DetectionError> {
        self.results.pop_front().unwrap_or(Err(DetectionError::Exhausted))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn is_exhausted(&self) -> bool {
        self.results.is_empty()
    }
}

/// Never runs dry; counts calls
struct EndlessDetector {
    calls: Arc<AtomicUsize>,
    frame: Frame,
}

impl HandDetector for EndlessDetector {
    fn detect(&mut self) -> Result<Vec<Frame>, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.frame.clone()])
    }

    fn name(&self) -> &'static str {
        "endless"
    }
}

#[derive(Clone, Default)]
struct RecordingTransport {
    connected: Arc<AtomicBool>,
    payloads: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingTransport {
    fn connected() -> Self {
        let transport = Self::default();
        transport.connected.store(true, Ordering::SeqCst);
        transport
    }

    fn texts(&self) -> Vec<String> {
        self.payloads
            .lock()
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

impl StatusTransport for RecordingTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn write(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.payloads.lock().push(payload.to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn fast_settings() -> Settings {
    let config: Config = serde_json::from_str(
        r#"{
            "warmup_ms": 0,
            "frame_interval_ms": 1,
            "broadcast_debounce_ms": 5,
            "record_timeout_ms": 60000
        }"#,
    )
    .unwrap();
    config.resolve()
}

fn hand_f() -> Frame {
    Frame::new(std::array::from_fn(|i| {
        let i = i as f64;
        Landmark::new(0.42 + 0.013 * i, 0.77 - 0.021 * i, -0.002 * i)
    }))
}

fn perturbed_f() -> Frame {
    let point = hand_f()[5];
    hand_f().with_landmark(5, Landmark::new(point.x + 0.1, point.y, point.z))
}

fn store_of(name: &str, frame: Frame, copies: usize) -> SignalStore {
    SignalStore::from_signals(vec![Signal::with_snapshots(
        name,
        vec![Snapshot::new(frame, 1_700_000_000_000); copies],
    )])
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("handsignal-it-{}", std::process::id()))
        .join(name)
}

#[test]
fn test_recognition_scenario_reaches_transport() {
    let transport = RecordingTransport::connected();
    let session = Session::with_transport(fast_settings(), Box::new(transport.clone())).unwrap();
    let (events, _id) = session.event_bus().subscribe();

    session
        .import_json(&store_of("F", hand_f(), 5).to_json().unwrap(), None)
        .unwrap();

    session
        .start_detection(ScriptedDetector::new(vec![
            Ok(vec![hand_f()]),
            Ok(vec![perturbed_f()]),
        ]))
        .unwrap();
    session.wait_for_detection();
    session.shutdown();

    let predictions: Vec<bool> = events
        .try_iter()
        .filter_map(|event| match event {
            Event::PredictionsUpdated { predictions } => predictions.get("F").copied(),
            _ => None,
        })
        .collect();
    assert_eq!(predictions, vec![true, false]);

    let texts = transport.texts();
    assert_eq!(texts.last().map(String::as_str), Some("F:false,"));
    assert!(texts.iter().all(|t| t == "F:true," || t == "F:false,"));
}

#[test]
fn test_multi_hand_or_and_swallowed_failures() {
    let session = Session::new(fast_settings());
    session
        .import_json(&store_of("F", hand_f(), 3).to_json().unwrap(), None)
        .unwrap();

    session
        .start_detection(ScriptedDetector::new(vec![
            Err(DetectionError::DetectorFailed("dropped frame".into())),
            Ok(vec![perturbed_f(), hand_f().translated(0.2, 0.1, 0.0)]),
        ]))
        .unwrap();
    session.wait_for_detection();

    assert_eq!(session.predictions().get("F"), Some(&true));
    assert!(session.process_state().is_stopped());
}

#[test]
fn test_recording_export_import_round_trip() {
    let session = Session::new(fast_settings());
    assert_eq!(
        session.execute(Command::CreateSignal {
            name: "wave".to_string()
        }),
        CommandResult::Success
    );
    assert_eq!(session.execute(Command::Record), CommandResult::Success);
    assert_eq!(
        session.mode(),
        AcquisitionMode::Recording {
            target: "wave".to_string()
        }
    );

    session
        .start_detection(ScriptedDetector::new(vec![
            Ok(vec![hand_f()]),
            Ok(vec![]),
            Ok(vec![hand_f(), perturbed_f()]),
        ]))
        .unwrap();
    session.wait_for_detection();

    // Recording is unconditional: one snapshot per detected hand
    assert_eq!(session.store().get("wave").unwrap().len(), 3);

    let path = temp_path("exported.json");
    let result = session.execute(Command::ExportSignals {
        path: Some(path.clone()),
    });
    assert_eq!(result, CommandResult::SuccessWithValue(path.display().to_string()));

    let restored = Session::new(fast_settings());
    assert_eq!(
        restored.execute(Command::ImportSignals { path: path.clone() }),
        CommandResult::Success
    );
    assert_eq!(restored.store(), session.store());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_auto_learning_grows_signal_and_clears_selection() {
    let session = Session::new(fast_settings());
    session
        .import_json(&store_of("F", hand_f(), 10).to_json().unwrap(), None)
        .unwrap();
    session.select_signal(Some("F")).unwrap();
    assert!(session.toggle_learning());

    session
        .start_detection(ScriptedDetector::new(vec![
            Ok(vec![hand_f()]),
            Ok(vec![perturbed_f()]),
            Ok(vec![hand_f().translated(-0.05, 0.0, 0.01)]),
        ]))
        .unwrap();
    session.wait_for_detection();

    assert_eq!(session.store().get("F").unwrap().len(), 12);
    assert!(session.selected().is_none());
    assert_eq!(session.mode(), AcquisitionMode::AutoLearning);
}

#[test]
fn test_signal_cap() {
    let session = Session::new(fast_settings());
    for i in 0..MAX_SIGNALS {
        session.create_signal(&format!("signal-{i}")).unwrap();
    }
    assert!(session.create_signal("one-too-many").is_err());
    assert_eq!(session.store().len(), MAX_SIGNALS);
}

#[test]
fn test_stop_halts_frames() {
    let session = Session::new(fast_settings());
    session
        .import_json(&store_of("F", hand_f(), 3).to_json().unwrap(), None)
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    session
        .start_detection(Box::new(EndlessDetector {
            calls: Arc::clone(&calls),
            frame: hand_f(),
        }))
        .unwrap();
    assert!(matches!(
        session.start_detection(ScriptedDetector::new(vec![])),
        Err(DetectionError::AlreadyRunning)
    ));

    std::thread::sleep(Duration::from_millis(30));
    session.stop_detection().unwrap();
    let after_stop = calls.load(Ordering::SeqCst);
    assert!(after_stop > 0);

    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    assert!(session.process_state().is_stopped());
}

#[test]
fn test_emulation_overrides_broadcast() {
    let transport = RecordingTransport::connected();
    let session = Session::with_transport(fast_settings(), Box::new(transport.clone())).unwrap();
    session.create_signal("horn").unwrap();

    session.set_emulation("horn", true).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    session.set_emulation("horn", false).unwrap();
    session.shutdown();

    // Releasing the only override falls back to the (empty) live status
    assert_eq!(transport.texts(), vec!["horn:true,".to_string(), ",".to_string()]);
}

#[test]
fn test_steady_gesture_keeps_writing() {
    let transport = RecordingTransport::connected();
    let mut settings = fast_settings();
    settings.timing.frame_interval = Duration::from_millis(20);
    let session = Session::with_transport(settings, Box::new(transport.clone())).unwrap();
    session
        .import_json(&store_of("F", hand_f(), 3).to_json().unwrap(), None)
        .unwrap();

    session
        .start_detection(ScriptedDetector::new(
            (0..4).map(|_| Ok(vec![hand_f()])).collect(),
        ))
        .unwrap();
    session.wait_for_detection();
    session.shutdown();

    let texts = transport.texts();
    assert!(texts.len() >= 2, "only {} writes", texts.len());
    assert!(texts.iter().all(|t| t == "F:true,"));
}

#[test]
fn test_disconnected_transport_gets_nothing() {
    let transport = RecordingTransport::default();
    let session = Session::with_transport(fast_settings(), Box::new(transport.clone())).unwrap();
    session
        .import_json(&store_of("F", hand_f(), 3).to_json().unwrap(), None)
        .unwrap();

    session
        .start_detection(ScriptedDetector::new(vec![Ok(vec![hand_f()])]))
        .unwrap();
    session.wait_for_detection();
    session.shutdown();

    assert!(transport.texts().is_empty());
}
