use std::collections::BTreeMap;

/// Manually forced signal states.
///
/// Only signals that were touched appear in the map. While any of them is
/// on, the map replaces live predictions in the broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalEmulator {
    states: BTreeMap<String, bool>,
}

impl SignalEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the value changed
    pub fn set(&mut self, signal: &str, active: bool) -> bool {
        self.states.insert(signal.to_string(), active) != Some(active)
    }

    pub fn is_overriding(&self) -> bool {
        self.states.values().any(|active| *active)
    }

    pub fn states(&self) -> &BTreeMap<String, bool> {
        &self.states
    }

    /// Forget signals that no longer exist
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.states.retain(|name, _| keep(name));
    }

    /// Payload source: the emulation map while overriding, else `live`
    pub fn effective<'a>(&'a self, live: &'a BTreeMap<String, bool>) -> &'a BTreeMap<String, bool> {
        if self.is_overriding() {
            &self.states
        } else {
            live
        }
    }
}
