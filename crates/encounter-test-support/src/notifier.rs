//! Recording notifier: captures every notice for assertions.

use std::sync::Mutex;

use encounter_core::ids::PlayerId;
use encounter_core::notify::{Notice, Notifier};

/// A notifier that records every notice it is given.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(PlayerId, Notice)>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded notices.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn notices(&self) -> Vec<(PlayerId, Notice)> {
        self.notices.lock().unwrap().clone()
    }

    /// Recorded notices, excluding per-cycle navigation hints.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn alerts(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, n)| !matches!(n, Notice::Navigation { .. }))
            .map(|(_, n)| n.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, player: PlayerId, notice: &Notice) {
        self.notices.lock().unwrap().push((player, notice.clone()));
    }
}
