//! Shared application state
//!
//! Thread-safe shared state wired through every HTTP handler: the editing
//! session, the waveform view slot, the export busy flag, and the event bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::RwLock;
use wavsnip_common::EventBus;

use crate::session::EditorSession;
use crate::waveform::WaveformSlot;

/// Shared state accessible by all handlers
pub struct SharedState {
    /// Editing session (segments, pending mark, parameters, loaded audio)
    pub session: RwLock<EditorSession>,

    /// Owned slot for the single live waveform view. Guarded by a sync
    /// mutex; slot operations are short and never await.
    pub waveform: Mutex<WaveformSlot>,

    /// Event broadcaster for SSE clients
    pub events: EventBus,

    /// True while an export run is in flight. A second export is rejected
    /// rather than queued.
    exporting: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            session: RwLock::new(EditorSession::new()),
            waveform: Mutex::new(WaveformSlot::new()),
            events: EventBus::new(1000),
            exporting: AtomicBool::new(false),
        }
    }

    /// Claim the export busy flag. Returns false when an export is already
    /// in flight.
    pub fn begin_export(&self) -> bool {
        self.exporting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Return the busy flag to idle. Called on success and failure alike.
    pub fn end_export(&self) {
        self.exporting.store(false, Ordering::SeqCst);
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::SeqCst)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
