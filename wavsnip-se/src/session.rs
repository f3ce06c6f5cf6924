//! Editing session state
//!
//! `EditorSession` is the single application-state struct for the tool: the
//! loaded source handle, the ordered segment store, the pending mark, and the
//! adjustment parameters. All transitions are synchronous methods; HTTP
//! handlers act as the dispatcher and decide which events to broadcast based
//! on the returned values.
//!
//! Marking is a two-step state machine: Idle -> (mark_start) -> Marking ->
//! (mark_stop) -> Idle. The only exit from Marking is closing the mark.

use std::sync::Arc;

use uuid::Uuid;
use wavsnip_common::{AdjustmentParams, TimeFrame};

/// Opaque handle to the currently loaded source file
///
/// Owned exclusively by the session; replacing it invalidates the prior
/// waveform view (the slot releases that view before a new one is built).
#[derive(Debug)]
pub struct LoadedAudio {
    /// Handle identity, fresh per load
    pub id: Uuid,
    /// File name as provided by the client
    pub name: String,
    /// Raw undecoded source bytes, staged verbatim into the engine
    pub bytes: Vec<u8>,
    /// When the file was loaded
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Application state for one editing session
#[derive(Debug, Default)]
pub struct EditorSession {
    /// Currently loaded source (None until the first upload)
    audio: Option<Arc<LoadedAudio>>,
    /// Ordered segment store; append-only between loads
    segments: Vec<TimeFrame>,
    /// Pending segment start recorded by mark_start, cleared by mark_stop
    pending_start: Option<f64>,
    /// Session-wide gain/fade knobs
    params: AdjustmentParams,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a new source file.
    ///
    /// Replaces the prior handle and clears the segment store and any pending
    /// mark (both are scoped to the loaded file). Adjustment parameters are
    /// session-wide and survive a reload.
    pub fn load(&mut self, name: String, bytes: Vec<u8>) -> Arc<LoadedAudio> {
        let audio = Arc::new(LoadedAudio {
            id: Uuid::new_v4(),
            name,
            bytes,
            loaded_at: chrono::Utc::now(),
        });
        self.audio = Some(audio.clone());
        self.segments.clear();
        self.pending_start = None;
        audio
    }

    /// Currently loaded source, if any
    pub fn audio(&self) -> Option<Arc<LoadedAudio>> {
        self.audio.clone()
    }

    /// Segment store in insertion order
    pub fn segments(&self) -> &[TimeFrame] {
        &self.segments
    }

    /// Pending mark start position, if a mark is open
    pub fn pending_start(&self) -> Option<f64> {
        self.pending_start
    }

    /// True while a mark is open (Marking state)
    pub fn is_marking(&self) -> bool {
        self.pending_start.is_some()
    }

    pub fn params(&self) -> AdjustmentParams {
        self.params
    }

    /// Replace the adjustment parameters, clamping fade durations.
    /// Returns the effective values.
    pub fn set_params(
        &mut self,
        gain_db: f64,
        fade_in_ms: f64,
        fade_out_ms: f64,
    ) -> AdjustmentParams {
        self.params = AdjustmentParams::new(gain_db, fade_in_ms, fade_out_ms);
        self.params
    }

    /// Record the current position as the pending segment start.
    ///
    /// Silent no-op (returns None) when no audio is loaded or a mark is
    /// already open.
    pub fn mark_start(&mut self, position_seconds: f64) -> Option<f64> {
        if self.audio.is_none() || self.pending_start.is_some() {
            return None;
        }
        self.pending_start = Some(position_seconds);
        self.pending_start
    }

    /// Close the pending mark, appending a segment ending at the given
    /// position.
    ///
    /// The frame is appended verbatim, in (pending start, position) order,
    /// even when the position precedes the recorded start. Silent no-op
    /// (returns None) when no mark is open.
    pub fn mark_stop(&mut self, position_seconds: f64) -> Option<TimeFrame> {
        let start = self.pending_start.take()?;
        let frame = TimeFrame::new(start, position_seconds);
        self.segments.push(frame);
        Some(frame)
    }

    /// True when the export preconditions hold: a file is loaded and the
    /// segment store is non-empty.
    pub fn can_export(&self) -> bool {
        self.audio.is_some() && !self.segments.is_empty()
    }
}
