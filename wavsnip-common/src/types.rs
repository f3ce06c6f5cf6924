//! Shared editor types
//!
//! Core value types used by both the editing session and the event stream.

use serde::{Deserialize, Serialize};

/// A user-selected time range to be extracted from the source audio.
///
/// Frames are recorded exactly as marked: insertion order is preserved and
/// duplicates, overlaps, and reversed ranges (`end < start`) are all legal.
/// A frame is never mutated after it is appended to the segment store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeFrame {
    /// Segment start in seconds from the beginning of the source (>= 0).
    pub start: f64,
    /// Segment end in seconds. Recorded verbatim, even when it precedes `start`.
    pub end: f64,
}

impl TimeFrame {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Signed duration in seconds. Negative for reversed frames.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True when the frame was closed before its recorded start position.
    pub fn is_reversed(&self) -> bool {
        self.end < self.start
    }
}

/// Transport state of the waveform view (Playing or Paused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    Playing,
    Paused,
}

impl TransportState {
    /// The opposite state, for play/pause toggling
    pub fn toggled(self) -> Self {
        match self {
            TransportState::Playing => TransportState::Paused,
            TransportState::Paused => TransportState::Playing,
        }
    }
}

impl Default for TransportState {
    fn default() -> Self {
        TransportState::Paused
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportState::Playing => write!(f, "playing"),
            TransportState::Paused => write!(f, "paused"),
        }
    }
}
