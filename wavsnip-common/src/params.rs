//! Adjustment parameters
//!
//! The scalar knobs applied uniformly to every exported segment: a volume
//! shift in decibels and linear fade-in/fade-out durations in milliseconds.
//! Session-wide state, mutated directly by user input and read once at export
//! time.

use serde::{Deserialize, Serialize};

/// Gain and fade knobs for export processing
///
/// Valid ranges:
/// - `gain_db`: any real value (negative attenuates, positive amplifies)
/// - `fade_in_ms` / `fade_out_ms`: >= 0.0, clamped on set
///
/// Defaults are all zero, which still produces a complete (identity) filter
/// chain at export time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentParams {
    /// Volume shift in decibels
    pub gain_db: f64,
    /// Fade-in duration in milliseconds, applied from each segment's start
    pub fade_in_ms: f64,
    /// Fade-out duration in milliseconds, ending at each segment's end
    pub fade_out_ms: f64,
}

impl AdjustmentParams {
    /// Build a parameter set, clamping fade durations to be non-negative.
    pub fn new(gain_db: f64, fade_in_ms: f64, fade_out_ms: f64) -> Self {
        Self {
            gain_db,
            fade_in_ms: fade_in_ms.max(0.0),
            fade_out_ms: fade_out_ms.max(0.0),
        }
    }

    pub fn set_gain_db(&mut self, gain_db: f64) {
        self.gain_db = gain_db;
    }

    pub fn set_fade_in_ms(&mut self, fade_in_ms: f64) {
        self.fade_in_ms = fade_in_ms.max(0.0);
    }

    pub fn set_fade_out_ms(&mut self, fade_out_ms: f64) {
        self.fade_out_ms = fade_out_ms.max(0.0);
    }

    /// Fade-in duration in seconds, as consumed by the engine filter chain
    pub fn fade_in_seconds(&self) -> f64 {
        self.fade_in_ms / 1000.0
    }

    /// Fade-out duration in seconds, as consumed by the engine filter chain
    pub fn fade_out_seconds(&self) -> f64 {
        self.fade_out_ms / 1000.0
    }
}

impl Default for AdjustmentParams {
    fn default() -> Self {
        Self {
            gain_db: 0.0,
            fade_in_ms: 0.0,
            fade_out_ms: 0.0,
        }
    }
}
