//! Waveform view lifecycle
//!
//! The editor consumes the waveform renderer as a capability set behind the
//! `WaveformView` trait: load a source, toggle playback, read the position,
//! adjust zoom, release. `WaveformSlot` owns at most one live view and
//! enforces the one genuine resource-lifecycle rule in the system: a prior
//! view is always released before a replacement is constructed.

pub mod decode;
mod view;

pub use decode::{WaveformData, BASE_PEAK_BUCKETS};
pub use view::{DecodedWaveform, TransportClock};

use std::sync::Arc;

use wavsnip_common::TransportState;

use crate::session::LoadedAudio;

/// Capability set consumed from a waveform renderer instance
///
/// Loading is fire-and-forget: `begin_load` returns immediately and readiness
/// is observed through `is_ready` (and the WaveformReady event). Transport,
/// marking, and peak queries are gated on readiness by the callers.
pub trait WaveformView: Send + Sync {
    /// Start loading the source asynchronously. May be called once per view.
    fn begin_load(&self, audio: Arc<LoadedAudio>);

    /// True once decoding finished and the view can serve transport and
    /// peak queries. Always false after `release`.
    fn is_ready(&self) -> bool;

    /// Decoded source duration in seconds (0.0 until ready)
    fn duration_seconds(&self) -> f64;

    /// Current transport state (Paused until ready)
    fn transport_state(&self) -> TransportState;

    /// Toggle between Playing and Paused.
    ///
    /// Returns the (old, new) states, or None when the view is not ready.
    fn play_pause(&self) -> Option<(TransportState, TransportState)>;

    /// Current playback position in seconds, clamped to the duration
    fn position_seconds(&self) -> f64;

    /// Set the zoom level (0-200)
    fn set_zoom(&self, level: u16);

    /// Current zoom level
    fn zoom(&self) -> u16;

    /// Peak amplitudes resampled to `buckets` values, or None until ready
    fn peaks(&self, buckets: usize) -> Option<Vec<f32>>;

    /// Release the view's resources. Must complete before a replacement view
    /// is constructed; a released view never becomes ready.
    fn release(&self);
}

/// Owned slot for the single live waveform view
///
/// Replacing the loaded file goes through `replace_with`, which releases the
/// prior instance before invoking the builder for the new one, so two live
/// instances never coexist.
#[derive(Default)]
pub struct WaveformSlot {
    view: Option<Box<dyn WaveformView>>,
}

impl WaveformSlot {
    pub fn new() -> Self {
        Self { view: None }
    }

    /// Release any prior view, then install the view produced by `build`.
    pub fn replace_with(
        &mut self,
        build: impl FnOnce() -> Box<dyn WaveformView>,
    ) -> &dyn WaveformView {
        if let Some(prior) = self.view.take() {
            prior.release();
        }
        let _ = self.view.insert(build());
        self.view.as_deref().unwrap()
    }

    /// The live view, if one is installed
    pub fn view(&self) -> Option<&dyn WaveformView> {
        self.view.as_deref()
    }

    /// Release and drop the live view
    pub fn clear(&mut self) {
        if let Some(prior) = self.view.take() {
            prior.release();
        }
    }
}
