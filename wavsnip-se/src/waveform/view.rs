//! Decoded waveform view
//!
//! `DecodedWaveform` backs the `WaveformView` capability set with a symphonia
//! decode (run off the async runtime) and a monotonic transport clock. The
//! view starts unready; readiness flips once decoding completes and is
//! announced on the event bus. A released view never becomes ready, so a
//! replacement installed while a stale decode is still running cannot be
//! shadowed by it.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::debug;
use uuid::Uuid;
use wavsnip_common::{EventBus, SnipEvent, TransportState};

use crate::error::{Error, Result};
use crate::session::LoadedAudio;
use crate::waveform::decode::{self, WaveformData};
use crate::waveform::WaveformView;

/// Play/pause position clock
///
/// Position advances only while playing and clamps to the source duration.
#[derive(Debug)]
pub struct TransportClock {
    duration: f64,
    /// Accumulated position at the last pause
    base: f64,
    /// Set while playing
    started_at: Option<Instant>,
}

impl TransportClock {
    /// New clock, paused at position zero
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            base: 0.0,
            started_at: None,
        }
    }

    pub fn state(&self) -> TransportState {
        if self.started_at.is_some() {
            TransportState::Playing
        } else {
            TransportState::Paused
        }
    }

    /// Current position in seconds, clamped to [0, duration]
    pub fn position(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|t0| t0.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base + elapsed).min(self.duration)
    }

    /// Toggle between Playing and Paused, returning (old, new) states.
    pub fn toggle(&mut self) -> (TransportState, TransportState) {
        let old = self.state();
        match self.started_at.take() {
            Some(t0) => {
                // Pausing: fold the running time into the base position
                self.base = (self.base + t0.elapsed().as_secs_f64()).min(self.duration);
            }
            None => {
                self.started_at = Some(Instant::now());
            }
        }
        (old, self.state())
    }
}

/// Ready-state payload: decode output plus the transport clock
struct Loaded {
    data: WaveformData,
    clock: TransportClock,
}

struct ViewInner {
    audio_id: Uuid,
    events: EventBus,
    zoom: AtomicU16,
    released: AtomicBool,
    loaded: Mutex<Option<Loaded>>,
}

impl ViewInner {
    /// Publish a finished decode. Silently dropped when the view was
    /// released while the decode was still running.
    fn finish_load(&self, result: Result<WaveformData>) {
        if self.released.load(Ordering::SeqCst) {
            debug!("discarding decode result for released view {}", self.audio_id);
            return;
        }
        match result {
            Ok(data) => {
                let duration_seconds = data.duration_seconds;
                {
                    let mut guard = self.loaded.lock().unwrap();
                    *guard = Some(Loaded {
                        clock: TransportClock::new(duration_seconds),
                        data,
                    });
                }
                self.events.emit(SnipEvent::WaveformReady {
                    audio_id: self.audio_id,
                    duration_seconds,
                    timestamp: chrono::Utc::now(),
                });
            }
            Err(e) => {
                self.events.emit(SnipEvent::WaveformFailed {
                    audio_id: self.audio_id,
                    message: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
        }
    }
}

/// Waveform view backed by an in-process decode of the loaded bytes
pub struct DecodedWaveform {
    inner: Arc<ViewInner>,
}

impl DecodedWaveform {
    pub fn new(audio_id: Uuid, events: EventBus) -> Self {
        Self {
            inner: Arc::new(ViewInner {
                audio_id,
                events,
                zoom: AtomicU16::new(0),
                released: AtomicBool::new(false),
                loaded: Mutex::new(None),
            }),
        }
    }

    #[cfg(test)]
    fn finish_load(&self, result: Result<WaveformData>) {
        self.inner.finish_load(result);
    }
}

impl WaveformView for DecodedWaveform {
    fn begin_load(&self, audio: Arc<LoadedAudio>) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let decoded =
                tokio::task::spawn_blocking(move || decode::decode_waveform(&audio.name, &audio.bytes))
                    .await
                    .unwrap_or_else(|e| Err(Error::Decode(format!("decode task failed: {}", e))));
            inner.finish_load(decoded);
        });
    }

    fn is_ready(&self) -> bool {
        !self.inner.released.load(Ordering::SeqCst)
            && self.inner.loaded.lock().unwrap().is_some()
    }

    fn duration_seconds(&self) -> f64 {
        self.inner
            .loaded
            .lock()
            .unwrap()
            .as_ref()
            .map(|l| l.data.duration_seconds)
            .unwrap_or(0.0)
    }

    fn transport_state(&self) -> TransportState {
        self.inner
            .loaded
            .lock()
            .unwrap()
            .as_ref()
            .map(|l| l.clock.state())
            .unwrap_or_default()
    }

    fn play_pause(&self) -> Option<(TransportState, TransportState)> {
        let mut guard = self.inner.loaded.lock().unwrap();
        guard.as_mut().map(|l| l.clock.toggle())
    }

    fn position_seconds(&self) -> f64 {
        self.inner
            .loaded
            .lock()
            .unwrap()
            .as_ref()
            .map(|l| l.clock.position())
            .unwrap_or(0.0)
    }

    fn set_zoom(&self, level: u16) {
        self.inner.zoom.store(level, Ordering::SeqCst);
    }

    fn zoom(&self) -> u16 {
        self.inner.zoom.load(Ordering::SeqCst)
    }

    fn peaks(&self, buckets: usize) -> Option<Vec<f32>> {
        self.inner
            .loaded
            .lock()
            .unwrap()
            .as_ref()
            .map(|l| decode::bucket_peaks(&l.data.peaks, buckets))
    }

    fn release(&self) {
        self.inner.released.store(true, Ordering::SeqCst);
        // Drop decoded data eagerly; the slot may keep the box alive briefly
        self.inner.loaded.lock().unwrap().take();
        debug!("waveform view {} released", self.inner.audio_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_data(duration_seconds: f64) -> WaveformData {
        WaveformData {
            duration_seconds,
            sample_rate: 44100,
            peaks: vec![0.25; 64],
        }
    }

    fn ready_view() -> DecodedWaveform {
        let view = DecodedWaveform::new(Uuid::new_v4(), EventBus::new(16));
        view.finish_load(Ok(test_data(10.0)));
        view
    }

    #[test]
    fn test_clock_starts_paused_at_zero() {
        let clock = TransportClock::new(10.0);
        assert_eq!(clock.state(), TransportState::Paused);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_clock_toggle_transitions() {
        let mut clock = TransportClock::new(10.0);
        assert_eq!(
            clock.toggle(),
            (TransportState::Paused, TransportState::Playing)
        );
        assert_eq!(
            clock.toggle(),
            (TransportState::Playing, TransportState::Paused)
        );
    }

    #[test]
    fn test_clock_position_advances_and_freezes() {
        let mut clock = TransportClock::new(10.0);
        clock.toggle();
        std::thread::sleep(std::time::Duration::from_millis(30));
        let while_playing = clock.position();
        assert!(while_playing > 0.0);

        clock.toggle();
        let at_pause = clock.position();
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(clock.position(), at_pause);
    }

    #[test]
    fn test_clock_clamps_to_duration() {
        let mut clock = TransportClock::new(0.01);
        clock.toggle();
        std::thread::sleep(std::time::Duration::from_millis(30));
        assert_eq!(clock.position(), 0.01);
    }

    #[tokio::test]
    async fn test_view_unready_until_load_finishes() {
        let view = DecodedWaveform::new(Uuid::new_v4(), EventBus::new(16));
        assert!(!view.is_ready());
        assert_eq!(view.duration_seconds(), 0.0);
        assert_eq!(view.position_seconds(), 0.0);
        assert!(view.play_pause().is_none());
        assert!(view.peaks(8).is_none());

        view.finish_load(Ok(test_data(5.0)));
        assert!(view.is_ready());
        assert_eq!(view.duration_seconds(), 5.0);
        assert_eq!(view.peaks(8).unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_ready_event_emitted_with_duration() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let audio_id = Uuid::new_v4();

        let view = DecodedWaveform::new(audio_id, bus);
        view.finish_load(Ok(test_data(7.5)));

        match rx.recv().await.unwrap() {
            SnipEvent::WaveformReady {
                audio_id: id,
                duration_seconds,
                ..
            } => {
                assert_eq!(id, audio_id);
                assert_eq!(duration_seconds, 7.5);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decode_failure_emits_failed_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let view = DecodedWaveform::new(Uuid::new_v4(), bus);
        view.finish_load(Err(Error::Decode("bad container".to_string())));

        assert!(!view.is_ready());
        match rx.recv().await.unwrap() {
            SnipEvent::WaveformFailed { message, .. } => {
                assert!(message.contains("bad container"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_released_view_never_becomes_ready() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let view = DecodedWaveform::new(Uuid::new_v4(), bus);
        view.release();
        view.finish_load(Ok(test_data(5.0)));

        assert!(!view.is_ready());
        // No ready event was published for the stale decode
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_release_drops_ready_state() {
        let view = ready_view();
        assert!(view.is_ready());
        view.release();
        assert!(!view.is_ready());
        assert!(view.peaks(8).is_none());
    }

    #[tokio::test]
    async fn test_zoom_round_trip() {
        let view = ready_view();
        assert_eq!(view.zoom(), 0);
        view.set_zoom(120);
        assert_eq!(view.zoom(), 120);
    }
}
