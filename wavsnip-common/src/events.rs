//! Event types for the WavSnip event system
//!
//! Provides the shared event enum and the EventBus used to fan state changes
//! out to SSE subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::types::TransportState;

/// WavSnip event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// Every variant carries a UTC timestamp so clients can order events without
/// trusting delivery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SnipEvent {
    /// A new source file was loaded, replacing any prior file and clearing
    /// the segment store.
    FileLoaded {
        /// Handle identifying this loaded file
        audio_id: Uuid,
        /// Original file name as provided by the client
        name: String,
        /// Size of the uploaded bytes
        size_bytes: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The waveform view finished decoding the loaded file; transport and
    /// marking actions are now permitted.
    WaveformReady {
        audio_id: Uuid,
        /// Decoded duration of the source
        duration_seconds: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The waveform view failed to decode the loaded file.
    WaveformFailed {
        audio_id: Uuid,
        /// Decoder message, surfaced verbatim
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transport toggled between Playing and Paused
    PlaybackStateChanged {
        old_state: TransportState,
        new_state: TransportState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Waveform zoom level changed
    ZoomChanged {
        /// New zoom level (0-200)
        level: u16,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A segment start boundary was recorded at the current position
    MarkStarted {
        position_seconds: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A pending mark was closed and appended to the segment store
    SegmentAdded {
        /// Index of the new segment in store order
        index: usize,
        start_seconds: f64,
        end_seconds: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Adjustment parameters changed
    ParametersChanged {
        gain_db: f64,
        fade_in_ms: f64,
        fade_out_ms: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An export run began
    ExportStarted {
        /// Number of segments in the store at export time
        segment_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One per-segment processing command completed
    ExportProgress {
        completed: usize,
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The export run produced the final artifact
    ExportCompleted {
        size_bytes: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The export run aborted; no partial output is offered
    ExportFailed {
        /// Failure message, surfaced verbatim
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SnipEvent {
    /// Event type string for the SSE `event:` field
    pub fn type_name(&self) -> &'static str {
        match self {
            SnipEvent::FileLoaded { .. } => "FileLoaded",
            SnipEvent::WaveformReady { .. } => "WaveformReady",
            SnipEvent::WaveformFailed { .. } => "WaveformFailed",
            SnipEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            SnipEvent::ZoomChanged { .. } => "ZoomChanged",
            SnipEvent::MarkStarted { .. } => "MarkStarted",
            SnipEvent::SegmentAdded { .. } => "SegmentAdded",
            SnipEvent::ParametersChanged { .. } => "ParametersChanged",
            SnipEvent::ExportStarted { .. } => "ExportStarted",
            SnipEvent::ExportProgress { .. } => "ExportProgress",
            SnipEvent::ExportCompleted { .. } => "ExportCompleted",
            SnipEvent::ExportFailed { .. } => "ExportFailed",
        }
    }
}

/// Central event distribution bus
///
/// Wraps tokio::broadcast, providing non-blocking publish, multiple
/// concurrent subscribers, and automatic cleanup when subscribers drop.
/// Emitting with no subscribers is not an error: events exist to keep
/// connected UIs current, not to drive state transitions.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SnipEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    ///
    /// Old events are dropped for lagged subscribers once the buffer fills.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events. Events emitted before subscription
    /// are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SnipEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers. Send errors (no receivers) are
    /// ignored.
    pub fn emit(&self, event: SnipEvent) {
        trace!("emit {}", event.type_name());
        let _ = self.tx.send(event);
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(SnipEvent::MarkStarted {
            position_seconds: 1.25,
            timestamp: chrono::Utc::now(),
        });

        match rx.recv().await.unwrap() {
            SnipEvent::MarkStarted {
                position_seconds, ..
            } => assert_eq!(position_seconds, 1.25),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_ok() {
        let bus = EventBus::new(16);
        // No subscriber attached; emit must not panic or error
        bus.emit(SnipEvent::ExportStarted {
            segment_count: 2,
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(bus.capacity(), 16);
    }

    #[test]
    fn test_serialized_tag() {
        let event = SnipEvent::ExportFailed {
            message: "engine exploded".to_string(),
            timestamp: chrono::Utc::now(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(json["type"], "ExportFailed");
        assert_eq!(json["message"], "engine exploded");
    }

    #[test]
    fn test_type_name_matches_variant() {
        let event = SnipEvent::PlaybackStateChanged {
            old_state: TransportState::Paused,
            new_state: TransportState::Playing,
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(event.type_name(), "PlaybackStateChanged");
    }
}
