//! HTTP request handlers
//!
//! The handlers are the dispatcher of the tool: every user action arrives
//! here, is applied to the session or the waveform view, and the resulting
//! state change is broadcast on the event bus.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;
use wavsnip_common::time::format_seconds;
use wavsnip_common::{AdjustmentParams, SnipEvent, TransportState};

use crate::api::server::AppContext;
use crate::engine::FfmpegEngine;
use crate::error::Error;
use crate::export;
use crate::waveform::DecodedWaveform;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct BuildInfoResponse {
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadQuery {
    /// Original file name; used as a decoder hint and echoed back to the UI
    name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AudioInfoResponse {
    loaded: bool,
    audio_id: Option<Uuid>,
    name: Option<String>,
    size_bytes: Option<u64>,
    /// True once the waveform view finished decoding
    ready: bool,
    /// True while an export run is in flight
    exporting: bool,
    duration_seconds: f64,
    transport_state: TransportState,
    zoom: u16,
    segment_count: usize,
    marking: bool,
}

#[derive(Debug, Serialize)]
pub struct PositionResponse {
    position_seconds: f64,
    duration_seconds: f64,
    state: TransportState,
}

#[derive(Debug, Deserialize)]
pub struct ZoomRequest {
    level: u16,
}

#[derive(Debug, Serialize)]
pub struct ZoomResponse {
    level: u16,
}

#[derive(Debug, Deserialize)]
pub struct PeaksQuery {
    buckets: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PeaksResponse {
    buckets: Vec<f32>,
    duration_seconds: f64,
    zoom: u16,
}

#[derive(Debug, Serialize)]
pub struct MarkResponse {
    marking: bool,
    pending_start: Option<f64>,
    segment_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SegmentInfo {
    index: usize,
    start_seconds: f64,
    end_seconds: f64,
    /// Display label, e.g. "0.00s - 5.00s"
    label: String,
}

#[derive(Debug, Serialize)]
pub struct SegmentsResponse {
    segments: Vec<SegmentInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ParamsRequest {
    gain_db: f64,
    fade_in_ms: f64,
    fade_out_ms: f64,
}

/// Error responses carry an HTTP status plus a JSON status body
type ApiError = (StatusCode, Json<StatusResponse>);

fn error_response(err: Error) -> ApiError {
    let code = match &err {
        Error::InputMissing(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::NotReady(_) | Error::InvalidState(_) => StatusCode::CONFLICT,
        Error::ExportFailed(_) | Error::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        code,
        Json(StatusResponse {
            status: format!("error: {}", err),
        }),
    )
}

// ============================================================================
// UI / Health Endpoints
// ============================================================================

/// GET / - Embedded editor UI
pub async fn serve_ui() -> Html<&'static str> {
    Html(include_str!("editor_ui.html"))
}

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "wavsnip-se".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /build_info - Build identification
pub async fn build_info() -> Json<BuildInfoResponse> {
    Json(BuildInfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
    })
}

// ============================================================================
// Source File Endpoints
// ============================================================================

/// POST /audio - Load a new source file
///
/// Replaces the prior file: the old waveform view is released before the new
/// one is constructed, and the segment store is cleared. Decoding runs in
/// the background; readiness is announced as a WaveformReady event.
pub async fn load_audio(
    State(ctx): State<AppContext>,
    Query(query): Query<LoadQuery>,
    body: Bytes,
) -> Result<Json<AudioInfoResponse>, ApiError> {
    if body.is_empty() {
        return Err(error_response(Error::BadRequest(
            "empty audio upload".to_string(),
        )));
    }
    let name = query.name.unwrap_or_else(|| "audio".to_string());
    info!("Loading audio file: {} ({} bytes)", name, body.len());

    let audio = {
        let mut session = ctx.state.session.write().await;
        session.load(name, body.to_vec())
    };

    {
        let mut slot = ctx.state.waveform.lock().unwrap();
        let view = slot.replace_with(|| {
            Box::new(DecodedWaveform::new(audio.id, ctx.state.events.clone()))
        });
        view.begin_load(audio.clone());
    }

    ctx.state.events.emit(SnipEvent::FileLoaded {
        audio_id: audio.id,
        name: audio.name.clone(),
        size_bytes: audio.bytes.len() as u64,
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(audio_info(&ctx).await))
}

/// GET /audio - Current file and editor status
pub async fn audio_status(State(ctx): State<AppContext>) -> Json<AudioInfoResponse> {
    Json(audio_info(&ctx).await)
}

async fn audio_info(ctx: &AppContext) -> AudioInfoResponse {
    let (audio, segment_count, marking) = {
        let session = ctx.state.session.read().await;
        (
            session.audio(),
            session.segments().len(),
            session.is_marking(),
        )
    };
    let (ready, duration_seconds, transport_state, zoom) = {
        let slot = ctx.state.waveform.lock().unwrap();
        match slot.view() {
            Some(view) => (
                view.is_ready(),
                view.duration_seconds(),
                view.transport_state(),
                view.zoom(),
            ),
            None => (false, 0.0, TransportState::Paused, 0),
        }
    };

    AudioInfoResponse {
        loaded: audio.is_some(),
        audio_id: audio.as_ref().map(|a| a.id),
        name: audio.as_ref().map(|a| a.name.clone()),
        size_bytes: audio.as_ref().map(|a| a.bytes.len() as u64),
        ready,
        exporting: ctx.state.is_exporting(),
        duration_seconds,
        transport_state,
        zoom,
        segment_count,
        marking,
    }
}

// ============================================================================
// Transport Endpoints
// ============================================================================

/// POST /transport/toggle - Toggle play/pause
pub async fn toggle_transport(
    State(ctx): State<AppContext>,
) -> Result<Json<PositionResponse>, ApiError> {
    let toggled = {
        let slot = ctx.state.waveform.lock().unwrap();
        slot.view().and_then(|view| {
            view.play_pause()
                .map(|states| (states, view.position_seconds(), view.duration_seconds()))
        })
    };

    match toggled {
        Some(((old_state, new_state), position_seconds, duration_seconds)) => {
            ctx.state.events.emit(SnipEvent::PlaybackStateChanged {
                old_state,
                new_state,
                timestamp: chrono::Utc::now(),
            });
            Ok(Json(PositionResponse {
                position_seconds,
                duration_seconds,
                state: new_state,
            }))
        }
        None => Err(error_response(Error::NotReady(
            "waveform not loaded or still decoding".to_string(),
        ))),
    }
}

/// GET /transport/position - Current playback position
pub async fn get_position(State(ctx): State<AppContext>) -> Json<PositionResponse> {
    let slot = ctx.state.waveform.lock().unwrap();
    let (position_seconds, duration_seconds, state) = match slot.view() {
        Some(view) => (
            view.position_seconds(),
            view.duration_seconds(),
            view.transport_state(),
        ),
        None => (0.0, 0.0, TransportState::Paused),
    };
    Json(PositionResponse {
        position_seconds,
        duration_seconds,
        state,
    })
}

// ============================================================================
// Waveform Endpoints
// ============================================================================

/// GET /waveform/peaks - Peak buckets for the UI canvas
pub async fn get_peaks(
    State(ctx): State<AppContext>,
    Query(query): Query<PeaksQuery>,
) -> Result<Json<PeaksResponse>, ApiError> {
    let buckets = query.buckets.unwrap_or(800).clamp(16, 8192);

    let slot = ctx.state.waveform.lock().unwrap();
    let view = slot
        .view()
        .filter(|view| view.is_ready())
        .ok_or_else(|| {
            error_response(Error::NotReady(
                "waveform not loaded or still decoding".to_string(),
            ))
        })?;

    match view.peaks(buckets) {
        Some(peaks) => Ok(Json(PeaksResponse {
            buckets: peaks,
            duration_seconds: view.duration_seconds(),
            zoom: view.zoom(),
        })),
        None => Err(error_response(Error::NotReady(
            "waveform not loaded or still decoding".to_string(),
        ))),
    }
}

/// POST /waveform/zoom - Set zoom level (0-200)
pub async fn set_zoom(
    State(ctx): State<AppContext>,
    Json(req): Json<ZoomRequest>,
) -> Result<Json<ZoomResponse>, ApiError> {
    if req.level > 200 {
        return Err(error_response(Error::BadRequest(format!(
            "zoom level {} out of range (0-200)",
            req.level
        ))));
    }

    {
        let slot = ctx.state.waveform.lock().unwrap();
        let view = slot.view().ok_or_else(|| {
            error_response(Error::NotReady("no waveform loaded".to_string()))
        })?;
        view.set_zoom(req.level);
    }

    ctx.state.events.emit(SnipEvent::ZoomChanged {
        level: req.level,
        timestamp: chrono::Utc::now(),
    });
    Ok(Json(ZoomResponse { level: req.level }))
}

// ============================================================================
// Mark / Segment Endpoints
// ============================================================================

/// Current position behind the ready gate: marking needs a decoded waveform
fn ready_position(ctx: &AppContext) -> Result<f64, ApiError> {
    let slot = ctx.state.waveform.lock().unwrap();
    slot.view()
        .filter(|view| view.is_ready())
        .map(|view| view.position_seconds())
        .ok_or_else(|| {
            error_response(Error::NotReady(
                "waveform not loaded or still decoding".to_string(),
            ))
        })
}

/// POST /marks/start - Record the current position as a segment start
///
/// A second start while a mark is already open is a no-op (the pending
/// position does not move).
pub async fn mark_start(State(ctx): State<AppContext>) -> Result<Json<MarkResponse>, ApiError> {
    let position = ready_position(&ctx)?;

    let (recorded, response) = {
        let mut session = ctx.state.session.write().await;
        let recorded = session.mark_start(position);
        (recorded, mark_response(&session))
    };

    if let Some(position_seconds) = recorded {
        ctx.state.events.emit(SnipEvent::MarkStarted {
            position_seconds,
            timestamp: chrono::Utc::now(),
        });
    }
    Ok(Json(response))
}

/// POST /marks/stop - Close the pending mark into a segment
///
/// Without an open mark this is a no-op. The segment is recorded verbatim,
/// even when the stop position precedes the recorded start.
pub async fn mark_stop(State(ctx): State<AppContext>) -> Result<Json<MarkResponse>, ApiError> {
    let position = ready_position(&ctx)?;

    let (added, response) = {
        let mut session = ctx.state.session.write().await;
        let added = session
            .mark_stop(position)
            .map(|frame| (session.segments().len() - 1, frame));
        (added, mark_response(&session))
    };

    if let Some((index, frame)) = added {
        ctx.state.events.emit(SnipEvent::SegmentAdded {
            index,
            start_seconds: frame.start,
            end_seconds: frame.end,
            timestamp: chrono::Utc::now(),
        });
    }
    Ok(Json(response))
}

fn mark_response(session: &crate::session::EditorSession) -> MarkResponse {
    MarkResponse {
        marking: session.is_marking(),
        pending_start: session.pending_start(),
        segment_count: session.segments().len(),
    }
}

/// GET /segments - Segment store in insertion order
pub async fn get_segments(State(ctx): State<AppContext>) -> Json<SegmentsResponse> {
    let session = ctx.state.session.read().await;
    let segments = session
        .segments()
        .iter()
        .enumerate()
        .map(|(index, frame)| SegmentInfo {
            index,
            start_seconds: frame.start,
            end_seconds: frame.end,
            label: format!(
                "{} - {}",
                format_seconds(frame.start),
                format_seconds(frame.end)
            ),
        })
        .collect();
    Json(SegmentsResponse { segments })
}

// ============================================================================
// Parameter Endpoints
// ============================================================================

/// GET /params - Current adjustment parameters
pub async fn get_params(State(ctx): State<AppContext>) -> Json<AdjustmentParams> {
    let session = ctx.state.session.read().await;
    Json(session.params())
}

/// POST /params - Replace adjustment parameters (fades clamp to >= 0)
pub async fn set_params(
    State(ctx): State<AppContext>,
    Json(req): Json<ParamsRequest>,
) -> Json<AdjustmentParams> {
    let effective = {
        let mut session = ctx.state.session.write().await;
        session.set_params(req.gain_db, req.fade_in_ms, req.fade_out_ms)
    };

    ctx.state.events.emit(SnipEvent::ParametersChanged {
        gain_db: effective.gain_db,
        fade_in_ms: effective.fade_in_ms,
        fade_out_ms: effective.fade_out_ms,
        timestamp: chrono::Utc::now(),
    });
    Json(effective)
}

// ============================================================================
// Export Endpoint
// ============================================================================

/// POST /export - Run the export pipeline
///
/// Success streams the final artifact back as a download named
/// cut_audio.wav. Any failure aborts the run with no partial output, and the
/// busy flag returns to idle either way.
pub async fn export(State(ctx): State<AppContext>) -> Response {
    if !ctx.state.begin_export() {
        return error_response(Error::InvalidState(
            "export already in progress".to_string(),
        ))
        .into_response();
    }

    let result = perform_export(&ctx).await;
    ctx.state.end_export();

    match result {
        Ok(bytes) => {
            info!("Export produced {} bytes", bytes.len());
            ctx.state.events.emit(SnipEvent::ExportCompleted {
                size_bytes: bytes.len() as u64,
                timestamp: chrono::Utc::now(),
            });
            (
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static("audio/wav")),
                    (
                        header::CONTENT_DISPOSITION,
                        HeaderValue::from_static(export::DOWNLOAD_DISPOSITION),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) => {
            error!("Export failed: {}", err);
            ctx.state.events.emit(SnipEvent::ExportFailed {
                message: err.to_string(),
                timestamp: chrono::Utc::now(),
            });
            error_response(err).into_response()
        }
    }
}

async fn perform_export(ctx: &AppContext) -> crate::error::Result<Vec<u8>> {
    let (audio, frames, params) = {
        let session = ctx.state.session.read().await;
        (
            session.audio(),
            session.segments().to_vec(),
            session.params(),
        )
    };

    ctx.state.events.emit(SnipEvent::ExportStarted {
        segment_count: frames.len(),
        timestamp: chrono::Utc::now(),
    });

    let engine = FfmpegEngine::new(
        ctx.config.ffmpeg_path.clone(),
        ctx.config.scratch_root.clone(),
    );
    export::run_export(&engine, audio.as_deref(), &frames, &params, &ctx.state.events).await
}
