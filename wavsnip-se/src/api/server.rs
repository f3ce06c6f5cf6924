//! Router construction
//!
//! Builds the axum application router and the shared handler context.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::state::SharedState;

/// Shared application context passed to all handlers
///
/// AppContext implements Clone, which gives us `FromRef<AppContext>` for free
/// via axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub config: Arc<Config>,
}

/// Build the application router
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Editor UI (embedded HTML)
        .route("/", get(super::handlers::serve_ui))

        // Health and build identification
        .route("/health", get(super::handlers::health))
        .route("/build_info", get(super::handlers::build_info))

        // Source file management
        .route("/audio", post(super::handlers::load_audio))
        .route("/audio", get(super::handlers::audio_status))

        // Transport control
        .route("/transport/toggle", post(super::handlers::toggle_transport))
        .route("/transport/position", get(super::handlers::get_position))

        // Waveform view
        .route("/waveform/peaks", get(super::handlers::get_peaks))
        .route("/waveform/zoom", post(super::handlers::set_zoom))

        // Segment marking
        .route("/marks/start", post(super::handlers::mark_start))
        .route("/marks/stop", post(super::handlers::mark_stop))
        .route("/segments", get(super::handlers::get_segments))

        // Adjustment parameters
        .route("/params", get(super::handlers::get_params))
        .route("/params", post(super::handlers::set_params))

        // Export
        .route("/export", post(super::handlers::export))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        // Attach application context
        .with_state(ctx)

        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
