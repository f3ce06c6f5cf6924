//! Segment Editor (wavsnip-se) - Main entry point
//!
//! Serves the browser-based audio trimming UI and its API: segment marking
//! over a decoded waveform, gain/fade adjustment, and export through an
//! external ffmpeg engine.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wavsnip_se::api::{build_router, AppContext};
use wavsnip_se::config::Config;
use wavsnip_se::state::SharedState;

/// Command-line arguments for wavsnip-se
#[derive(Parser, Debug)]
#[command(name = "wavsnip-se")]
#[command(about = "Segment Editor service for WavSnip")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5728", env = "WAVSNIP_SE_PORT")]
    port: u16,

    /// Path to the ffmpeg binary used for export processing
    #[arg(long, default_value = "ffmpeg", env = "WAVSNIP_FFMPEG")]
    ffmpeg: PathBuf,

    /// Directory for export scratch space (system temp dir when unset)
    #[arg(long, env = "WAVSNIP_SCRATCH")]
    scratch_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wavsnip_se=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Log build identification immediately after tracing init
    info!(
        "Starting WavSnip Segment Editor (wavsnip-se) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Engine binary: {}", args.ffmpeg.display());

    let config = Arc::new(Config {
        port: args.port,
        ffmpeg_path: args.ffmpeg,
        scratch_root: args.scratch_dir,
    });
    let state = Arc::new(SharedState::new());

    let app = build_router(AppContext {
        state,
        config: config.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("wavsnip-se listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
