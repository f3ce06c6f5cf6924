//! Error types for wavsnip-se
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. The export operation surfaces exactly two kinds to the user:
//! `InputMissing` (preconditions not met, checked before any engine call) and
//! `ExportFailed` (any engine failure, message preserved verbatim).

use thiserror::Error;

/// Main error type for wavsnip-se
#[derive(Error, Debug)]
pub enum Error {
    /// Export preconditions not met: no file loaded or no segments marked
    #[error("Input missing: {0}")]
    InputMissing(String),

    /// Engine failure during export (load, per-segment processing,
    /// concatenation, or readback)
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Waveform view has not finished loading the source
    #[error("Waveform not ready: {0}")]
    NotReady(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience Result type using wavsnip-se Error
pub type Result<T> = std::result::Result<T, Error>;
