//! Transcoding engine abstraction
//!
//! The export pipeline consumes the external media engine as a small
//! capability set: a virtual filesystem plus a command runner. `load`
//! acquires whatever backing resources a fresh export run needs; files are
//! staged and read back by name within that run's scope.
//!
//! Errors from any capability surface as `Error::ExportFailed` carrying the
//! engine's own message, which the export operation passes through verbatim.
//! No capability applies a timeout; a hung engine hangs the export.

pub mod ffmpeg;

pub use ffmpeg::FfmpegEngine;

use crate::error::Result;

/// Capability set consumed from the external transcoding engine
#[allow(async_fn_in_trait)]
pub trait Engine {
    /// Prepare the engine for a fresh export run.
    async fn load(&self) -> Result<()>;

    /// Stage a named file into the engine's filesystem.
    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Run one engine command.
    async fn run(&self, args: &[String]) -> Result<()>;

    /// Read a named artifact back out of the engine's filesystem.
    async fn read_file(&self, name: &str) -> Result<Vec<u8>>;
}
