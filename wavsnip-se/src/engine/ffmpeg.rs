//! ffmpeg-backed transcoding engine
//!
//! Drives the system ffmpeg binary inside a per-run scratch directory. The
//! scratch directory is the engine's filesystem: staged files and produced
//! artifacts live there by bare name, and the whole directory is removed
//! when the engine is dropped.

use std::path::PathBuf;
use std::process::Stdio;

use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::engine::Engine;
use crate::error::{Error, Result};

/// Engine implementation over the system ffmpeg binary
pub struct FfmpegEngine {
    binary: PathBuf,
    scratch_root: Option<PathBuf>,
    scratch: Mutex<Option<TempDir>>,
}

impl FfmpegEngine {
    /// New engine for one export run.
    ///
    /// `scratch_root` overrides where the run's scratch directory is
    /// created; the system temp directory is used when None.
    pub fn new(binary: PathBuf, scratch_root: Option<PathBuf>) -> Self {
        Self {
            binary,
            scratch_root,
            scratch: Mutex::new(None),
        }
    }

    async fn scratch_dir(&self) -> Result<PathBuf> {
        let guard = self.scratch.lock().await;
        guard
            .as_ref()
            .map(|dir| dir.path().to_path_buf())
            .ok_or_else(|| Error::ExportFailed("engine not loaded".to_string()))
    }

    async fn file_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.scratch_dir().await?.join(name))
    }
}

impl Engine for FfmpegEngine {
    async fn load(&self) -> Result<()> {
        // Verify the binary launches at all before staging any work
        let status = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                Error::ExportFailed(format!(
                    "failed to launch {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;
        if !status.success() {
            return Err(Error::ExportFailed(format!(
                "{} -version exited with {}",
                self.binary.display(),
                status
            )));
        }

        let dir = match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(|e| {
                    Error::ExportFailed(format!(
                        "failed to create scratch root {}: {}",
                        root.display(),
                        e
                    ))
                })?;
                TempDir::new_in(root)
            }
            None => TempDir::new(),
        }
        .map_err(|e| Error::ExportFailed(format!("failed to create scratch directory: {}", e)))?;

        debug!("engine scratch directory: {}", dir.path().display());
        *self.scratch.lock().await = Some(dir);
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.file_path(name).await?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::ExportFailed(format!("failed to write {}: {}", name, e)))
    }

    async fn run(&self, args: &[String]) -> Result<()> {
        let dir = self.scratch_dir().await?;
        debug!("engine run: ffmpeg {}", args.join(" "));

        let output = Command::new(&self.binary)
            // -nostdin and -y are invocation details of the CLI engine, not
            // part of the command sequence: never prompt, overwrite freely
            .args(["-nostdin", "-y"])
            .args(args)
            .current_dir(&dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Error::ExportFailed(format!(
                    "failed to launch {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!("ffmpeg: {}", line);
        }

        if !output.status.success() {
            // The last non-empty stderr line is ffmpeg's actual complaint
            let message = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("ffmpeg failed with no output")
                .to_string();
            return Err(Error::ExportFailed(message));
        }
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(name).await?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::ExportFailed(format!("failed to read {}: {}", name, e)))
    }
}
