//! Export pipeline
//!
//! Translates the loaded source, the segment store, and the adjustment
//! parameters into a single output file via the transcoding engine. The
//! translation is split in two: `build_plan` produces the deterministic
//! command sequence as data, and `run_export` walks it against an `Engine`,
//! strictly in order, with no parallelism and no retries.
//!
//! Per segment i the plan trims `[start, end]` out of the staged input and
//! applies, in order: a volume shift in dB, a fade-in from the segment start,
//! and a fade-out ending at the segment end. The processed pieces (`cut0.wav`,
//! `cut1.wav`, ...) are then concatenated in store order through a manifest
//! using stream copy, and the final artifact is read back.

use tracing::info;
use wavsnip_common::time::format_arg;
use wavsnip_common::{AdjustmentParams, EventBus, SnipEvent, TimeFrame};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::session::LoadedAudio;

/// Name the source bytes are staged under
pub const INPUT_NAME: &str = "input";
/// Name of the concatenation manifest
pub const MANIFEST_NAME: &str = "concat.txt";
/// Name of the final artifact inside the engine
pub const OUTPUT_NAME: &str = "output.wav";
/// File name offered to the user for the downloaded result
pub const DOWNLOAD_NAME: &str = "cut_audio.wav";
/// Content-Disposition header value offering `DOWNLOAD_NAME`
pub const DOWNLOAD_DISPOSITION: &str = "attachment; filename=\"cut_audio.wav\"";

/// Intermediate artifact name for the segment at `index`
pub fn cut_name(index: usize) -> String {
    format!("cut{}.wav", index)
}

/// Deterministic command sequence for one export run
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    /// One trim/filter command per segment, in store order
    pub segment_commands: Vec<Vec<String>>,
    /// Concatenation manifest listing the intermediate artifacts in order
    pub manifest: String,
    /// Final stream-copy concatenation command
    pub concat_command: Vec<String>,
}

/// Build the command sequence for the given segments and parameters.
pub fn build_plan(frames: &[TimeFrame], params: &AdjustmentParams) -> ExportPlan {
    let mut segment_commands = Vec::with_capacity(frames.len());
    let mut manifest = String::new();

    for (index, frame) in frames.iter().enumerate() {
        let out_name = cut_name(index);
        segment_commands.push(segment_command(frame, params, &out_name));
        manifest.push_str(&format!("file '{}'\n", out_name));
    }

    let concat_command = [
        "-f", "concat", "-safe", "0", "-i", MANIFEST_NAME, "-c", "copy", OUTPUT_NAME,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    ExportPlan {
        segment_commands,
        manifest,
        concat_command,
    }
}

fn segment_command(frame: &TimeFrame, params: &AdjustmentParams, out_name: &str) -> Vec<String> {
    let fade_in_s = params.fade_in_seconds();
    let fade_out_s = params.fade_out_seconds();
    // A fade-out longer than the segment would start at a negative offset;
    // clamp to the segment start so it spans the whole segment instead.
    let fade_out_start = (frame.duration() - fade_out_s).max(0.0);

    let filter = format!(
        "volume={}dB,afade=t=in:st=0:d={},afade=t=out:st={}:d={}",
        format_arg(params.gain_db),
        format_arg(fade_in_s),
        format_arg(fade_out_start),
        format_arg(fade_out_s),
    );

    vec![
        "-i".to_string(),
        INPUT_NAME.to_string(),
        "-ss".to_string(),
        format_arg(frame.start),
        "-to".to_string(),
        format_arg(frame.end),
        "-af".to_string(),
        filter,
        out_name.to_string(),
    ]
}

/// Run a full export: stage the input, process each segment, concatenate,
/// and read the final artifact back.
///
/// Preconditions are checked before any engine call: a loaded source and a
/// non-empty segment store, else `InputMissing`. Every engine failure after
/// that aborts the run as `ExportFailed` with the engine's message; no
/// partial artifact is returned.
pub async fn run_export<E: Engine>(
    engine: &E,
    audio: Option<&LoadedAudio>,
    frames: &[TimeFrame],
    params: &AdjustmentParams,
    events: &EventBus,
) -> Result<Vec<u8>> {
    let audio = audio.ok_or_else(|| Error::InputMissing("no audio file loaded".to_string()))?;
    if frames.is_empty() {
        return Err(Error::InputMissing("no segments marked".to_string()));
    }

    let plan = build_plan(frames, params);
    let total = plan.segment_commands.len();
    info!(
        "exporting {} segment(s) from {} ({} bytes)",
        total,
        audio.name,
        audio.bytes.len()
    );

    engine.load().await?;
    engine.write_file(INPUT_NAME, &audio.bytes).await?;

    for (index, command) in plan.segment_commands.iter().enumerate() {
        engine.run(command).await?;
        events.emit(SnipEvent::ExportProgress {
            completed: index + 1,
            total,
            timestamp: chrono::Utc::now(),
        });
    }

    engine.write_file(MANIFEST_NAME, plan.manifest.as_bytes()).await?;
    engine.run(&plan.concat_command).await?;

    let output = engine.read_file(OUTPUT_NAME).await?;
    info!("export complete: {} bytes", output.len());
    Ok(output)
}
