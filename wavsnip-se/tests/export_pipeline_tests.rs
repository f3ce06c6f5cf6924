//! Export pipeline integration tests
//!
//! Drives the export pipeline against a recording mock engine to pin down
//! the command sequence contract: precondition checks happen before any
//! engine call, commands are issued strictly in store order, failures abort
//! the run with the engine message preserved, and progress events track the
//! per-segment processing steps.

use std::sync::Mutex;

use uuid::Uuid;
use wavsnip_common::{AdjustmentParams, EventBus, SnipEvent, TimeFrame};
use wavsnip_se::engine::Engine;
use wavsnip_se::error::Error;
use wavsnip_se::export::{run_export, INPUT_NAME, MANIFEST_NAME, OUTPUT_NAME};
use wavsnip_se::session::LoadedAudio;

/// One recorded engine capability invocation
#[derive(Debug, Clone, PartialEq)]
enum EngineCall {
    Load,
    WriteFile { name: String, bytes: Vec<u8> },
    Run { args: Vec<String> },
    ReadFile { name: String },
}

/// Where the mock engine should fail
#[derive(Debug, Clone, Copy, PartialEq)]
enum FailPoint {
    Load,
    WriteFile,
    /// Fail the Nth run call (0-based)
    Run(usize),
    ReadFile,
}

/// Engine double that records every call and can fail at a chosen point
#[derive(Default)]
struct MockEngine {
    calls: Mutex<Vec<EngineCall>>,
    fail_on: Option<FailPoint>,
    output: Vec<u8>,
}

impl MockEngine {
    fn recording() -> Self {
        Self {
            output: b"RIFF-output".to_vec(),
            ..Self::default()
        }
    }

    fn failing_at(fail_on: FailPoint) -> Self {
        Self {
            fail_on: Some(fail_on),
            output: b"RIFF-output".to_vec(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    fn run_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, EngineCall::Run { .. }))
            .count()
    }
}

impl Engine for MockEngine {
    async fn load(&self) -> wavsnip_se::Result<()> {
        self.calls.lock().unwrap().push(EngineCall::Load);
        if self.fail_on == Some(FailPoint::Load) {
            return Err(Error::ExportFailed("engine load blew up".to_string()));
        }
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> wavsnip_se::Result<()> {
        self.calls.lock().unwrap().push(EngineCall::WriteFile {
            name: name.to_string(),
            bytes: bytes.to_vec(),
        });
        if self.fail_on == Some(FailPoint::WriteFile) {
            return Err(Error::ExportFailed("virtual filesystem is full".to_string()));
        }
        Ok(())
    }

    async fn run(&self, args: &[String]) -> wavsnip_se::Result<()> {
        let run_index = self.run_count();
        self.calls.lock().unwrap().push(EngineCall::Run {
            args: args.to_vec(),
        });
        if self.fail_on == Some(FailPoint::Run(run_index)) {
            return Err(Error::ExportFailed(format!(
                "command {} exploded",
                run_index
            )));
        }
        Ok(())
    }

    async fn read_file(&self, name: &str) -> wavsnip_se::Result<Vec<u8>> {
        self.calls.lock().unwrap().push(EngineCall::ReadFile {
            name: name.to_string(),
        });
        if self.fail_on == Some(FailPoint::ReadFile) {
            return Err(Error::ExportFailed("artifact went missing".to_string()));
        }
        Ok(self.output.clone())
    }
}

fn audio(bytes: &[u8]) -> LoadedAudio {
    LoadedAudio {
        id: Uuid::new_v4(),
        name: "track.mp3".to_string(),
        bytes: bytes.to_vec(),
        loaded_at: chrono::Utc::now(),
    }
}

fn frames(pairs: &[(f64, f64)]) -> Vec<TimeFrame> {
    pairs.iter().map(|&(s, e)| TimeFrame::new(s, e)).collect()
}

// ============================================================================
// Command Sequence
// ============================================================================

#[tokio::test]
async fn test_two_segments_issue_two_commands_then_concat() {
    let engine = MockEngine::recording();
    let events = EventBus::new(64);
    let source = audio(b"source-bytes");

    let output = run_export(
        &engine,
        Some(&source),
        &frames(&[(0.0, 5.0), (10.0, 12.0)]),
        &AdjustmentParams::new(3.0, 500.0, 200.0),
        &events,
    )
    .await
    .unwrap();

    assert_eq!(output, b"RIFF-output");

    let calls = engine.calls();
    assert_eq!(calls.len(), 7);
    assert_eq!(calls[0], EngineCall::Load);
    assert_eq!(
        calls[1],
        EngineCall::WriteFile {
            name: INPUT_NAME.to_string(),
            bytes: b"source-bytes".to_vec(),
        }
    );

    // Exactly two per-segment commands, in store order, before concatenation
    let expected_first = vec![
        "-i",
        "input",
        "-ss",
        "0",
        "-to",
        "5",
        "-af",
        "volume=3dB,afade=t=in:st=0:d=0.5,afade=t=out:st=4.8:d=0.2",
        "cut0.wav",
    ];
    let expected_second = vec![
        "-i",
        "input",
        "-ss",
        "10",
        "-to",
        "12",
        "-af",
        "volume=3dB,afade=t=in:st=0:d=0.5,afade=t=out:st=1.8:d=0.2",
        "cut1.wav",
    ];
    assert_eq!(
        calls[2],
        EngineCall::Run {
            args: expected_first.iter().map(|s| s.to_string()).collect(),
        }
    );
    assert_eq!(
        calls[3],
        EngineCall::Run {
            args: expected_second.iter().map(|s| s.to_string()).collect(),
        }
    );

    // The manifest lists the two intermediate artifacts in the same order
    assert_eq!(
        calls[4],
        EngineCall::WriteFile {
            name: MANIFEST_NAME.to_string(),
            bytes: b"file 'cut0.wav'\nfile 'cut1.wav'\n".to_vec(),
        }
    );

    let concat = vec![
        "-f", "concat", "-safe", "0", "-i", "concat.txt", "-c", "copy", "output.wav",
    ];
    assert_eq!(
        calls[5],
        EngineCall::Run {
            args: concat.iter().map(|s| s.to_string()).collect(),
        }
    );
    assert_eq!(
        calls[6],
        EngineCall::ReadFile {
            name: OUTPUT_NAME.to_string(),
        }
    );
}

#[tokio::test]
async fn test_progress_event_per_segment() {
    let engine = MockEngine::recording();
    let events = EventBus::new(64);
    let mut rx = events.subscribe();

    run_export(
        &engine,
        Some(&audio(b"x")),
        &frames(&[(0.0, 1.0), (2.0, 3.0), (4.0, 5.0)]),
        &AdjustmentParams::default(),
        &events,
    )
    .await
    .unwrap();

    let mut progress = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let SnipEvent::ExportProgress {
            completed, total, ..
        } = event
        {
            progress.push((completed, total));
        }
    }
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
}

// ============================================================================
// Preconditions
// ============================================================================

#[tokio::test]
async fn test_no_audio_fails_without_engine_invocation() {
    let engine = MockEngine::recording();
    let events = EventBus::new(64);

    let err = run_export(
        &engine,
        None,
        &frames(&[(0.0, 5.0)]),
        &AdjustmentParams::default(),
        &events,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::InputMissing(_)));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_no_segments_fails_without_engine_invocation() {
    let engine = MockEngine::recording();
    let events = EventBus::new(64);

    let err = run_export(
        &engine,
        Some(&audio(b"x")),
        &[],
        &AdjustmentParams::default(),
        &events,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::InputMissing(_)));
    assert!(engine.calls().is_empty());
}

// ============================================================================
// Failure Propagation
// ============================================================================

#[tokio::test]
async fn test_load_failure_preserves_engine_message() {
    let engine = MockEngine::failing_at(FailPoint::Load);
    let events = EventBus::new(64);

    let err = run_export(
        &engine,
        Some(&audio(b"x")),
        &frames(&[(0.0, 5.0)]),
        &AdjustmentParams::default(),
        &events,
    )
    .await
    .unwrap_err();

    match err {
        Error::ExportFailed(message) => assert_eq!(message, "engine load blew up"),
        other => panic!("unexpected error: {:?}", other),
    }
    // Nothing is staged after a failed load
    assert_eq!(engine.calls(), vec![EngineCall::Load]);
}

#[tokio::test]
async fn test_write_failure_preserves_engine_message() {
    let engine = MockEngine::failing_at(FailPoint::WriteFile);
    let events = EventBus::new(64);

    let err = run_export(
        &engine,
        Some(&audio(b"x")),
        &frames(&[(0.0, 5.0)]),
        &AdjustmentParams::default(),
        &events,
    )
    .await
    .unwrap_err();

    match err {
        Error::ExportFailed(message) => assert_eq!(message, "virtual filesystem is full"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_second_segment_failure_aborts_remaining_steps() {
    let engine = MockEngine::failing_at(FailPoint::Run(1));
    let events = EventBus::new(64);

    let err = run_export(
        &engine,
        Some(&audio(b"x")),
        &frames(&[(0.0, 5.0), (10.0, 12.0), (20.0, 21.0)]),
        &AdjustmentParams::default(),
        &events,
    )
    .await
    .unwrap_err();

    match err {
        Error::ExportFailed(message) => assert_eq!(message, "command 1 exploded"),
        other => panic!("unexpected error: {:?}", other),
    }

    // The third segment, the manifest, and the concatenation never ran
    assert_eq!(engine.run_count(), 2);
    let calls = engine.calls();
    assert!(!calls
        .iter()
        .any(|call| matches!(call, EngineCall::ReadFile { .. })));
    assert!(!calls.iter().any(
        |call| matches!(call, EngineCall::WriteFile { name, .. } if name == MANIFEST_NAME)
    ));
}

#[tokio::test]
async fn test_readback_failure_preserves_engine_message() {
    let engine = MockEngine::failing_at(FailPoint::ReadFile);
    let events = EventBus::new(64);

    let err = run_export(
        &engine,
        Some(&audio(b"x")),
        &frames(&[(0.0, 5.0)]),
        &AdjustmentParams::default(),
        &events,
    )
    .await
    .unwrap_err();

    match err {
        Error::ExportFailed(message) => assert_eq!(message, "artifact went missing"),
        other => panic!("unexpected error: {:?}", other),
    }
}
