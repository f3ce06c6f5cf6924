//! Waveform decoding using symphonia
//!
//! Decodes a loaded source into the summary the editor UI renders: total
//! duration plus a fixed-resolution set of peak amplitudes. Samples are
//! downmixed to mono; the peak of each bucket is the maximum absolute sample
//! value it covers.

use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

use crate::error::{Error, Result};

/// Resolution of the decoded peak set; peak queries resample from this base
pub const BASE_PEAK_BUCKETS: usize = 4096;

/// Decoded waveform summary
#[derive(Debug, Clone)]
pub struct WaveformData {
    /// Source duration in seconds
    pub duration_seconds: f64,
    /// Native sample rate of the source
    pub sample_rate: u32,
    /// Mono peak amplitudes at BASE_PEAK_BUCKETS resolution
    pub peaks: Vec<f32>,
}

/// Decode source bytes into a waveform summary.
///
/// The file name is only used as a format hint; the container is probed from
/// the bytes themselves.
pub fn decode_waveform(name: &str, bytes: &[u8]) -> Result<WaveformData> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(name).extension() {
        hint.with_extension(ext.to_str().unwrap_or(""));
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("unsupported format: {:?}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Decode("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params.sample_rate.unwrap_or(44100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("unsupported codec: {:?}", e)))?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // EOF
            }
            Err(e) => return Err(Error::Decode(format!("{:?}", e))),
        };

        // Skip packets from other tracks
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count().max(1);

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);

                for frame in sample_buf.samples().chunks(channels) {
                    mono.push(frame.iter().sum::<f32>() / channels as f32);
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Recoverable per-packet corruption; keep going
                warn!("skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(Error::Decode(format!("{:?}", e))),
        }
    }

    if mono.is_empty() {
        return Err(Error::Decode("no audio frames decoded".to_string()));
    }

    let duration_seconds = mono.len() as f64 / sample_rate as f64;
    let peaks = bucket_peaks(&mono, BASE_PEAK_BUCKETS);

    Ok(WaveformData {
        duration_seconds,
        sample_rate,
        peaks,
    })
}

/// Resample samples into `buckets` peak values (maximum absolute amplitude
/// per bucket).
pub fn bucket_peaks(samples: &[f32], buckets: usize) -> Vec<f32> {
    if samples.is_empty() || buckets == 0 {
        return vec![0.0; buckets];
    }

    (0..buckets)
        .map(|i| {
            let lo = i * samples.len() / buckets;
            let hi = (((i + 1) * samples.len()) / buckets)
                .max(lo + 1)
                .min(samples.len());
            samples[lo..hi]
                .iter()
                .fold(0.0f32, |peak, &s| peak.max(s.abs()))
        })
        .collect()
}
