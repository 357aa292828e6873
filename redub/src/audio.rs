use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::process::is_missing_tool;

/// Target sample rate for whisper.cpp.
const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Maximum audio duration in seconds (8 hours).
/// Prevents unbounded memory allocation from very long audio files.
const MAX_AUDIO_DURATION_SECS: f64 = 8.0 * 3600.0;

/// Minimum RMS level. Below this the track carries no usable speech.
const MIN_RMS: f32 = 1e-6;

/// Load an audio file and return 16kHz mono f32 samples ready for whisper.
///
/// ffmpeg handles decoding, resampling, and channel mixing in one shot,
/// so any container/codec ffmpeg understands works here (the acquired
/// `audio.mp4`, wav, opus, webm, ...).
pub fn load_audio(path: &Path) -> Result<Vec<f32>> {
    info!(path = %path.display(), "loading audio");

    if !path.exists() {
        return Err(Error::AudioNotFound {
            path: path.to_path_buf(),
        });
    }

    let samples = decode_with_ffmpeg(path)?;

    let duration = samples.len() as f64 / WHISPER_SAMPLE_RATE as f64;
    debug!(
        samples = samples.len(),
        duration_secs = format!("{duration:.1}"),
        "decoded audio"
    );

    if duration > MAX_AUDIO_DURATION_SECS {
        return Err(Error::AudioDecode(format!(
            "audio too long ({duration:.0}s) — maximum supported duration is {MAX_AUDIO_DURATION_SECS:.0}s"
        )));
    }

    Ok(samples)
}

/// Decode any audio file to 16kHz mono f32 via ffmpeg subprocess.
/// Output format is raw PCM signed 16-bit little-endian, converted to f32.
fn decode_with_ffmpeg(path: &Path) -> Result<Vec<f32>> {
    let output = Command::new("ffmpeg")
        .args(["-nostdin", "-threads", "0", "-i"])
        .arg(path)
        .args([
            "-f",
            "s16le",
            "-ac",
            "1",
            "-acodec",
            "pcm_s16le",
            "-ar",
            &WHISPER_SAMPLE_RATE.to_string(),
            "-",
        ])
        .output()
        .map_err(|e| {
            if is_missing_tool(&e) {
                Error::AudioDecode("ffmpeg not found — install with: apt install ffmpeg".into())
            } else {
                Error::AudioDecode(format!("failed to run ffmpeg: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::AudioDecode(format!("ffmpeg failed: {stderr}")));
    }

    if output.stdout.is_empty() {
        return Err(Error::AudioDecode("ffmpeg produced no output".into()));
    }

    // Convert s16le bytes to f32 samples, normalized to [-1.0, 1.0]
    let samples: Vec<f32> = output
        .stdout
        .chunks_exact(2)
        .map(|chunk| {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            sample as f32 / 32768.0
        })
        .collect();

    Ok(samples)
}

/// Whether decoded audio is effectively silent (RMS below threshold).
/// Saves a pointless whisper run on tracks with no signal.
pub(crate) fn is_effectively_silent(samples: &[f32]) -> bool {
    rms(samples) < MIN_RMS
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
