//! Duration-aware audio resynchronization.
//!
//! Synthesized narration rarely lands on the original clip's duration.
//! This module measures the mismatch, computes a clamped speed factor,
//! and stretches or squeezes the synthesized track to fit the original
//! timeline with a single ffmpeg atempo pass.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::probe::DurationProbe;
use crate::process::{is_missing_tool, stderr_excerpt};
use crate::types::MediaAsset;

/// Slowest speed factor a single atempo pass can express.
pub const MIN_SPEED_FACTOR: f64 = 0.5;

/// Fastest speed factor a single atempo pass can express.
pub const MAX_SPEED_FACTOR: f64 = 2.0;

/// Outcome of the speed-factor computation for one run.
///
/// `raw` is the unclamped ratio of original to synthesized duration,
/// `applied` the ratio actually used. When they differ the run keeps
/// going at the boundary value and the residual mismatch is reported
/// rather than treated as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoCorrection {
    pub raw: f64,
    pub applied: f64,
    pub clamped: bool,
}

impl TempoCorrection {
    /// Value handed to ffmpeg's atempo filter.
    ///
    /// atempo multiplies playback tempo, so output duration is input
    /// duration divided by the filter value. Bringing the synthesized
    /// track toward the original's duration therefore takes the
    /// reciprocal of the duration ratio. The clamp band is closed under
    /// reciprocals, so this is always a legal single-pass atempo value.
    pub fn atempo(&self) -> f64 {
        1.0 / self.applied
    }
}

/// Ratio of original to synthesized duration, clamped to the band a
/// single atempo pass supports.
///
/// Degenerate durations (zero, negative, non-finite) are an error and
/// surface before any audio is touched.
pub fn compute_speed_factor(original_secs: f64, synthesized_secs: f64) -> Result<TempoCorrection> {
    for secs in [original_secs, synthesized_secs] {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(Error::DegenerateDuration { seconds: secs });
        }
    }

    let raw = original_secs / synthesized_secs;
    let applied = raw.clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR);

    Ok(TempoCorrection {
        raw,
        applied,
        clamped: applied != raw,
    })
}

/// Applies a tempo transform to an audio file.
pub trait TempoFilter: Send + Sync {
    fn apply(&self, input: &Path, tempo: f64, output: &Path) -> Result<()>;
}

/// ffmpeg audio filter expression for a tempo value.
fn atempo_filter(tempo: f64) -> String {
    format!("atempo={tempo}")
}

/// Production tempo filter using ffmpeg's atempo.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegAtempo;

impl TempoFilter for FfmpegAtempo {
    fn apply(&self, input: &Path, tempo: f64, output: &Path) -> Result<()> {
        debug!(input = %input.display(), tempo, "applying tempo filter");

        let result = Command::new("ffmpeg")
            .args(["-nostdin", "-i"])
            .arg(input)
            .args(["-filter:a", &atempo_filter(tempo), "-y"])
            .arg(output)
            .output()
            .map_err(|e| {
                if is_missing_tool(&e) {
                    Error::AudioProcessing(
                        "ffmpeg not found — install with: apt install ffmpeg".into(),
                    )
                } else {
                    Error::AudioProcessing(format!("failed to run ffmpeg: {e}"))
                }
            })?;

        if !result.status.success() {
            return Err(Error::AudioProcessing(format!(
                "ffmpeg atempo failed: {}",
                stderr_excerpt(&result)
            )));
        }

        Ok(())
    }
}

/// Stretch or squeeze `synthesized` so its duration approaches the
/// `original` track's, writing the adjusted audio to `out`.
///
/// A correction outside the clamp band is applied at the nearest
/// boundary and reported through the returned [`TempoCorrection`]; the
/// run never fails for that reason alone.
pub fn resynchronize(
    probe: &dyn DurationProbe,
    filter: &dyn TempoFilter,
    original: &MediaAsset,
    synthesized: &MediaAsset,
    out: &Path,
) -> Result<(MediaAsset, TempoCorrection)> {
    let original_secs = original.duration_secs(probe)?;
    let synthesized_secs = synthesized.duration_secs(probe)?;

    let correction = compute_speed_factor(original_secs, synthesized_secs)?;

    if correction.clamped {
        warn!(
            raw = correction.raw,
            applied = correction.applied,
            "required speed factor outside supported band, clamping"
        );
    }

    info!(
        original_secs,
        synthesized_secs,
        factor = correction.applied,
        atempo = correction.atempo(),
        "resynchronizing audio"
    );

    filter.apply(synthesized.path(), correction.atempo(), out)?;

    Ok((MediaAsset::audio(out), correction))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_equal_durations_unit_factor() {
        let c = compute_speed_factor(10.0, 10.0).unwrap();
        assert_eq!(c.raw, 1.0);
        assert_eq!(c.applied, 1.0);
        assert!(!c.clamped);
    }

    #[test]
    fn test_in_band_factor_unclamped() {
        let c = compute_speed_factor(10.0, 12.0).unwrap();
        assert!((c.raw - 10.0 / 12.0).abs() < 1e-12);
        assert_eq!(c.applied, c.raw);
        assert!(!c.clamped);
    }

    #[test]
    fn test_slow_synthesis_clamps_low() {
        // 10s original, 25s synthesized: true ratio 0.4, floor is 0.5
        let c = compute_speed_factor(10.0, 25.0).unwrap();
        assert!((c.raw - 0.4).abs() < 1e-12);
        assert_eq!(c.applied, 0.5);
        assert!(c.clamped);
    }

    #[test]
    fn test_fast_synthesis_clamps_high() {
        // 10s original, 4s synthesized: true ratio 2.5, ceiling is 2.0
        let c = compute_speed_factor(10.0, 4.0).unwrap();
        assert!((c.raw - 2.5).abs() < 1e-12);
        assert_eq!(c.applied, 2.0);
        assert!(c.clamped);
    }

    #[test]
    fn test_boundary_values_not_clamped() {
        assert!(!compute_speed_factor(10.0, 20.0).unwrap().clamped);
        assert!(!compute_speed_factor(20.0, 10.0).unwrap().clamped);
    }

    #[test]
    fn test_zero_synthesized_duration() {
        let result = compute_speed_factor(10.0, 0.0);
        assert!(matches!(
            result,
            Err(Error::DegenerateDuration { seconds }) if seconds == 0.0
        ));
    }

    #[test]
    fn test_negative_and_non_finite_durations() {
        assert!(compute_speed_factor(10.0, -3.0).is_err());
        assert!(compute_speed_factor(-1.0, 10.0).is_err());
        assert!(compute_speed_factor(10.0, f64::NAN).is_err());
        assert!(compute_speed_factor(f64::INFINITY, 10.0).is_err());
    }

    #[test]
    fn test_atempo_is_reciprocal() {
        let slow = compute_speed_factor(10.0, 25.0).unwrap();
        assert_eq!(slow.atempo(), 2.0);

        let fast = compute_speed_factor(10.0, 4.0).unwrap();
        assert_eq!(fast.atempo(), 0.5);

        let unit = compute_speed_factor(10.0, 10.0).unwrap();
        assert_eq!(unit.atempo(), 1.0);
    }

    #[test]
    fn test_atempo_stays_in_band() {
        for (orig, synth) in [(10.0, 25.0), (10.0, 4.0), (7.0, 9.0), (9.0, 7.0), (1.0, 1.0)] {
            let c = compute_speed_factor(orig, synth).unwrap();
            let atempo = c.atempo();
            assert!(
                (MIN_SPEED_FACTOR..=MAX_SPEED_FACTOR).contains(&atempo),
                "atempo {atempo} out of band for {orig}/{synth}"
            );
        }
    }

    #[test]
    fn test_atempo_filter_expression() {
        assert_eq!(atempo_filter(0.5), "atempo=0.5");
        assert_eq!(atempo_filter(2.0), "atempo=2");
        assert_eq!(atempo_filter(1.25), "atempo=1.25");
    }

    struct MapProbe {
        durations: HashMap<PathBuf, f64>,
    }

    impl DurationProbe for MapProbe {
        fn duration_secs(&self, path: &Path) -> Result<f64> {
            self.durations
                .get(path)
                .copied()
                .ok_or_else(|| Error::DurationProbe {
                    path: path.to_path_buf(),
                    reason: "not scripted".into(),
                })
        }
    }

    #[derive(Default)]
    struct RecordingFilter {
        calls: Mutex<Vec<(PathBuf, f64, PathBuf)>>,
    }

    impl TempoFilter for RecordingFilter {
        fn apply(&self, input: &Path, tempo: f64, output: &Path) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), tempo, output.to_path_buf()));
            Ok(())
        }
    }

    fn probe_for(original: f64, synthesized: f64) -> MapProbe {
        let mut durations = HashMap::new();
        durations.insert(PathBuf::from("/work/audio.mp4"), original);
        durations.insert(PathBuf::from("/work/new_audio.wav"), synthesized);
        MapProbe { durations }
    }

    #[test]
    fn test_resynchronize_applies_reciprocal() {
        let probe = probe_for(10.0, 25.0);
        let filter = RecordingFilter::default();
        let original = MediaAsset::audio("/work/audio.mp4");
        let synthesized = MediaAsset::audio("/work/new_audio.wav");

        let (adjusted, correction) = resynchronize(
            &probe,
            &filter,
            &original,
            &synthesized,
            Path::new("/work/adjusted_audio.wav"),
        )
        .unwrap();

        assert_eq!(adjusted.path(), Path::new("/work/adjusted_audio.wav"));
        assert!(correction.clamped);
        assert_eq!(correction.applied, 0.5);

        let calls = filter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, PathBuf::from("/work/new_audio.wav"));
        assert_eq!(calls[0].1, 2.0);
    }

    #[test]
    fn test_resynchronize_degenerate_skips_transform() {
        let probe = probe_for(10.0, 0.0);
        let filter = RecordingFilter::default();
        let original = MediaAsset::audio("/work/audio.mp4");
        let synthesized = MediaAsset::audio("/work/new_audio.wav");

        let result = resynchronize(
            &probe,
            &filter,
            &original,
            &synthesized,
            Path::new("/work/adjusted_audio.wav"),
        );

        assert!(matches!(result, Err(Error::DegenerateDuration { .. })));
        assert!(filter.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_resynchronize_probe_failure_skips_transform() {
        let probe = MapProbe {
            durations: HashMap::new(),
        };
        let filter = RecordingFilter::default();
        let original = MediaAsset::audio("/work/audio.mp4");
        let synthesized = MediaAsset::audio("/work/new_audio.wav");

        let result = resynchronize(
            &probe,
            &filter,
            &original,
            &synthesized,
            Path::new("/work/adjusted_audio.wav"),
        );

        assert!(matches!(result, Err(Error::DurationProbe { .. })));
        assert!(filter.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_resynchronize_unclamped_passthrough() {
        let probe = probe_for(10.0, 8.0);
        let filter = RecordingFilter::default();
        let original = MediaAsset::audio("/work/audio.mp4");
        let synthesized = MediaAsset::audio("/work/new_audio.wav");

        let (_, correction) = resynchronize(
            &probe,
            &filter,
            &original,
            &synthesized,
            Path::new("/work/adjusted_audio.wav"),
        )
        .unwrap();

        assert!(!correction.clamped);
        assert!((correction.applied - 1.25).abs() < 1e-12);

        let calls = filter.calls.lock().unwrap();
        assert!((calls[0].1 - 0.8).abs() < 1e-12);
    }
}
