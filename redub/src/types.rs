use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::probe::DurationProbe;
use crate::resync::TempoCorrection;

/// What kind of track a media file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    Video,
    Audio,
}

/// A local media file. Duration is probed on first request and cached;
/// the file itself is never read by this type.
#[derive(Debug)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub modality: Modality,
    duration: OnceLock<f64>,
}

impl MediaAsset {
    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            modality: Modality::Video,
            duration: OnceLock::new(),
        }
    }

    pub fn audio(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            modality: Modality::Audio,
            duration: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Duration in seconds, probed once through `probe` and cached.
    pub fn duration_secs(&self, probe: &dyn DurationProbe) -> Result<f64> {
        if let Some(d) = self.duration.get() {
            return Ok(*d);
        }
        let d = probe.duration_secs(&self.path)?;
        let _ = self.duration.set(d);
        Ok(d)
    }
}

/// The separate video and audio files produced by acquisition.
#[derive(Debug)]
pub struct AcquiredMedia {
    pub video: MediaAsset,
    pub audio: MediaAsset,
    pub title: Option<String>,
}

/// Recognized speech in the source language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptText {
    pub text: String,
    pub language: String,
}

/// Translated speech text in the target language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedText {
    pub text: String,
    pub language: String,
}

/// The finished dubbed video plus the tempo diagnostics from resync.
/// Terminal artifact; nothing mutates it after the run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DubbedVideo {
    pub path: PathBuf,
    pub correction: TempoCorrection,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::Error;

    struct CountingProbe {
        calls: AtomicUsize,
        value: f64,
    }

    impl DurationProbe for CountingProbe {
        fn duration_secs(&self, _path: &Path) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value)
        }
    }

    struct FailingProbe;

    impl DurationProbe for FailingProbe {
        fn duration_secs(&self, path: &Path) -> Result<f64> {
            Err(Error::DurationProbe {
                path: path.to_path_buf(),
                reason: "no such file".into(),
            })
        }
    }

    #[test]
    fn test_duration_probed_once() {
        let asset = MediaAsset::audio("/tmp/audio.mp4");
        let probe = CountingProbe {
            calls: AtomicUsize::new(0),
            value: 12.5,
        };

        assert_eq!(asset.duration_secs(&probe).unwrap(), 12.5);
        assert_eq!(asset.duration_secs(&probe).unwrap(), 12.5);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duration_error_not_cached() {
        let asset = MediaAsset::video("/tmp/video.mp4");
        assert!(asset.duration_secs(&FailingProbe).is_err());

        // A later probe against a working backend still succeeds.
        let probe = CountingProbe {
            calls: AtomicUsize::new(0),
            value: 3.0,
        };
        assert_eq!(asset.duration_secs(&probe).unwrap(), 3.0);
    }

    #[test]
    fn test_modality_constructors() {
        assert_eq!(MediaAsset::video("a.mp4").modality, Modality::Video);
        assert_eq!(MediaAsset::audio("a.wav").modality, Modality::Audio);
    }
}
