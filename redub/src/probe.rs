use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::process::{is_missing_tool, stderr_excerpt};

/// Measures the playable duration of a local media file.
pub trait DurationProbe: Send + Sync {
    fn duration_secs(&self, path: &Path) -> Result<f64>;
}

/// Production probe backed by ffprobe's `format=duration` query.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ffprobe;

impl DurationProbe for Ffprobe {
    fn duration_secs(&self, path: &Path) -> Result<f64> {
        if !path.exists() {
            return Err(probe_err(path, "file does not exist".into()));
        }

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .map_err(|e| {
                if is_missing_tool(&e) {
                    probe_err(path, "ffprobe not found — install with: apt install ffmpeg".into())
                } else {
                    probe_err(path, format!("failed to run ffprobe: {e}"))
                }
            })?;

        if !output.status.success() {
            return Err(probe_err(
                path,
                format!("ffprobe failed: {}", stderr_excerpt(&output)),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration = parse_duration(&stdout)
            .ok_or_else(|| probe_err(path, format!("unparseable duration output: {stdout:?}")))?;

        debug!(path = %path.display(), duration_secs = duration, "probed duration");
        Ok(duration)
    }
}

fn probe_err(path: &Path, reason: String) -> Error {
    Error::DurationProbe {
        path: path.to_path_buf(),
        reason,
    }
}

/// Parse ffprobe's duration output: a bare decimal, or "N/A" for
/// containers without a known duration.
pub(crate) fn parse_duration(output: &str) -> Option<f64> {
    let value: f64 = output.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_parse_duration_plain() {
        assert_eq!(parse_duration("142.5\n"), Some(142.5));
    }

    #[test]
    fn test_parse_duration_integer() {
        assert_eq!(parse_duration("60"), Some(60.0));
    }

    #[test]
    fn test_parse_duration_whitespace() {
        assert_eq!(parse_duration("  7.25  \n"), Some(7.25));
    }

    #[test]
    fn test_parse_duration_not_available() {
        assert_eq!(parse_duration("N/A\n"), None);
    }

    #[test]
    fn test_parse_duration_empty() {
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_parse_duration_garbage() {
        assert_eq!(parse_duration("duration=12.0"), None);
    }

    #[test]
    fn test_parse_duration_rejects_infinite() {
        assert_eq!(parse_duration("inf"), None);
    }

    #[test]
    fn test_ffprobe_missing_file() {
        let result = Ffprobe.duration_secs(&PathBuf::from("/nonexistent/clip.mp4"));
        match result {
            Err(Error::DurationProbe { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/clip.mp4"));
            }
            other => panic!("expected DurationProbe error, got {other:?}"),
        }
    }
}
