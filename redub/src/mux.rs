use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::{Error, Result};
use crate::process::{is_missing_tool, stderr_excerpt};

/// Combines a video track and an audio track into one container.
pub trait Muxer: Send + Sync {
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;
}

/// Argument list for the final mux: copy the video stream untouched,
/// encode the replacement audio as AAC. Explicit stream maps so stray
/// tracks in either input cannot leak into the output.
fn mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-nostdin"),
        OsString::from("-i"),
        video.as_os_str().to_os_string(),
        OsString::from("-i"),
        audio.as_os_str().to_os_string(),
        OsString::from("-map"),
        OsString::from("0:v:0"),
        OsString::from("-map"),
        OsString::from("1:a:0"),
        OsString::from("-c:v"),
        OsString::from("copy"),
        OsString::from("-c:a"),
        OsString::from("aac"),
        OsString::from("-y"),
        output.as_os_str().to_os_string(),
    ]
}

/// Production muxer backed by ffmpeg.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegMuxer;

impl Muxer for FfmpegMuxer {
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        info!(
            video = %video.display(),
            audio = %audio.display(),
            output = %output.display(),
            "muxing dubbed video"
        );

        let result = Command::new("ffmpeg")
            .args(mux_args(video, audio, output))
            .output()
            .map_err(|e| {
                if is_missing_tool(&e) {
                    Error::Mux("ffmpeg not found — install with: apt install ffmpeg".into())
                } else {
                    Error::Mux(format!("failed to run ffmpeg: {e}"))
                }
            })?;

        if !result.status.success() {
            return Err(Error::Mux(format!(
                "ffmpeg mux failed: {}",
                stderr_excerpt(&result)
            )));
        }

        if !output.exists() {
            return Err(Error::Mux(format!(
                "muxed file not found at {}",
                output.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mux_args() {
        let args = mux_args(
            Path::new("/work/video.mp4"),
            Path::new("/work/adjusted_audio.wav"),
            Path::new("/work/output.mp4"),
        );

        let expected: Vec<OsString> = [
            "-nostdin",
            "-i",
            "/work/video.mp4",
            "-i",
            "/work/adjusted_audio.wav",
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-c:v",
            "copy",
            "-c:a",
            "aac",
            "-y",
            "/work/output.mp4",
        ]
        .iter()
        .map(OsString::from)
        .collect();

        assert_eq!(args, expected);
    }

    #[test]
    fn test_mux_missing_inputs() {
        // ffmpeg (or its absence) must fail before writing anything
        let out = std::env::temp_dir().join("redub_test_mux_out.mp4");
        let result = FfmpegMuxer.mux(
            Path::new("/nonexistent/video.mp4"),
            Path::new("/nonexistent/audio.wav"),
            &out,
        );
        assert!(matches!(result, Err(Error::Mux(_))));
        std::fs::remove_file(&out).ok();
    }
}
