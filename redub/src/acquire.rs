use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::pipeline::{AUDIO_FILE, VIDEO_FILE};
use crate::process::stderr_excerpt;
use crate::types::{AcquiredMedia, MediaAsset};

/// Fetches a URL into separate local video and audio files.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch(&self, url: &str, work_dir: &Path) -> Result<AcquiredMedia>;
}

/// yt-dlp metadata, reduced to what stream selection needs.
#[derive(Deserialize)]
struct VideoInfo {
    title: Option<String>,
    #[serde(default)]
    formats: Vec<FormatInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct FormatInfo {
    vcodec: Option<String>,
    acodec: Option<String>,
}

fn codec_present(codec: &Option<String>) -> bool {
    codec.as_deref().is_some_and(|c| c != "none")
}

/// Video-only format (separate stream, no muxed audio).
fn is_video_only(format: &FormatInfo) -> bool {
    codec_present(&format.vcodec) && !codec_present(&format.acodec)
}

/// Audio-only format.
fn is_audio_only(format: &FormatInfo) -> bool {
    codec_present(&format.acodec) && !codec_present(&format.vcodec)
}

/// yt-dlp argument list for one stream download (URL appended by the
/// caller).
fn download_args<'a>(selector: &'a str, dest: &'a str) -> Vec<&'a str> {
    vec![
        "--format",
        selector,
        "--no-playlist",
        "--no-exec",
        "--force-overwrites",
        "--output",
        dest,
    ]
}

/// Validate that a string looks like a URL.
/// Rejects anything that isn't http:// or https://.
fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::Acquisition(format!(
            "invalid URL (must start with http:// or https://): {trimmed}"
        )))
    }
}

/// Production media source backed by yt-dlp.
///
/// Downloads the video-only and audio-only streams separately so the
/// pipeline can replace the audio track and copy the video track
/// untouched. Sources that only publish muxed (progressive) formats are
/// rejected up front with a [`Error::NoStream`].
///
/// # Security
/// - URL is validated to start with http:// or https://
/// - Arguments are passed to yt-dlp via `.arg()` (no shell expansion)
/// - `--no-exec` prevents yt-dlp from running post-processing commands
#[derive(Debug, Default, Clone, Copy)]
pub struct YtDlp;

impl YtDlp {
    async fn probe_info(&self, url: &str) -> Result<VideoInfo> {
        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-playlist", "--no-exec"])
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::Acquisition(format!(
                "yt-dlp metadata query failed: {}",
                stderr_excerpt(&output)
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Acquisition(format!("unreadable yt-dlp metadata: {e}")))
    }

    async fn download_stream(&self, url: &str, selector: &str, dest: &Path) -> Result<()> {
        let dest_str = dest
            .to_str()
            .ok_or_else(|| Error::Acquisition("destination path contains invalid UTF-8".into()))?;

        let output = tokio::process::Command::new("yt-dlp")
            .args(download_args(selector, dest_str))
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::Acquisition(format!(
                "yt-dlp failed: {}",
                stderr_excerpt(&output)
            )));
        }

        if !dest.exists() {
            return Err(Error::Acquisition(format!(
                "downloaded file not found at {}",
                dest.display()
            )));
        }

        debug!(path = %dest.display(), "stream downloaded");
        Ok(())
    }
}

#[async_trait]
impl MediaSource for YtDlp {
    async fn fetch(&self, url: &str, work_dir: &Path) -> Result<AcquiredMedia> {
        validate_url(url)?;

        info!(%url, "fetching media");

        // Check yt-dlp is installed
        let check = tokio::process::Command::new("yt-dlp")
            .arg("--version")
            .output()
            .await;

        if check.is_err() {
            return Err(Error::YtDlpNotFound);
        }

        std::fs::create_dir_all(work_dir)?;

        let info = self.probe_info(url).await?;

        let video_ok = info.formats.iter().any(is_video_only);
        let audio_ok = info.formats.iter().any(is_audio_only);
        if !video_ok || !audio_ok {
            let missing = match (video_ok, audio_ok) {
                (false, false) => "video-only or audio-only",
                (false, true) => "video-only",
                _ => "audio-only",
            };
            return Err(Error::NoStream(format!(
                "source offers no {missing} stream for {url}"
            )));
        }

        let video_path = work_dir.join(VIDEO_FILE);
        let audio_path = work_dir.join(AUDIO_FILE);

        self.download_stream(url, "bv[ext=mp4]/bv", &video_path)
            .await?;
        self.download_stream(url, "ba[ext=m4a]/ba", &audio_path)
            .await?;

        if let Some(title) = &info.title {
            info!(%title, "media acquired");
        }

        Ok(AcquiredMedia {
            video: MediaAsset::video(video_path),
            audio: MediaAsset::audio(audio_path),
            title: info.title,
        })
    }
}
