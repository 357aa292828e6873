use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::{DubOptions, Language};
use crate::error::{Error, Result};
use crate::process::{is_missing_tool, stderr_excerpt};
use crate::voice::{self, VoicePaths};

/// Synthesizes speech from text into a wav file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Make sure a voice for `language` is available locally.
    async fn ensure_voice(&self, language: &Language) -> Result<VoicePaths>;

    /// Speak `text` with `voice` into `out`. Returns the written path.
    async fn synthesize(&self, text: &str, voice: &VoicePaths, out: &Path) -> Result<PathBuf>;
}

/// Production synthesizer backed by the piper CLI.
/// Text goes in on stdin; piper writes a wav file.
pub struct Piper {
    voices_dir: PathBuf,
}

impl Piper {
    pub fn new(options: &DubOptions) -> Self {
        Self {
            voices_dir: options.resolve_voices_dir(),
        }
    }
}

/// Argument list for a piper run.
fn piper_args(voice: &VoicePaths, out: &Path) -> Vec<OsString> {
    vec![
        OsString::from("--model"),
        voice.model.clone().into_os_string(),
        OsString::from("--config"),
        voice.config.clone().into_os_string(),
        OsString::from("--output_file"),
        out.as_os_str().to_os_string(),
    ]
}

#[async_trait]
impl SpeechSynthesizer for Piper {
    async fn ensure_voice(&self, language: &Language) -> Result<VoicePaths> {
        let spec = voice::require_voice(language)?;
        voice::ensure_voice(spec, &self.voices_dir).await
    }

    async fn synthesize(&self, text: &str, voice: &VoicePaths, out: &Path) -> Result<PathBuf> {
        info!(chars = text.len(), out = %out.display(), "synthesizing speech");

        let mut child = tokio::process::Command::new("piper")
            .args(piper_args(voice, out))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if is_missing_tool(&e) {
                    Error::PiperNotFound
                } else {
                    Error::Synthesis(format!("failed to run piper: {e}"))
                }
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Synthesis("failed to open piper stdin".into()))?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| Error::Synthesis(format!("failed to write text to piper: {e}")))?;
        stdin
            .shutdown()
            .await
            .map_err(|e| Error::Synthesis(format!("failed to close piper stdin: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::Synthesis(format!("piper did not exit cleanly: {e}")))?;

        if !output.status.success() {
            return Err(Error::Synthesis(format!(
                "piper failed: {}",
                stderr_excerpt(&output)
            )));
        }

        if !out.exists() {
            return Err(Error::Synthesis(format!(
                "piper produced no file at {}",
                out.display()
            )));
        }

        debug!(path = %out.display(), "synthesized audio written");
        Ok(out.to_path_buf())
    }
}
