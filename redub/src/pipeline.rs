//! The dubbing pipeline: strictly sequential stages from URL to dubbed
//! video file. One run per working directory; the intermediate file
//! names are fixed, so concurrent runs must use distinct directories.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::acquire::{MediaSource, YtDlp};
use crate::config::DubOptions;
use crate::error::Result;
use crate::mux::{FfmpegMuxer, Muxer};
use crate::probe::{DurationProbe, Ffprobe};
use crate::resync::{self, FfmpegAtempo, TempoFilter};
use crate::synth::{Piper, SpeechSynthesizer};
use crate::transcribe::{Transcriber, WhisperTranscriber};
use crate::translate::{self, ArgosTranslate, Translator};
use crate::types::{DubbedVideo, MediaAsset, TranslatedText};

/// Downloaded video stream.
pub const VIDEO_FILE: &str = "video.mp4";
/// Downloaded audio stream.
pub const AUDIO_FILE: &str = "audio.mp4";
/// Raw synthesized narration.
pub const SYNTH_AUDIO_FILE: &str = "new_audio.wav";
/// Tempo-adjusted narration.
pub const ADJUSTED_AUDIO_FILE: &str = "adjusted_audio.wav";

/// The swappable collaborators behind one pipeline run.
pub struct Stages {
    pub source: Box<dyn MediaSource>,
    pub transcriber: Box<dyn Transcriber>,
    pub translator: Box<dyn Translator>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub probe: Box<dyn DurationProbe>,
    pub tempo: Box<dyn TempoFilter>,
    pub muxer: Box<dyn Muxer>,
}

impl Stages {
    /// Production backends: yt-dlp, whisper.cpp, argos-translate, piper,
    /// ffprobe and ffmpeg.
    pub fn production(options: &DubOptions) -> Self {
        Self {
            source: Box::new(YtDlp),
            transcriber: Box::new(WhisperTranscriber::new(options)),
            translator: Box::new(ArgosTranslate),
            synthesizer: Box::new(Piper::new(options)),
            probe: Box::new(Ffprobe),
            tempo: Box::new(FfmpegAtempo),
            muxer: Box::new(FfmpegMuxer),
        }
    }
}

/// Sequential dubbing pipeline. Failure at any stage aborts the run;
/// only translation-route fallback and speed-factor clamping recover
/// locally.
pub struct Pipeline {
    options: DubOptions,
    stages: Stages,
}

impl Pipeline {
    pub fn new(options: DubOptions) -> Self {
        let stages = Stages::production(&options);
        Self { options, stages }
    }

    /// Pipeline over custom collaborators.
    pub fn with_stages(options: DubOptions, stages: Stages) -> Self {
        Self { options, stages }
    }

    pub fn options(&self) -> &DubOptions {
        &self.options
    }

    /// Run the full pipeline for one URL.
    pub async fn run(&self, url: &str) -> Result<DubbedVideo> {
        let result = self.run_stages(url).await;
        if let Err(e) = &result {
            error!(stage = e.stage(), error = %e, "dubbing run failed");
        }
        result
    }

    async fn run_stages(&self, url: &str) -> Result<DubbedVideo> {
        let opts = &self.options;
        let work_dir = &opts.work_dir;

        info!(
            %url,
            source = %opts.source_lang,
            target = %opts.target_lang,
            work_dir = %work_dir.display(),
            "starting dubbing run"
        );

        let media = self.stages.source.fetch(url, work_dir).await?;

        let transcript = self
            .stages
            .transcriber
            .transcribe(media.audio.path(), &opts.source_lang)
            .await?;
        debug!(chars = transcript.text.len(), "transcribed");

        let translated = TranslatedText {
            text: translate::translate_text(
                self.stages.translator.as_ref(),
                &transcript.text,
                &opts.source_lang,
                &opts.target_lang,
                &opts.pivot_lang,
            )
            .await?,
            language: opts.target_lang.code().to_string(),
        };

        let voice = self
            .stages
            .synthesizer
            .ensure_voice(&opts.target_lang)
            .await?;
        let synth_path = self
            .stages
            .synthesizer
            .synthesize(&translated.text, &voice, &work_dir.join(SYNTH_AUDIO_FILE))
            .await?;
        let synthesized = MediaAsset::audio(synth_path);

        let (adjusted, correction) = resync::resynchronize(
            self.stages.probe.as_ref(),
            self.stages.tempo.as_ref(),
            &media.audio,
            &synthesized,
            &work_dir.join(ADJUSTED_AUDIO_FILE),
        )?;

        let output = opts.output_path();
        self.stages
            .muxer
            .mux(media.video.path(), adjusted.path(), &output)?;

        let dubbed = DubbedVideo {
            path: output.clone(),
            correction,
        };

        self.report_residual(&media.audio, &dubbed);

        if opts.cleanup {
            cleanup_intermediates(work_dir, &output);
        }

        info!(path = %output.display(), "dubbing run complete");
        Ok(dubbed)
    }

    /// Probe the final file and log the leftover duration mismatch
    /// against the original audio. A clamped correction shows up here as
    /// a visible residual instead of a silent drift.
    fn report_residual(&self, original_audio: &MediaAsset, dubbed: &DubbedVideo) {
        let probe = self.stages.probe.as_ref();
        let Ok(original_secs) = original_audio.duration_secs(probe) else {
            return;
        };

        match probe.duration_secs(&dubbed.path) {
            Ok(final_secs) => {
                let residual = final_secs - original_secs;
                if dubbed.correction.clamped || residual.abs() > 0.5 {
                    warn!(
                        original_secs,
                        final_secs,
                        residual_secs = residual,
                        "dubbed duration deviates from original"
                    );
                } else {
                    debug!(residual_secs = residual, "dubbed duration matches original");
                }
            }
            Err(e) => debug!(error = %e, "could not probe final file"),
        }
    }
}

/// Delete intermediate media files from a successful run, keeping the
/// final output. Failures are logged, never propagated; a leftover
/// temp file must not fail a finished dub.
fn cleanup_intermediates(work_dir: &Path, keep: &Path) {
    let keep = keep.canonicalize().unwrap_or_else(|_| keep.to_path_buf());

    let entries = match std::fs::read_dir(work_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %work_dir.display(), error = %e, "failed to scan work dir for cleanup");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        let is_media = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| matches!(ext, "mp4" | "wav"));
        if !is_media {
            continue;
        }

        let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
        if resolved == keep {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed intermediate file"),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove intermediate file")
            }
        }
    }
}
