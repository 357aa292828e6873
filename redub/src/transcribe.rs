use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio;
use crate::config::{DubOptions, Language, WhisperModel};
use crate::error::{Error, Result};
use crate::model;
use crate::types::TranscriptText;

/// Turns a local audio file into plain text in the given language.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path, language: &Language) -> Result<TranscriptText>;
}

/// Production transcriber backed by whisper.cpp.
///
/// Provisions the model on first use, decodes the input through ffmpeg
/// and runs greedy whisper inference over the whole track.
pub struct WhisperTranscriber {
    model: WhisperModel,
    models_dir: PathBuf,
    gpu: bool,
    gpu_device: u32,
    threads: Option<u32>,
}

impl WhisperTranscriber {
    pub fn new(options: &DubOptions) -> Self {
        Self {
            model: options.model.clone(),
            models_dir: options.resolve_models_dir(),
            gpu: options.gpu,
            gpu_device: options.gpu_device,
            threads: options.threads,
        }
    }

    fn run_whisper(
        &self,
        samples: &[f32],
        model_path: &Path,
        language: &Language,
    ) -> Result<String> {
        info!(model = %model_path.display(), "loading whisper model");

        let mut ctx_params = WhisperContextParameters::new();
        ctx_params.use_gpu(self.gpu);
        ctx_params.gpu_device(self.gpu_device as i32);

        let ctx = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| Error::Model("model path contains invalid UTF-8".into()))?,
            ctx_params,
        )?;

        let mut state = ctx.create_state()?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 5 });
        params.set_language(Some(language.code()));
        params.set_translate(false);

        if let Some(n) = self.threads {
            params.set_n_threads(n as i32);
        }

        // Disable stderr printing from whisper.cpp
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        info!(samples = samples.len(), "running transcription");
        state.full(params, samples)?;

        let num_segments = state.full_n_segments();
        debug!(num_segments, "transcription complete");

        let mut pieces = Vec::with_capacity(num_segments as usize);
        for i in 0..num_segments {
            let segment = state
                .get_segment(i)
                .ok_or_else(|| Error::Transcription(format!("segment {i} not found")))?;
            let text = segment
                .to_str_lossy()
                .map_err(|e| Error::Transcription(format!("segment text error: {e}")))?;
            pieces.push(text.trim().to_string());
        }

        Ok(pieces.join(" "))
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path, language: &Language) -> Result<TranscriptText> {
        let model_path = model::ensure_model(&self.model, &self.models_dir).await?;

        let samples = audio::load_audio(audio_path)?;
        if audio::is_effectively_silent(&samples) {
            return Err(Error::EmptyTranscript);
        }

        let text = self.run_whisper(&samples, &model_path, language)?;
        if text.trim().is_empty() {
            return Err(Error::EmptyTranscript);
        }

        debug!(chars = text.len(), "transcript ready");
        Ok(TranscriptText {
            text,
            language: language.code().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcriber_is_object_safe() {
        fn assert_boxable(_t: Box<dyn Transcriber>) {}

        struct Canned;

        #[async_trait]
        impl Transcriber for Canned {
            async fn transcribe(
                &self,
                _audio_path: &Path,
                language: &Language,
            ) -> Result<TranscriptText> {
                Ok(TranscriptText {
                    text: "hello".into(),
                    language: language.code().to_string(),
                })
            }
        }

        assert_boxable(Box::new(Canned));
    }

    #[tokio::test]
    async fn test_whisper_transcriber_missing_audio() {
        let opts = DubOptions::new("en", "de")
            .unwrap()
            .model(WhisperModel::Custom(std::path::PathBuf::from(
                "/nonexistent/model.bin",
            )));
        let transcriber = WhisperTranscriber::new(&opts);
        let lang = Language::new("en").unwrap();

        // Fails at model provisioning, before touching the audio.
        let result = transcriber
            .transcribe(Path::new("/nonexistent/audio.mp4"), &lang)
            .await;
        assert!(matches!(result, Err(Error::ModelNotFound { .. })));
    }
}
