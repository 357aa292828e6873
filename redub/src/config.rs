use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A validated language for the dubbing pipeline.
///
/// Wraps a language code that has been verified against whisper.cpp's
/// supported language list. Accepts both short codes ("en", "de") and
/// full names ("english", "german"); always normalizes to the short code,
/// which is what the translation and synthesis backends expect too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    /// Short code as whisper expects it.
    code: String,
    /// Whisper internal language ID.
    id: i32,
}

impl Language {
    /// Create a language from a code or full name, validating against whisper.cpp.
    pub fn new(lang: &str) -> Result<Self> {
        let lower = lang.trim().to_lowercase();
        match whisper_rs::get_lang_id(&lower) {
            Some(id) => {
                // Normalize full names to the short code
                let code = whisper_rs::get_lang_str(id).unwrap_or(&lower).to_string();
                Ok(Language { code, id })
            }
            None => Err(Error::UnsupportedLanguage(lang.to_string())),
        }
    }

    /// The short language code (e.g. "en").
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whisper internal language ID.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// List all supported languages as (code, full_name) pairs.
    pub fn supported() -> Vec<(&'static str, &'static str)> {
        let max = whisper_rs::get_lang_max_id();
        (0..=max)
            .filter_map(|id| {
                let code = whisper_rs::get_lang_str(id)?;
                let name = whisper_rs::get_lang_str_full(id)?;
                Some((code, name))
            })
            .collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Whisper model sizes.
#[derive(Debug, Clone)]
pub enum WhisperModel {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV2,
    LargeV3,
    LargeV3Turbo,
    /// User-provided ggml file path.
    Custom(PathBuf),
}

impl WhisperModel {
    /// Model filename as used by HuggingFace / whisper.cpp.
    pub fn filename(&self) -> String {
        match self {
            WhisperModel::Tiny => "ggml-tiny.bin".into(),
            WhisperModel::TinyEn => "ggml-tiny.en.bin".into(),
            WhisperModel::Base => "ggml-base.bin".into(),
            WhisperModel::BaseEn => "ggml-base.en.bin".into(),
            WhisperModel::Small => "ggml-small.bin".into(),
            WhisperModel::SmallEn => "ggml-small.en.bin".into(),
            WhisperModel::Medium => "ggml-medium.bin".into(),
            WhisperModel::MediumEn => "ggml-medium.en.bin".into(),
            WhisperModel::LargeV2 => "ggml-large-v2.bin".into(),
            WhisperModel::LargeV3 => "ggml-large-v3.bin".into(),
            WhisperModel::LargeV3Turbo => "ggml-large-v3-turbo.bin".into(),
            WhisperModel::Custom(path) => path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom-model".into()),
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::TinyEn => "tiny.en",
            WhisperModel::Base => "base",
            WhisperModel::BaseEn => "base.en",
            WhisperModel::Small => "small",
            WhisperModel::SmallEn => "small.en",
            WhisperModel::Medium => "medium",
            WhisperModel::MediumEn => "medium.en",
            WhisperModel::LargeV2 => "large-v2",
            WhisperModel::LargeV3 => "large-v3",
            WhisperModel::LargeV3Turbo => "large-v3-turbo",
            WhisperModel::Custom(_) => "custom",
        }
    }

    /// Parse from string (e.g. CLI argument).
    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "tiny" => Some(WhisperModel::Tiny),
            "tiny.en" => Some(WhisperModel::TinyEn),
            "base" => Some(WhisperModel::Base),
            "base.en" => Some(WhisperModel::BaseEn),
            "small" => Some(WhisperModel::Small),
            "small.en" => Some(WhisperModel::SmallEn),
            "medium" => Some(WhisperModel::Medium),
            "medium.en" => Some(WhisperModel::MediumEn),
            "large-v2" => Some(WhisperModel::LargeV2),
            "large-v3" => Some(WhisperModel::LargeV3),
            "large-v3-turbo" => Some(WhisperModel::LargeV3Turbo),
            _ => None,
        }
    }
}

impl Default for WhisperModel {
    fn default() -> Self {
        WhisperModel::Base
    }
}

/// Builder for a dubbing run.
///
/// Source and target languages are the only required values; everything
/// else has a sensible default.
#[derive(Debug, Clone)]
pub struct DubOptions {
    pub source_lang: Language,
    pub target_lang: Language,
    /// Intermediate language for two-hop translation when no direct
    /// route exists.
    pub pivot_lang: Language,
    pub model: WhisperModel,
    /// Output file name, joined onto `work_dir` (absolute paths override).
    pub output_file: PathBuf,
    /// Working directory for intermediate files and the final output.
    pub work_dir: PathBuf,
    /// Cache root for models and voices. Defaults to ~/.cache/redub.
    pub cache_dir: Option<PathBuf>,
    /// Remove intermediate files after a successful run.
    pub cleanup: bool,
    pub gpu: bool,
    pub gpu_device: u32,
    pub threads: Option<u32>,
}

impl DubOptions {
    /// Create options for dubbing from `source` into `target`.
    /// Both are validated against the supported language list.
    pub fn new(source: &str, target: &str) -> Result<Self> {
        Ok(Self {
            source_lang: Language::new(source)?,
            target_lang: Language::new(target)?,
            pivot_lang: Language::new("en")?,
            model: WhisperModel::default(),
            output_file: PathBuf::from("output.mp4"),
            work_dir: PathBuf::from("output"),
            cache_dir: None,
            cleanup: true,
            gpu: true,
            gpu_device: 0,
            threads: None,
        })
    }

    /// Set the pivot language. Validates against the supported list.
    pub fn pivot_lang(mut self, lang: &str) -> Result<Self> {
        self.pivot_lang = Language::new(lang)?;
        Ok(self)
    }

    pub fn model(mut self, model: WhisperModel) -> Self {
        self.model = model;
        self
    }

    pub fn output_file(mut self, name: impl Into<PathBuf>) -> Self {
        self.output_file = name.into();
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    pub fn cleanup(mut self, enabled: bool) -> Self {
        self.cleanup = enabled;
        self
    }

    pub fn gpu(mut self, enabled: bool) -> Self {
        self.gpu = enabled;
        self
    }

    pub fn gpu_device(mut self, device: u32) -> Self {
        self.gpu_device = device;
        self
    }

    pub fn threads(mut self, n: u32) -> Self {
        self.threads = Some(n);
        self
    }

    /// Full path of the final output file.
    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(&self.output_file)
    }

    /// Whisper model cache, defaulting to ~/.cache/redub/models.
    pub fn resolve_models_dir(&self) -> PathBuf {
        models_dir(self.cache_dir.as_deref())
    }

    /// Piper voice cache, defaulting to ~/.cache/redub/voices.
    pub fn resolve_voices_dir(&self) -> PathBuf {
        voices_dir(self.cache_dir.as_deref())
    }
}

/// Whisper model cache under `cache_dir`, or ~/.cache/redub/models.
pub fn models_dir(cache_dir: Option<&Path>) -> PathBuf {
    cache_root(cache_dir).join("models")
}

/// Piper voice cache under `cache_dir`, or ~/.cache/redub/voices.
pub fn voices_dir(cache_dir: Option<&Path>) -> PathBuf {
    cache_root(cache_dir).join("voices")
}

fn cache_root(cache_dir: Option<&Path>) -> PathBuf {
    match cache_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("redub"),
    }
}
