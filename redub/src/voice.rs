//! Piper voice catalog and provisioning.
//!
//! One curated voice per language, downloaded on demand from the
//! `rhasspy/piper-voices` hub and cached next to the whisper models.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Language;
use crate::error::{Error, Result};
use crate::hub;

const HUGGINGFACE_BASE: &str = "https://huggingface.co/rhasspy/piper-voices/resolve/main";

/// Smallest plausible onnx voice model.
const MIN_VOICE_MODEL_BYTES: u64 = 1_000_000;

/// Voice configs are small JSON files.
const MIN_VOICE_CONFIG_BYTES: u64 = 64;

/// A voice the synthesizer can speak with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSpec {
    /// Short language code, matching the transcription language codes.
    pub language: &'static str,
    /// Locale directory on the voice hub (e.g. "en_US").
    pub locale: &'static str,
    /// Voice name (e.g. "lessac").
    pub name: &'static str,
    /// Quality tier ("x_low" through "high").
    pub quality: &'static str,
}

/// One voice per supported target language.
pub const VOICES: &[VoiceSpec] = &[
    VoiceSpec { language: "en", locale: "en_US", name: "lessac", quality: "medium" },
    VoiceSpec { language: "de", locale: "de_DE", name: "thorsten", quality: "medium" },
    VoiceSpec { language: "es", locale: "es_ES", name: "davefx", quality: "medium" },
    VoiceSpec { language: "fr", locale: "fr_FR", name: "siwis", quality: "medium" },
    VoiceSpec { language: "it", locale: "it_IT", name: "riccardo", quality: "x_low" },
    VoiceSpec { language: "pt", locale: "pt_BR", name: "faber", quality: "medium" },
    VoiceSpec { language: "ru", locale: "ru_RU", name: "irina", quality: "medium" },
    VoiceSpec { language: "pl", locale: "pl_PL", name: "darkman", quality: "medium" },
    VoiceSpec { language: "nl", locale: "nl_BE", name: "nathalie", quality: "medium" },
    VoiceSpec { language: "uk", locale: "uk_UA", name: "ukrainian_tts", quality: "medium" },
    VoiceSpec { language: "zh", locale: "zh_CN", name: "huayan", quality: "medium" },
    VoiceSpec { language: "tr", locale: "tr_TR", name: "dfki", quality: "medium" },
    VoiceSpec { language: "cs", locale: "cs_CZ", name: "jirka", quality: "medium" },
    VoiceSpec { language: "da", locale: "da_DK", name: "talesyntese", quality: "medium" },
    VoiceSpec { language: "fi", locale: "fi_FI", name: "harri", quality: "medium" },
    VoiceSpec { language: "el", locale: "el_GR", name: "rapunzelina", quality: "low" },
    VoiceSpec { language: "hu", locale: "hu_HU", name: "anna", quality: "medium" },
    VoiceSpec { language: "no", locale: "no_NO", name: "talesyntese", quality: "medium" },
    VoiceSpec { language: "ro", locale: "ro_RO", name: "mihai", quality: "medium" },
    VoiceSpec { language: "sv", locale: "sv_SE", name: "nst", quality: "medium" },
    VoiceSpec { language: "ar", locale: "ar_JO", name: "kareem", quality: "medium" },
    VoiceSpec { language: "vi", locale: "vi_VN", name: "vais1000", quality: "medium" },
];

impl VoiceSpec {
    /// Canonical voice id, e.g. "en_US-lessac-medium".
    pub fn id(&self) -> String {
        format!("{}-{}-{}", self.locale, self.name, self.quality)
    }

    pub fn model_filename(&self) -> String {
        format!("{}.onnx", self.id())
    }

    pub fn config_filename(&self) -> String {
        format!("{}.onnx.json", self.id())
    }

    pub fn model_url(&self) -> String {
        format!(
            "{HUGGINGFACE_BASE}/{}/{}/{}/{}/{}",
            self.language,
            self.locale,
            self.name,
            self.quality,
            self.model_filename()
        )
    }

    pub fn config_url(&self) -> String {
        format!("{}.json", self.model_url())
    }
}

/// Find the catalog voice for a language code.
pub fn voice_for_language(code: &str) -> Option<&'static VoiceSpec> {
    VOICES.iter().find(|v| v.language == code)
}

/// Catalog voice for `language`, or the error naming the gap.
pub fn require_voice(language: &Language) -> Result<&'static VoiceSpec> {
    voice_for_language(language.code())
        .ok_or_else(|| Error::NoVoiceForLanguage(language.code().to_string()))
}

/// Local paths of a provisioned voice.
#[derive(Debug, Clone)]
pub struct VoicePaths {
    pub model: PathBuf,
    pub config: PathBuf,
}

/// Ensure the voice files for `spec` are cached locally, downloading
/// whichever of the two is missing. Present files are left untouched.
pub async fn ensure_voice(spec: &VoiceSpec, voices_dir: &Path) -> Result<VoicePaths> {
    let model_path = voices_dir.join(spec.model_filename());
    let config_path = voices_dir.join(spec.config_filename());

    if model_path.exists() && config_path.exists() {
        info!(voice = %spec.id(), "voice already cached");
        return Ok(VoicePaths {
            model: model_path,
            config: config_path,
        });
    }

    std::fs::create_dir_all(voices_dir).map_err(|e| {
        Error::VoiceDownload(format!(
            "failed to create cache dir {}: {e}",
            voices_dir.display()
        ))
    })?;

    if !model_path.exists() {
        let url = spec.model_url();
        info!(%url, "downloading voice model");
        hub::fetch(&url, &model_path, MIN_VOICE_MODEL_BYTES, Error::VoiceDownload).await?;
    }

    if !config_path.exists() {
        let url = spec.config_url();
        info!(%url, "downloading voice config");
        hub::fetch(&url, &config_path, MIN_VOICE_CONFIG_BYTES, Error::VoiceDownload).await?;
    }

    Ok(VoicePaths {
        model: model_path,
        config: config_path,
    })
}

/// List cached voice models (the .json configs ride along).
pub fn list_cached_voices(voices_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(voices_dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "onnx"))
        .collect()
}
