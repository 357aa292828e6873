use std::path::PathBuf;

/// All errors that can occur in redub.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("acquisition error: {0}")]
    Acquisition(String),

    #[error("no suitable stream: {0}")]
    NoStream(String),

    #[error("yt-dlp not found — install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("audio decoding error: {0}")]
    AudioDecode(String),

    #[error("audio file not found: {path}")]
    AudioNotFound { path: PathBuf },

    #[error("no speech recognized in the source audio")]
    EmptyTranscript,

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("whisper error: {0}")]
    Whisper(#[from] whisper_rs::WhisperError),

    #[error("unsupported language: \"{0}\" — use Language::supported() to list valid codes")]
    UnsupportedLanguage(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("model not found: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("model download failed: {0}")]
    ModelDownload(String),

    #[error("no translation route from \"{source}\" to \"{target}\"")]
    TranslationUnavailable { r#source: String, target: String },

    #[error("translation error: {0}")]
    Translation(String),

    #[error("argos-translate not found — install with: pip install argostranslate")]
    ArgosNotFound,

    #[error("no voice available for language: \"{0}\"")]
    NoVoiceForLanguage(String),

    #[error("voice download failed: {0}")]
    VoiceDownload(String),

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("piper not found — install with: pip install piper-tts")]
    PiperNotFound,

    #[error("duration probe failed for {path}: {reason}")]
    DurationProbe { path: PathBuf, reason: String },

    #[error("degenerate duration: {seconds}s — cannot compute a speed factor")]
    DegenerateDuration { seconds: f64 },

    #[error("audio processing error: {0}")]
    AudioProcessing(String),

    #[error("mux error: {0}")]
    Mux(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Pipeline stage this error belongs to. Used in diagnostics so a
    /// failed run names where it died.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Acquisition(_) | Error::NoStream(_) | Error::YtDlpNotFound => "acquisition",
            Error::AudioDecode(_)
            | Error::AudioNotFound { .. }
            | Error::EmptyTranscript
            | Error::Transcription(_)
            | Error::Whisper(_)
            | Error::Model(_)
            | Error::ModelNotFound { .. }
            | Error::ModelDownload(_) => "transcription",
            Error::UnsupportedLanguage(_) => "configuration",
            Error::TranslationUnavailable { .. } | Error::Translation(_) | Error::ArgosNotFound => {
                "translation"
            }
            Error::NoVoiceForLanguage(_)
            | Error::VoiceDownload(_)
            | Error::Synthesis(_)
            | Error::PiperNotFound => "synthesis",
            Error::DurationProbe { .. }
            | Error::DegenerateDuration { .. }
            | Error::AudioProcessing(_) => "resync",
            Error::Mux(_) => "mux",
            Error::Io(_) | Error::Http(_) | Error::Json(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_acquisition() {
        let e = Error::Acquisition("network down".into());
        assert_eq!(e.to_string(), "acquisition error: network down");
    }

    #[test]
    fn test_error_display_no_stream() {
        let e = Error::NoStream("only progressive formats".into());
        assert!(e.to_string().contains("only progressive formats"));
    }

    #[test]
    fn test_error_display_model_not_found() {
        let e = Error::ModelNotFound {
            path: PathBuf::from("/tmp/model.bin"),
        };
        assert!(e.to_string().contains("/tmp/model.bin"));
    }

    #[test]
    fn test_error_display_unsupported_language() {
        let e = Error::UnsupportedLanguage("klingon".into());
        let msg = e.to_string();
        assert!(msg.contains("klingon"));
        assert!(msg.contains("Language::supported()"));
    }

    #[test]
    fn test_error_display_translation_unavailable() {
        let e = Error::TranslationUnavailable {
            source: "zh".into(),
            target: "is".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("zh"));
        assert!(msg.contains("is"));
    }

    #[test]
    fn test_error_display_degenerate_duration() {
        let e = Error::DegenerateDuration { seconds: 0.0 };
        assert!(e.to_string().contains("0"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<String>("invalid json").unwrap_err();
        let e: Error = json_err.into();
        assert!(matches!(e, Error::Json(_)));
    }

    #[test]
    fn test_stage_mapping() {
        assert_eq!(Error::YtDlpNotFound.stage(), "acquisition");
        assert_eq!(Error::EmptyTranscript.stage(), "transcription");
        assert_eq!(Error::ArgosNotFound.stage(), "translation");
        assert_eq!(Error::PiperNotFound.stage(), "synthesis");
        assert_eq!(Error::DegenerateDuration { seconds: -1.0 }.stage(), "resync");
        assert_eq!(Error::Mux("boom".into()).stage(), "mux");
    }

    #[test]
    fn test_error_debug_impl() {
        let e = Error::AudioDecode("test error".into());
        let debug = format!("{:?}", e);
        assert!(debug.contains("AudioDecode"));
    }
}
