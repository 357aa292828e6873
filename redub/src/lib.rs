//! Video dubbing library — URL in, re-voiced video in the target language out.
//!
//! **redub** handles the full pipeline: downloading (via yt-dlp), transcription
//! (via whisper.cpp), translation (via argos-translate, with an automatic pivot
//! route when no direct one exists), speech synthesis (via piper), duration
//! resynchronization (via ffmpeg's atempo filter), and muxing the new narration
//! back under the original video track.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> redub::Result<()> {
//! // Dub a German video into English
//! let dubbed = redub::dub("https://example.com/video", "de", "en").await?;
//! println!("{}", dubbed.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! Every stage sits behind a trait ([`pipeline::Stages`]), so individual
//! backends can be swapped out or mocked.

pub mod acquire;
pub(crate) mod audio;
pub mod config;
pub mod error;
pub(crate) mod hub;
pub mod model;
pub mod mux;
pub mod pipeline;
pub mod probe;
pub(crate) mod process;
pub mod resync;
pub mod synth;
pub mod transcribe;
pub mod translate;
pub mod types;
pub mod voice;

pub use acquire::MediaSource;
pub use config::{DubOptions, Language, WhisperModel};
pub use error::{Error, Result};
pub use mux::Muxer;
pub use pipeline::{Pipeline, Stages};
pub use probe::DurationProbe;
pub use resync::{TempoCorrection, TempoFilter};
pub use synth::SpeechSynthesizer;
pub use transcribe::Transcriber;
pub use translate::Translator;
pub use types::{AcquiredMedia, DubbedVideo, MediaAsset, Modality};

/// Dub a video from a URL with default options.
pub async fn dub(url: &str, source_lang: &str, target_lang: &str) -> Result<DubbedVideo> {
    dub_with_options(url, DubOptions::new(source_lang, target_lang)?).await
}

/// Dub a video from a URL with custom options.
pub async fn dub_with_options(url: &str, options: DubOptions) -> Result<DubbedVideo> {
    Pipeline::new(options).run(url).await
}
