use std::path::PathBuf;

use clap::Parser;
use redub::{DubOptions, Language, WhisperModel};

/// Flags that run a standalone mode instead of a dub.
const MODES: [&str; 5] = [
    "list_voices",
    "download_voice",
    "list_models",
    "download_model",
    "list_languages",
];

#[derive(Parser)]
#[command(name = "redub", about = "Dub a video from a URL into another language")]
struct Cli {
    /// Video URL to dub.
    #[arg(long, required_unless_present_any = MODES)]
    url: Option<String>,

    /// Language spoken in the source video (e.g. "de").
    #[arg(short, long, alias = "source_lang", required_unless_present_any = MODES)]
    source_lang: Option<String>,

    /// Language to dub into (e.g. "en").
    #[arg(short, long, alias = "target_lang", required_unless_present_any = MODES)]
    target_lang: Option<String>,

    /// Output file name, placed inside the working directory.
    #[arg(short, long, alias = "output_file", default_value = "output.mp4")]
    output_file: PathBuf,

    /// Working directory for intermediate files and the output.
    #[arg(long, default_value = "output")]
    work_dir: PathBuf,

    /// Whisper model for transcription.
    #[arg(short, long, default_value = "base")]
    model: String,

    /// Intermediate language for two-hop translation fallback.
    #[arg(long, default_value = "en")]
    pivot_lang: String,

    /// Keep intermediate files after a successful run.
    #[arg(long)]
    no_cleanup: bool,

    /// Disable GPU acceleration.
    #[arg(long)]
    no_gpu: bool,

    /// GPU device ID.
    #[arg(long, default_value = "0")]
    gpu_device: u32,

    /// Number of threads (default: auto).
    #[arg(long)]
    threads: Option<u32>,

    /// Model and voice cache directory.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// List available voices.
    #[arg(long)]
    list_voices: bool,

    /// Download the voice for a language without dubbing.
    #[arg(long)]
    download_voice: Option<String>,

    /// List available models.
    #[arg(long)]
    list_models: bool,

    /// Download a model without dubbing.
    #[arg(long)]
    download_model: Option<String>,

    /// List supported languages.
    #[arg(long)]
    list_languages: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("redub=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.list_languages {
        println!("{:<6} {}", "CODE", "LANGUAGE");
        println!("{:<6} {}", "----", "--------");
        for (code, name) in Language::supported() {
            let voiced = if redub::voice::voice_for_language(code).is_some() {
                "  (voice available)"
            } else {
                ""
            };
            println!("{code:<6} {name}{voiced}");
        }
        return;
    }

    if cli.list_voices {
        println!("{:<6} {}", "LANG", "VOICE");
        println!("{:<6} {}", "----", "-----");
        for voice in redub::voice::VOICES {
            println!("{:<6} {}", voice.language, voice.id());
        }

        let voices_dir = redub::config::voices_dir(cli.cache_dir.as_deref());
        let cached = redub::voice::list_cached_voices(&voices_dir);
        if !cached.is_empty() {
            println!("\nCached voices in {}:", voices_dir.display());
            for path in cached {
                let size = std::fs::metadata(&path)
                    .map(|m| format_bytes(m.len()))
                    .unwrap_or_default();
                println!(
                    "  {} ({})",
                    path.file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    size
                );
            }
        }
        return;
    }

    if let Some(lang) = &cli.download_voice {
        let language = match Language::new(lang) {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error: {e}");
                eprintln!("Use --list-languages to see supported languages");
                std::process::exit(1);
            }
        };
        let spec = match redub::voice::require_voice(&language) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: {e}");
                eprintln!("Use --list-voices to see available voices");
                std::process::exit(1);
            }
        };
        let voices_dir = redub::config::voices_dir(cli.cache_dir.as_deref());
        match redub::voice::ensure_voice(spec, &voices_dir).await {
            Ok(paths) => println!("Voice ready: {}", paths.model.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if cli.list_models {
        let models = [
            ("tiny", "75 MB"),
            ("tiny.en", "75 MB"),
            ("base", "142 MB"),
            ("base.en", "142 MB"),
            ("small", "466 MB"),
            ("small.en", "466 MB"),
            ("medium", "1.5 GB"),
            ("medium.en", "1.5 GB"),
            ("large-v2", "2.9 GB"),
            ("large-v3", "2.9 GB"),
            ("large-v3-turbo", "~1.6 GB"),
        ];
        println!("{:<16} {}", "MODEL", "SIZE");
        println!("{:<16} {}", "-----", "----");
        for (name, size) in models {
            println!("{name:<16} {size}");
        }

        let models_dir = redub::config::models_dir(cli.cache_dir.as_deref());
        let cached = redub::model::list_cached_models(&models_dir);
        if !cached.is_empty() {
            println!("\nCached models in {}:", models_dir.display());
            for path in cached {
                let size = std::fs::metadata(&path)
                    .map(|m| format_bytes(m.len()))
                    .unwrap_or_default();
                println!(
                    "  {} ({})",
                    path.file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    size
                );
            }
        }
        return;
    }

    if let Some(model_name) = &cli.download_model {
        let model = match WhisperModel::parse_name(model_name) {
            Some(m) => m,
            None => {
                eprintln!("Unknown model: {model_name}");
                eprintln!("Use --list-models to see available models");
                std::process::exit(1);
            }
        };
        let models_dir = redub::config::models_dir(cli.cache_dir.as_deref());
        match redub::model::ensure_model(&model, &models_dir).await {
            Ok(path) => println!("Model ready: {}", path.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let url = cli.url.unwrap();
    let source = cli.source_lang.unwrap();
    let target = cli.target_lang.unwrap();

    // Build options
    let model = match WhisperModel::parse_name(&cli.model) {
        Some(m) => m,
        None => {
            // Try as custom model path
            let path = PathBuf::from(&cli.model);
            if path.exists() {
                WhisperModel::Custom(path)
            } else {
                eprintln!("Unknown model: {}", cli.model);
                eprintln!("Use --list-models to see available models, or provide a path to a ggml .bin file");
                std::process::exit(1);
            }
        }
    };

    let options = match DubOptions::new(&source, &target) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --list-languages to see supported languages");
            std::process::exit(1);
        }
    };

    let mut options = match options.pivot_lang(&cli.pivot_lang) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    options = options
        .model(model)
        .output_file(cli.output_file)
        .work_dir(cli.work_dir)
        .cleanup(!cli.no_cleanup)
        .gpu(!cli.no_gpu)
        .gpu_device(cli.gpu_device);

    if let Some(n) = cli.threads {
        options = options.threads(n);
    }
    if let Some(dir) = cli.cache_dir {
        options = options.cache_dir(dir);
    }

    let source_code = options.source_lang.code().to_string();
    let target_code = options.target_lang.code().to_string();

    let dubbed = match redub::dub_with_options(&url, options).await {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error during {}: {e}", e.stage());
            std::process::exit(1);
        }
    };

    eprintln!(
        "Dubbing complete: {source_code} -> {target_code}, speech speed {:.2}x{}",
        dubbed.correction.applied,
        if dubbed.correction.clamped {
            " (clamped)"
        } else {
            ""
        },
    );

    if cli.json {
        match serde_json::to_string_pretty(&dubbed) {
            Ok(j) => println!("{j}"),
            Err(e) => {
                eprintln!("JSON error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("{}", dubbed.path.display());
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.0} MB", bytes as f64 / 1_000_000.0)
    } else {
        format!("{:.0} KB", bytes as f64 / 1_000.0)
    }
}
