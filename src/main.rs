//! VoiceBuddy - Conversational Voice Assistant
//!
//! Listens on the microphone, answers through speech, and handles weather
//! lookups and QR codes along the way.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voicebuddy::audio::MicrophoneSource;
use voicebuddy::config::Config;
use voicebuddy::dialogue::{Collaborators, LoopSettings, StdinPrompt, TurnLoop};
use voicebuddy::llm::OllamaModel;
use voicebuddy::qr::QrCodeImage;
use voicebuddy::weather::OpenWeatherClient;
use voicebuddy::{llm, stt, tts};

/// Blocking work (a pending stdin read) gets this long after Ctrl-C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Audio input device index
    #[arg(short, long)]
    device: Option<usize>,

    /// Path to an alternate config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TTS engine override (system, piper)
    #[arg(long)]
    tts: Option<String>,

    /// STT engine override (whisper_api, wyoming)
    #[arg(long)]
    stt: Option<String>,

    /// LLM engine override (groq, ollama)
    #[arg(long)]
    llm: Option<String>,

    /// List audio input devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let result = runtime.block_on(run(args));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(args: Args) -> Result<()> {
    let _ = dotenvy::dotenv();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };

    // Setup logging
    let level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🤖 VoiceBuddy v{} starting...", env!("CARGO_PKG_VERSION"));

    if args.list_devices {
        for device in MicrophoneSource::list_devices()? {
            println!("{}", device);
        }
        return Ok(());
    }

    if let Some(device) = args.device {
        config.input_device = Some(device);
    }
    if let Some(engine) = args.tts {
        config.tts_engine = engine;
    }
    if let Some(engine) = args.stt {
        config.stt_engine = engine;
    }
    if let Some(engine) = args.llm {
        config.llm_engine = engine;
    }
    config.validate().context("invalid configuration")?;

    if config.weather_api_key.is_empty() {
        warn!("⚠️ OPEN_WEATHER_API is not set; weather requests will fail");
    }

    if config.llm_engine == "ollama" {
        let ollama = OllamaModel::new(&config).context("creating Ollama client")?;
        if ollama.health_check().await {
            info!("🦙 Ollama reachable at {}", config.ollama_url);
        } else {
            warn!(
                "⚠️ Ollama not reachable at {}; chat will fail until it starts",
                config.ollama_url
            );
        }
    }

    let microphone = MicrophoneSource::new(&config);
    let capture_cancel = microphone.cancel_handle();

    let collaborators = Collaborators {
        audio: Arc::new(microphone),
        stt: stt::create_engine(&config).context("creating STT engine")?,
        tts: tts::create_engine(&config).context("creating TTS engine")?,
        llm: llm::create_model(&config).context("creating language model")?,
        weather: Arc::new(OpenWeatherClient::new(&config).context("creating weather client")?),
        qr: Arc::new(QrCodeImage::new()),
        prompt: Arc::new(StdinPrompt),
    };
    let mut turn_loop = TurnLoop::new(collaborators, LoopSettings::from_config(&config));

    tokio::select! {
        result = turn_loop.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Interrupted, shutting down");
            capture_cancel.store(true, Ordering::SeqCst);
        }
    }

    Ok(())
}
