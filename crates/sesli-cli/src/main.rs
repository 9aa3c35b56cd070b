use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use sesli_core::config::Config;
use sesli_gateway::GatewayState;
use sesli_media::tts::{HttpTtsClient, SpeechSynthesizer};

#[derive(Parser)]
#[command(
    name = "sesli",
    about = "Real-time voice chat — streamed STT, LLM, and TTS sentence by sentence",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the voice-chat server
    Serve {
        /// Port to listen on (default: from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Synthesize a text fragment to an audio file
    Say {
        text: String,

        /// Output file
        #[arg(short, long, default_value = "out.mp3")]
        out: PathBuf,

        /// Voice ID (default: picked by language detection)
        #[arg(long)]
        voice: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version and configured backends
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config.server_port());
            let state = Arc::new(GatewayState::from_config(config)?);
            sesli_gateway::server::start_server(state, port).await?;
        }
        Commands::Say { text, out, voice } => {
            let tts = HttpTtsClient::new(config.tts);
            tts.synthesize_to_file(&text, &out, voice.as_deref())
                .await?;
            tracing::info!("wrote {}", out.display());
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&config)?;
                println!("{json}");
            }
        },
        Commands::Status => {
            println!("sesli v{}", env!("CARGO_PKG_VERSION"));
            println!("Config: {}", config_path.display());
            println!("Server port: {}", config.server_port());
            println!("STT provider: {}", config.stt.provider);
            println!("LLM provider: {}", config.llm.provider);
            println!("TTS provider: {}", config.tts.provider);
        }
    }

    Ok(())
}
