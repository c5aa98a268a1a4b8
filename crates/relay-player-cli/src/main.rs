//! Relay Player CLI - Headless playback driver
//!
//! Features:
//! - Relay URL resolution and decoding
//! - Playback strategy planning
//! - Preset listing
//! - Session simulation against a scripted engine event timeline

use clap::{Parser, Subcommand, ValueEnum};
use relay_player_core::{CanPlay, PlayerConfig};
use std::path::PathBuf;

mod commands;
mod headless;
mod output;

/// Relay Player CLI - Stream playback planner
#[derive(Parser)]
#[command(name = "relay-player")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Plan and simulate relayed stream playback", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Player configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Native HLS support to assume for the rendering surface
#[derive(Clone, Copy, ValueEnum)]
enum Native {
    Probably,
    Maybe,
    No,
}

impl From<Native> for CanPlay {
    fn from(native: Native) -> Self {
        match native {
            Native::Probably => CanPlay::Probably,
            Native::Maybe => CanPlay::Maybe,
            Native::No => CanPlay::No,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the relay URL for a stream URL
    Resolve {
        /// Stream URL (.m3u8 or .ts)
        url: String,
    },

    /// Show which playback strategy a stream URL gets
    Plan {
        /// Stream URL (.m3u8 or .ts)
        url: String,

        /// Native HLS support of the surface
        #[arg(short, long, value_enum, default_value = "no")]
        native: Native,
    },

    /// List configured presets
    Presets,

    /// Run a playback session against a scripted engine
    Simulate {
        /// Stream URL (.m3u8 or .ts)
        #[arg(required_unless_present = "preset")]
        url: Option<String>,

        /// Play a configured preset instead of a URL
        #[arg(short, long, conflicts_with = "url")]
        preset: Option<String>,

        /// JSON file with an array of engine events
        #[arg(short, long)]
        events: Option<PathBuf>,

        /// Native HLS support of the surface
        #[arg(short, long, value_enum, default_value = "no")]
        native: Native,

        /// Reject every play request, as an autoplay policy would
        #[arg(long)]
        block_autoplay: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            PlayerConfig::from_json_str(&json)?
        }
        None => PlayerConfig::default(),
    };

    relay_player_core::init();

    match cli.command {
        Commands::Resolve { url } => {
            commands::resolve(&config, &url, &cli.format)?;
        }
        Commands::Plan { url, native } => {
            commands::plan(&config, &url, native.into(), &cli.format)?;
        }
        Commands::Presets => {
            commands::presets(&config, &cli.format)?;
        }
        Commands::Simulate { url, preset, events, native, block_autoplay } => {
            let timeline = match events {
                Some(path) => {
                    let json = tokio::fs::read_to_string(&path).await?;
                    serde_json::from_str(&json)?
                }
                None => commands::default_timeline(),
            };
            let source = match (url, preset) {
                (_, Some(name)) => commands::Source::Preset(name),
                (Some(url), None) => commands::Source::Url(url),
                (None, None) => anyhow::bail!("either a URL or --preset is required"),
            };
            commands::simulate(
                config,
                source,
                timeline,
                native.into(),
                block_autoplay,
                &cli.format,
            )?;
        }
    }

    Ok(())
}
