//! Reward Rotor
//!
//! Command-line entry point: loads the configuration, sets up logging and
//! runs the requested command against the simulated ad SDK.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use reward_rotor::commands::{ConfigCommand, Sha256Command, SimulateCommand};
use reward_rotor::core::{AdFormat, AppConfig, APP_NAME, VERSION};
use reward_rotor::ads::SimulationProfile;

#[derive(Parser, Debug)]
#[command(name = "reward-rotor")]
#[command(about = "Dual-slot rewarded ad rotation", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a controller against the simulated ad SDK
    Simulate {
        /// Ad format to drive
        #[arg(short, long, value_enum, default_value_t = FormatArg::Rewarded)]
        format: FormatArg,

        /// Number of display requests
        #[arg(short, long, default_value_t = 5)]
        shows: u32,

        /// Pause between display requests, in milliseconds
        #[arg(short, long, default_value_t = 2000)]
        interval_ms: u64,

        /// Every nth load reports no fill (0 = never)
        #[arg(long, default_value_t = 4)]
        fail_every_nth_load: u64,

        /// Every nth display fails to show (0 = never)
        #[arg(long, default_value_t = 5)]
        fail_every_nth_show: u64,
    },
    /// Write the default configuration file
    Config {
        /// Print to stdout instead of writing
        #[arg(long)]
        print: bool,
    },
    /// Print the SHA-256 hex digest of a string
    Sha256 {
        /// Text to hash
        input: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Rewarded,
    RewardedInterstitial,
}

impl From<FormatArg> for AdFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Rewarded => AdFormat::Rewarded,
            FormatArg::RewardedInterstitial => AdFormat::RewardedInterstitial,
        }
    }
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Config { print } => {
            let command = ConfigCommand { path: cli.config, print };
            if !print {
                init_logging(cli.log_level.as_deref().unwrap_or("info"), true)?;
            }
            command.execute().await?;
        }
        Command::Sha256 { input } => {
            Sha256Command { input }.execute();
        }
        Command::Simulate {
            format,
            shows,
            interval_ms,
            fail_every_nth_load,
            fail_every_nth_show,
        } => {
            let config = load_config(cli.config).await?;
            let level = cli.log_level.unwrap_or_else(|| config.logging.level.clone());
            init_logging(&level, config.logging.with_file)?;
            info!("{} v{} starting...", APP_NAME, VERSION);

            let command = SimulateCommand {
                format: format.into(),
                shows,
                interval: Duration::from_millis(interval_ms),
                profile: SimulationProfile {
                    fail_every_nth_load,
                    fail_every_nth_show,
                    ..SimulationProfile::default()
                },
            };
            command.execute(&config).await?;
        }
    }

    Ok(())
}

/// Load configuration from an explicit path or the default location
async fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(&path).await?,
        None => AppConfig::load().await?,
    };
    Ok(config)
}

/// Install the global tracing subscriber
fn init_logging(level: &str, with_file: bool) -> Result<()> {
    let level: Level = level
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid log level: {}", level))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_file(with_file)
        .with_line_number(with_file)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
