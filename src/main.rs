//! MQTT v5 session demo - main entry point
//!
//! Runs one demo iteration: connect with backoff retries, negotiate the
//! three-attempt session script, publish, drain acks, disconnect. The
//! wire-level protocol engine is out of scope for this crate, so the binary
//! runs the orchestration against the in-process simulated engine while the
//! transport layer opens real TCP connections to the configured broker.

use clap::{Parser, Subcommand};
use mqtt5_session_demo::config::DemoConfig;
use mqtt5_session_demo::engine::{MonotonicClock, RandomJitter};
use mqtt5_session_demo::logging::init_default_logging;
use mqtt5_session_demo::session::run_demo;
use mqtt5_session_demo::testing::SimulatedEngine;
use mqtt5_session_demo::transport::TcpTransport;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};

/// MQTT v5 session demo client
#[derive(Parser)]
#[command(name = "mqtt5-session-demo")]
#[command(about = "Drives one MQTT v5 session to completion against a broker")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one demo iteration
    Run,
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!(
        "starting MQTT v5 session demo v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_command(config).await,
        Commands::Config { show } => config_command(config, show),
    };

    if let Err(e) = result {
        error!("command failed: {}", e);
        process::exit(1);
    }

    info!("shutdown complete");
}

fn load_configuration(config_path: &Option<PathBuf>) -> Result<DemoConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("loading configuration from: {}", path.display());
            Ok(DemoConfig::load_from_file(path)?)
        }
        None => {
            let default_paths = ["demo.toml", "config/demo.toml"];
            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("loading configuration from: {}", path.display());
                    return Ok(DemoConfig::load_from_file(&path)?);
                }
            }
            info!("no configuration file found, using built-in defaults");
            Ok(DemoConfig::default())
        }
    }
}

async fn run_command(config: DemoConfig) -> Result<(), Box<dyn std::error::Error>> {
    warn!(
        "the wire-level MQTT engine is an external collaborator; \
         running against the in-process simulated engine"
    );

    let mut transport = TcpTransport::new();
    let mut engine = SimulatedEngine::new(Default::default());
    let clock = MonotonicClock::new();
    let mut jitter = RandomJitter::from_entropy();

    run_demo(&config, &mut transport, &mut engine, &clock, &mut jitter).await?;
    Ok(())
}

fn config_command(config: DemoConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    }
    info!("configuration validation complete");
    Ok(())
}
