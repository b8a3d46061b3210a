//! Mall parking slot allocation service
//!
//! ```sh
//! # Default config (<config_dir>/mall-parking/config.toml)
//! parking-service
//!
//! # Custom config path
//! parking-service --config /etc/mall-parking/config.toml
//!
//! # Throwaway in-memory run on another port
//! DATABASE_URL=memory parking-service --port 9090
//!
//! # Validate config without starting
//! parking-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use mall_parking::config::{default_config_path, AppConfig};
use mall_parking::server::{init_tracing, ServerHandle, ServerOptions};

/// Slot reservation and allocation engine for mall parking.
#[derive(Parser, Debug)]
#[command(name = "parking-service", version, about)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);

    let mut config = AppConfig::load(&config_path)?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.listen_address());
        println!("   Database    : {}", config.database.url);
        println!(
            "   Hold window : {}..={} min (default {})",
            config.reservation.min_hold_minutes,
            config.reservation.max_hold_minutes,
            config.reservation.default_hold_minutes
        );
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;
    handle.install_signal_handler();
    info!("Service started. Press Ctrl+C to shut down gracefully.");

    handle.wait().await;
    Ok(())
}
