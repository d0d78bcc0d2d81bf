//! front-door
//!
//! Public entry point of the server.
//!
//! ```text
//!     Client ──▶ listener (plain / TLS) ──▶ CORS, compression, body limit
//!                                              │
//!                         /livenessprobe ◀─────┤
//!                                              ▼
//!                               cookies → session → rate-limit gate
//!                                              │
//!                                              ▼
//!                                login / SSO provider routes, static files
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use front_door::collaborators::Collaborators;
use front_door::config::validation::validate_config;
use front_door::config::{load_config, load_default, ConfigError};
use front_door::lifecycle::{shutdown_signal, ServerBootstrap};
use front_door::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "front-door")]
#[command(about = "Rate-limited HTTP/HTTPS entry point", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,
}

fn load(cli: &Cli) -> Result<front_door::AppConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_default()?,
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("front-door: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);
    tracing::info!("front-door v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        port = config.listener.port,
        tls = config.listener.tls.is_enabled(),
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let base_url = config.base_url();
    let grace = Duration::from_secs(config.server.shutdown_grace_secs);
    let mut bootstrap = ServerBootstrap::new(Arc::new(config), Collaborators::default());

    let Some(mut server) = bootstrap.configure(&base_url).await else {
        return ExitCode::FAILURE;
    };

    let stopped_early = tokio::select! {
        _ = shutdown_signal() => None,
        outcome = server.wait() => Some(outcome),
    };
    let outcome = match stopped_early {
        Some(outcome) => outcome,
        None => {
            server.shutdown(grace);
            server.wait().await
        }
    };
    if let Err(e) = outcome {
        tracing::error!(error = %e, "Server stopped with error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
