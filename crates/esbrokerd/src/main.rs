//! esbrokerd: the Elasticsearch service broker daemon.
//!
//! Single binary that assembles the broker:
//! - Configuration (TOML file + environment overrides)
//! - Ledger (PostgreSQL or embedded redb)
//! - Cluster gateway (Elasticsearch Service API or in-memory fake)
//! - Orchestrator
//! - REST API
//!
//! # Usage
//!
//! ```text
//! esbrokerd serve --config /etc/esbroker.toml --port 3000
//! esbrokerd plans --config /etc/esbroker.toml
//! ```

mod startup;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use esbroker_core::BrokerConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::startup::{StartupError, assemble, load_config};

const DEFAULT_FILTER: &str = "info,esbroker=debug,esbrokerd=debug";

#[derive(Parser)]
#[command(name = "esbrokerd", about = "Elasticsearch service broker daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the broker API.
    Serve {
        /// Path to the configuration file.
        #[arg(long, env = "ESBROKER_CONFIG")]
        config: Option<PathBuf>,

        /// Port to listen on.
        #[arg(long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,
    },

    /// Print the plan catalog as JSON.
    Plans {
        /// Path to the configuration file.
        #[arg(long, env = "ESBROKER_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            log_json,
        } => {
            init_tracing(log_json);
            if let Err(e) = serve(config, port).await {
                error!(error = %e, "esbroker failed to start");
                return Err(e.into());
            }
            Ok(())
        }
        Command::Plans { config } => {
            init_tracing(false);
            print_plans(config)
        }
    }
}

async fn serve(config_path: Option<PathBuf>, port: u16) -> Result<(), ServeError> {
    info!("esbroker starting");

    let config = load_config(config_path.as_deref())?;
    let orchestrator = assemble(config).await?;

    let router = esbroker_api::build_router(orchestrator);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ServeError::Io)?;
    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServeError::Io)?;

    info!("esbroker stopped");
    Ok(())
}

/// Either a startup failure or the listener going away.
#[derive(Debug, thiserror::Error)]
enum ServeError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("listener: {0}")]
    Io(std::io::Error),
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler, run until killed.
            error!(error = %e, "unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

/// The catalog only needs the plan table, so the rest of the
/// configuration is not validated here.
fn print_plans(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => BrokerConfig::from_file(&path)?,
        None => BrokerConfig::default(),
    };
    config.apply_env();
    let catalog = config.catalog()?;
    let plans: Vec<_> = catalog.iter().collect();
    println!("{}", serde_json::to_string_pretty(&plans)?);
    Ok(())
}
