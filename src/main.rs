//! cloud-resilience
//!
//! Runs the demo services, alone or together.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────── consumer ─────────────────────────────┐
//!   GET / /fail      │  handler ─▶ Caller ─▶ CircuitBreaker ─▶ timeout ─▶ HttpRemote ───┼──▶ provider
//!   /sleep  ────────▶│                 │                                  (ServicePool) │    GET / /fail /sleep
//!                    │                 └──▶ ProviderFallback (on any CallError)         │
//!                    └───────────────────────────────────────────────────────────────────┘
//!
//!                    ┌──────────────────────── resilience demo ──────────────────────────┐
//!   GET /test*  ────▶│  handler ─▶ Caller ─▶ Policy (from PolicyRegistry) ─▶ demo work   │
//!   GET /check       │                 └──▶ FixedFallback "ok fallback"                  │
//!                    └───────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use cloud_resilience::config::loader::load_or_default;
use cloud_resilience::lifecycle::{signals, startup};
use cloud_resilience::observability::{logging, metrics};
use cloud_resilience::{App, Shutdown};

#[derive(Parser)]
#[command(name = "cloud-resilience")]
#[command(about = "Provider, consumer, resilience policy and config client demo services", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which service to run.
    #[arg(value_enum, default_value_t = Target::All)]
    target: Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Provider,
    Consumer,
    Resilience,
    ConfigClient,
    All,
}

impl Target {
    fn apps(self) -> Vec<App> {
        match self {
            Target::Provider => vec![App::Provider],
            Target::Consumer => vec![App::Consumer],
            Target::Resilience => vec![App::Resilience],
            Target::ConfigClient => vec![App::ConfigClient],
            Target::All => App::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("cloud-resilience v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let running = startup::launch(&config, &cli.target.apps(), &shutdown).await?;

    signals::wait_for_termination().await;
    shutdown.trigger();

    for app in running {
        match app.handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(app = app.app.as_str(), error = %e, "Server failed"),
            Err(e) => tracing::error!(app = app.app.as_str(), error = %e, "Server task panicked"),
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
