//! gantryd — the Gantry daemon.
//!
//! Single binary that assembles the deploy orchestrator:
//! - Application registry (redb)
//! - Stage ledgers (markdown checklists on disk)
//! - Provider adapters (dokploy, vercel, netlify)
//! - Deploy pipeline with per-application lanes
//! - REST API with live deploy events
//!
//! # Usage
//!
//! ```text
//! gantryd serve --config gantry.toml --port 7070 --data-dir /var/lib/gantry
//! gantryd init --path gantry.toml
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use gantry_core::backoff::BackoffPolicy;
use gantry_core::config::GantryConfig;
use gantry_ledger::LedgerStore;
use gantry_pipeline::Orchestrator;
use gantry_provider::ProviderSet;
use gantry_registry::RegistryStore;

#[derive(Parser)]
#[command(name = "gantryd", about = "Gantry deploy orchestrator daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the orchestrator daemon.
    Serve {
        /// Path to the gantry.toml config file.
        #[arg(long, default_value = "gantry.toml")]
        config: PathBuf,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for the registry and ledgers (overrides the config file).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Write a starter gantry.toml.
    Init {
        /// Where to write the config file.
        #[arg(long, default_value = "gantry.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gantryd=debug,gantry=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            data_dir,
        } => run_serve(config, port, data_dir).await,
        Command::Init { path } => run_init(path),
    }
}

async fn run_serve(
    config_path: PathBuf,
    port_flag: Option<u16>,
    data_dir_flag: Option<PathBuf>,
) -> anyhow::Result<()> {
    info!("gantry daemon starting");

    // A missing config file is allowed: the daemon runs with every
    // provider unavailable, which still serves registry and checklist
    // reads and fails deploys with a clear error.
    let config = if config_path.exists() {
        let config = GantryConfig::from_file(&config_path)?;
        info!(path = ?config_path, "config loaded");
        config
    } else {
        warn!(path = ?config_path, "config file not found, starting without providers");
        GantryConfig::default()
    };

    let daemon = config.daemon.clone().unwrap_or_default();
    let port = port_flag.or(daemon.port).unwrap_or(7070);
    let data_dir = data_dir_flag
        .or_else(|| daemon.data_dir.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/var/lib/gantry"));

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;

    // ── Initialize subsystems ──────────────────────────────────

    // Application registry.
    let registry_path = data_dir.join("gantry.redb");
    let registry = RegistryStore::open(&registry_path)?;
    info!(path = ?registry_path, "registry opened");

    // Stage ledgers.
    let ledger_dir = data_dir.join("ledgers");
    let ledgers = LedgerStore::open(&ledger_dir)?;
    info!(path = ?ledger_dir, "ledger store opened");

    // Provider adapters.
    let providers = ProviderSet::from_config(&config.providers.clone().unwrap_or_default())?;
    info!(available = ?providers.available(), "providers configured");

    // Pipeline orchestrator.
    let extra_env: BTreeMap<String, String> = config
        .env
        .clone()
        .unwrap_or_default()
        .into_iter()
        .collect();
    let orchestrator = Orchestrator::with_options(
        registry,
        ledgers,
        providers,
        config.tuning(),
        BackoffPolicy::default(),
        extra_env,
    )?;
    info!("orchestrator initialized");

    // ── Start API server ───────────────────────────────────────

    let router = gantry_api::build_router(orchestrator);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("gantry daemon stopped");
    Ok(())
}

fn run_init(path: PathBuf) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing {}", path.display());
    }
    std::fs::write(&path, GantryConfig::scaffold().to_toml_string()?)?;
    println!("wrote starter config to {}", path.display());
    println!("edit the provider credentials, then run: gantryd serve");
    Ok(())
}
