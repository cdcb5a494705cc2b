//! Lantern server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use lantern_content::ContentClient;
use lantern_core::config::AppConfig;
use lantern_server::bootstrap::ensure_master_profile;
use lantern_server::{AppState, create_router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Lantern - backend for a content-driven reading site
#[derive(Parser, Debug)]
#[command(name = "lanternd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "LANTERN_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Lantern v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override
    // everything; every setting also has a default)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("LANTERN_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Validate configuration before touching the database
    config
        .metadata
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid metadata config: {e}"))?;
    let warnings = config
        .auth
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid auth config: {e}"))?;
    for warning in warnings {
        tracing::warn!("{warning}");
    }

    // Initialize metadata store
    let metadata = lantern_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    tracing::info!("Metadata store initialized");

    // Provision the bootstrap master profile if configured
    ensure_master_profile(metadata.as_ref(), &config.auth).await?;

    // Initialize CMS client
    let content = Arc::new(ContentClient::new(&config.content).context("invalid CMS config")?);
    if content.is_enabled() {
        tracing::info!("CMS client initialized");
    }

    // Create application state
    let state = AppState::new(config.clone(), metadata, content);

    // Spawn the expired-session sweeper
    let _sweeper = lantern_server::session::spawn_sweeper(state.clone());
    tracing::info!(
        interval_secs = config.auth.session_sweep_interval_secs,
        "Session sweeper spawned"
    );

    // Create router
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
