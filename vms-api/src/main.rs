//! vms-api - Voucher management service
//!
//! Loads bootstrap configuration, opens the SQLite store and serves the
//! voucher REST API.

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use vms_api::{build_router, AppState};
use vms_common::config::Config;
use vms_common::db::init_database;
use vms_common::SqliteVoucherRepository;

/// Command-line arguments; each flag overrides the config file
#[derive(Parser, Debug)]
#[command(name = "vms-api", version, about = "Voucher management REST service")]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen port
    #[arg(short, long, env = "VMS_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "VMS_DATABASE")]
    database: Option<PathBuf>,

    /// HMAC key for access tokens
    #[arg(long, env = "VMS_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so the configured level can apply;
    // failures are reported once the subscriber is up
    let config = Config::load(args.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting VMS API (vms-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut config = config.context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(secret) = args.jwt_secret {
        config.jwt_secret = secret;
    }
    config.validate().context("Invalid configuration")?;

    info!("Database path: {}", config.database_path.display());
    let pool = match init_database(&config.database_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let repo = Arc::new(SqliteVoucherRepository::new(pool));
    let ttl_hours = i64::try_from(config.jwt_expiration_hours)
        .context("jwt_expiration_hours is too large")?;
    let state = AppState::new(repo, &config.jwt_secret, chrono::Duration::hours(ttl_hours));

    let app = build_router(state)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("vms-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
