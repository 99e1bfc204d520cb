use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketsmith_core::{
    load_config, load_config_from_env, validate_config, AuditRecorder, AuditStore, Config,
    GeminiClient, LlmClient, SanitizedConfig, ShortcutClient, SqliteAuditStore, StoryTarget,
    StructuredGenerator, TicketCreator, TicketPipeline, TicketingService,
};
use ticketsmith_server::{api::create_router, metrics, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ticketsmith v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("TICKETSMITH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration; env-only deployments have no file
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!(
            "No config file at {:?}, using environment only",
            config_path
        );
        load_config_from_env().context("Failed to load config from environment")?
    };

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded (hash {})", &config_hash[..16]);
    debug!("Effective config: {:?}", SanitizedConfig::from(&config));

    for setting in config.missing_required() {
        warn!(
            "{} is not set; ticket creation will fail until it is",
            setting.env_name()
        );
    }

    let config = Arc::new(config);
    let (pipeline, ticketing) = build_pipeline(&config)?;

    let state = Arc::new(AppState::new(Arc::clone(&config), pipeline, ticketing));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Build whatever the configuration allows. The Shortcut client alone is
/// enough for `/api/shortcut-info`; the pipeline needs every required setting.
fn build_pipeline(
    config: &Arc<Config>,
) -> Result<(Option<Arc<TicketPipeline>>, Option<Arc<dyn TicketingService>>)> {
    let ticketing: Option<Arc<dyn TicketingService>> =
        match ShortcutClient::from_config(&config.shortcut) {
            Ok(client) => {
                info!("Initializing Shortcut client (project {})", config.shortcut.project_id);
                Some(Arc::new(client))
            }
            Err(e) => {
                debug!("Shortcut client unavailable: {}", e);
                None
            }
        };

    let llm: Option<Arc<dyn LlmClient>> = match GeminiClient::from_config(&config.gemini) {
        Ok(client) => {
            info!("Initializing Gemini client (model {})", config.gemini.model);
            Some(Arc::new(client))
        }
        Err(e) => {
            debug!("Gemini client unavailable: {}", e);
            None
        }
    };

    let audit_store: Option<Arc<dyn AuditStore>> = match config.database.sqlite_path() {
        Some(path) => {
            let store = SqliteAuditStore::new(&path)
                .with_context(|| format!("Failed to open audit database {:?}", path))?;
            info!("Audit store initialized at {:?}", path);
            Some(Arc::new(store))
        }
        None => None,
    };

    let pipeline = match (llm, ticketing.clone(), audit_store) {
        (Some(llm), Some(ticketing), Some(store)) => {
            let pipeline = TicketPipeline::new(
                Arc::clone(config),
                StructuredGenerator::new(llm),
                TicketCreator::new(ticketing, StoryTarget::from(&config.shortcut)),
                AuditRecorder::new(store),
            )
            .with_stage_observer(metrics::stage_observer());
            info!("Ticket pipeline ready");
            Some(Arc::new(pipeline))
        }
        _ => None,
    };

    Ok((pipeline, ticketing))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
