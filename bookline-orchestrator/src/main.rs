//! Bookline Orchestrator
//!
//! Drives outbound reservation calls from creation through a terminal
//! outcome: places IVR call attempts through the voice gateway, interprets
//! the status and decision webhooks the gateway posts back, retries
//! transient call failures, and fans confirmation messages out to the
//! chosen audience.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod clients;
pub mod config;
pub mod context;
pub mod db;
pub mod locks;
pub mod repository;
pub mod service;
pub mod store;

use std::sync::Arc;

use bookline_gateway::GatewayClient;

use crate::clients::{
    LlmScriptClient, NotificationTransport, ScriptGenerator, TelephonyGateway,
    TemplateScriptGenerator,
};
use crate::config::Config;
use crate::context::AppState;
use crate::locks::JobLocks;
use crate::store::{ConfirmationStore, GroupDirectory, JobStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookline_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bookline Orchestrator...");

    let config = Config::from_env()?;
    config.validate()?;

    // Wire the stores: Postgres when configured, in-memory otherwise.
    let (jobs, directory, confirmations) = build_stores(&config).await?;

    // One gateway client serves both call placement and message sends.
    let gateway_client = GatewayClient::new(
        config.gateway_base_url.clone().unwrap_or_default(),
        config.gateway_account_sid.clone().unwrap_or_default(),
        config.gateway_auth_token.clone().unwrap_or_default(),
    );
    let gateway: Arc<dyn TelephonyGateway> = Arc::new(gateway_client.clone());
    let transport: Arc<dyn NotificationTransport> = Arc::new(gateway_client);

    let scripts: Arc<dyn ScriptGenerator> = match (&config.script_api_url, &config.script_api_key) {
        (Some(url), Some(key)) => {
            tracing::info!("Voice scripts generated via {}", url);
            Arc::new(LlmScriptClient::new(url, key, config.script_model.clone()))
        }
        _ => {
            tracing::info!("SCRIPT_API_URL not set; using templated voice scripts");
            Arc::new(TemplateScriptGenerator)
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState {
        config,
        jobs,
        directory,
        confirmations,
        gateway,
        transport,
        scripts,
        locks: JobLocks::new(),
    });

    // Best-effort bulk snapshot of job state in the background.
    service::snapshot::spawn_snapshot_loop(Arc::clone(&state));

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_stores(
    config: &Config,
) -> anyhow::Result<(
    Arc<dyn JobStore>,
    Arc<dyn GroupDirectory>,
    Arc<dyn ConfirmationStore>,
)> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;

            let store = Arc::new(PgStore::new(pool));
            let jobs: Arc<dyn JobStore> = store.clone();
            let directory: Arc<dyn GroupDirectory> = store.clone();
            let confirmations: Arc<dyn ConfirmationStore> = store;
            Ok((jobs, directory, confirmations))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores (state is lost on restart)");

            let store = Arc::new(MemoryStore::new());
            let jobs: Arc<dyn JobStore> = store.clone();
            let directory: Arc<dyn GroupDirectory> = store.clone();
            let confirmations: Arc<dyn ConfirmationStore> = store;
            Ok((jobs, directory, confirmations))
        }
    }
}
