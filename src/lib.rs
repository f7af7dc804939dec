pub mod api;
pub mod authorization; // Role → page table
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod models;
pub mod reports; // Usage CSV, shortlist PDF
pub mod workflow; // Status graphs, invitations, CU, incentives

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::{CoreError, CoreState};

/// Load configuration, prepare the database and serve until Ctrl-C.
pub async fn run() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::load()?;
    let addr = config.socket_addr()?;
    let core = Arc::new(CoreState::new(config));

    core.open_db()?;
    tracing::info!(path = %core.db_path().display(), "Database ready");
    if core.bootstrap_admin()? {
        tracing::warn!("Bootstrap admin created; change its password after first sign-in");
    }

    let server = api::start_server(core, addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");
    server.stop().await;
    Ok(())
}
