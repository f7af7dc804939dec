//! API server lifecycle: bind, spawn the axum server in a background task
//! and hand back a handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::core_state::{CoreError, CoreState};

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    pub started_at: DateTime<Utc>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Ask the server to stop after in-flight requests finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Signal shutdown and wait for the server task to end.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "API server task failed");
        }
    }
}

/// Bind `addr` (port 0 picks an ephemeral port) and start serving.
pub async fn start_server(core: Arc<CoreState>, addr: SocketAddr) -> Result<ApiServer, CoreError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    let app = api_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        started_at: Utc::now(),
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    fn test_core(dir: &tempfile::TempDir) -> Arc<CoreState> {
        Arc::new(CoreState::with_database(&dir.path().join("desk.db")))
    }

    #[tokio::test]
    async fn serves_health_and_rejects_anonymous_staff_calls() {
        let dir = tempfile::tempdir().unwrap();
        let server = start_server(test_core(&dir), loopback()).await.expect("server should start");
        assert!(server.addr.port() > 0);
        let base = format!("http://{}", server.addr);

        let resp = reqwest::get(format!("{base}/api/health")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");

        let resp = reqwest::get(format!("{base}/api/projects")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        let resp = reqwest::get(format!("{base}/nonexistent")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        server.stop().await;
    }

    #[tokio::test]
    async fn login_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let core = test_core(&dir);
        {
            let conn = core.open_db().unwrap();
            crate::db::repository::fixtures::user(&conn, "pm@example.com", crate::models::UserRole::Pm);
        }
        let server = start_server(core, loopback()).await.unwrap();

        let resp = reqwest::Client::new()
            .post(format!("http://{}/api/auth/login", server.addr))
            .json(&serde_json::json!({"email": "pm@example.com", "password": "password-123"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        server.stop().await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_server(test_core(&dir), loopback()).await.unwrap();
        server.shutdown();
        server.shutdown();
        server.stop().await;
    }
}
