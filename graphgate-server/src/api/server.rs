//! HTTP server lifecycle.

use super::{AppState, router};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Handle to a running HTTP server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

/// Start serving the auth routes.
///
/// # Parameters
///
/// - `addr`: Address to bind; port 0 picks a free port
/// - `state`: State shared across handlers
/// - `prefix`: First path segment of the routes
///
/// # Returns
///
/// A handle to the running server that can be used to stop it.
pub async fn start_server(addr: SocketAddr, state: AppState, prefix: &str) -> Result<ServerHandle> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", addr))?;
    let local_addr = listener
        .local_addr()
        .context("Failed to determine listener address")?;

    let app = router(state, prefix);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let join_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
        {
            error!("HTTP server error: {}", e);
        }
    });

    info!("HTTP server listening on {}", local_addr);

    Ok(ServerHandle {
        local_addr,
        shutdown_tx: Some(shutdown_tx),
        join_handle: Some(join_handle),
    })
}

impl ServerHandle {
    /// The bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.join_handle.take() {
            handle.await.context("HTTP server task failed")?;
        }

        info!("HTTP server stopped");
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
