//! Centralized shutdown management
//!
//! Every store call takes the service's cancellation token, so a Ctrl+C or
//! SIGTERM aborts the in-flight query instead of waiting for it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::data::StoreService;

/// Centralized shutdown service for coordinating graceful shutdown
#[derive(Clone)]
pub struct ShutdownService {
    token: CancellationToken,
    store: Arc<StoreService>,
}

impl ShutdownService {
    pub fn new(store: Arc<StoreService>) -> Self {
        Self {
            token: CancellationToken::new(),
            store,
        }
    }

    /// Token handed to store operations
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Trigger shutdown
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Check if shutdown was triggered
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Trigger shutdown and release the store
    pub async fn shutdown(&self) {
        tracing::debug!("Initiating graceful shutdown...");
        self.trigger();

        tracing::debug!(backend = self.store.backend_name(), "Closing store");
        self.store.close().await;

        tracing::debug!("Shutdown complete");
    }

    /// Install OS signal handlers and auto-trigger on Ctrl+C/SIGTERM
    pub fn install_signal_handlers(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut signal) => {
                        signal.recv().await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::debug!("Received Ctrl+C, cancelling"),
                _ = terminate => tracing::debug!("Received SIGTERM, cancelling"),
                _ = service.token.cancelled() => {}
            }

            service.trigger();
        });
    }
}
