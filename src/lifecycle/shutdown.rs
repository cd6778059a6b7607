//! Shutdown coordination for the proxy.

use std::future::Future;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive `server` to completion, but once `draining` fires allow it at most
/// `grace` more time. Connections still open after that are abandoned.
pub async fn drain_with_grace<F>(
    server: F,
    draining: oneshot::Receiver<()>,
    grace: Duration,
) -> Result<(), std::io::Error>
where
    F: Future<Output = Result<(), std::io::Error>>,
{
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        Ok(()) = draining => {}
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                grace = ?grace,
                "Grace period elapsed, closing remaining connections"
            );
            Ok(())
        }
    }
}
