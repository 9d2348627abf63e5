//! Shutdown coordinator.
//!
//! Owns the cancellation token the poll loop observes. Termination
//! signals only cancel the token; the sequencing of "flush retained
//! offline status, then exit" lives in the poll loop's shutdown path,
//! keeping it deterministic regardless of which signal fired.

use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Install signal listeners (Ctrl-C everywhere, SIGTERM on unix)
    /// and return the coordinator.
    pub fn install() -> Self {
        let token = CancellationToken::new();

        let cancel = token.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("shutdown signal received");
            cancel.cancel();
        });

        Self { token }
    }

    /// A token to hand to the components that should observe shutdown.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::error!("failed to install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
