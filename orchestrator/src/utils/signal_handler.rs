use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};

#[cfg(unix)]
use signal::unix::{signal, SignalKind};

/// Signal types that can trigger shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM - Docker/Kubernetes graceful shutdown
    Terminate,
    /// SIGINT - Ctrl+C interactive shutdown
    Interrupt,
    /// SIGQUIT - Quit signal
    Quit,
    /// Application-triggered shutdown, e.g. the HTTP server stopped on its own
    Internal,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Quit => write!(f, "SIGQUIT"),
            ShutdownSignal::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Signal handler for graceful shutdown
pub struct SignalHandler {
    shutdown_signal: Option<ShutdownSignal>,
    internal_shutdown_notify: Arc<Notify>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self { shutdown_signal: None, internal_shutdown_notify: Arc::new(Notify::new()) }
    }

    /// Handle to trigger an internal shutdown. `notify_one` stores a permit, so a trigger fired
    /// before [`SignalHandler::wait_for_shutdown`] is polled is not lost.
    pub fn get_shutdown_trigger(&self) -> Arc<Notify> {
        self.internal_shutdown_notify.clone()
    }

    /// Wait for any shutdown signal and return which one was received
    pub async fn wait_for_shutdown(&mut self) -> Result<ShutdownSignal> {
        let signal = self.wait_for_signal().await?;
        self.shutdown_signal = Some(signal);
        info!(signal = %signal, "Received shutdown signal");
        Ok(signal)
    }

    /// The signal that triggered shutdown, if any
    pub fn shutdown_signal(&self) -> Option<ShutdownSignal> {
        self.shutdown_signal
    }

    #[cfg(unix)]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| anyhow!("Failed to create SIGTERM handler: {e}"))?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(|e| anyhow!("Failed to create SIGINT handler: {e}"))?;
        let mut sigquit = signal(SignalKind::quit()).map_err(|e| anyhow!("Failed to create SIGQUIT handler: {e}"))?;

        info!("Signal handler initialized, listening for SIGTERM, SIGINT, SIGQUIT and internal shutdown requests");

        let signal = tokio::select! {
            _ = sigterm.recv() => ShutdownSignal::Terminate,
            _ = sigint.recv() => ShutdownSignal::Interrupt,
            _ = sigquit.recv() => {
                warn!("Force quit signal received (SIGQUIT)");
                ShutdownSignal::Quit
            }
            _ = self.internal_shutdown_notify.notified() => {
                warn!("Internal application shutdown requested");
                ShutdownSignal::Internal
            }
        };
        Ok(signal)
    }

    #[cfg(not(unix))]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        info!("Signal handler initialized, listening for Ctrl+C and internal shutdown requests");

        let signal = tokio::select! {
            result = signal::ctrl_c() => {
                result.map_err(|e| anyhow!("Failed to listen for Ctrl+C: {e}"))?;
                ShutdownSignal::Interrupt
            }
            _ = self.internal_shutdown_notify.notified() => {
                warn!("Internal application shutdown requested");
                ShutdownSignal::Internal
            }
        };
        Ok(signal)
    }

    /// Runs `shutdown_fn`, giving up after `timeout`.
    ///
    /// On SIGQUIT a timed out shutdown exits the process right away.
    pub async fn handle_graceful_shutdown<F, Fut>(&self, shutdown_fn: F, timeout: Duration) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let signal = self.shutdown_signal.unwrap_or(ShutdownSignal::Interrupt);
        info!(signal = %signal, timeout_secs = timeout.as_secs(), "Starting graceful shutdown");

        match tokio::time::timeout(timeout, shutdown_fn()).await {
            Ok(Ok(())) => {
                info!("Graceful shutdown completed");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "Graceful shutdown failed");
                Err(e)
            }
            Err(_) => {
                error!(timeout_secs = timeout.as_secs(), "Graceful shutdown timed out");
                if signal == ShutdownSignal::Quit {
                    warn!("SIGQUIT received, forcing immediate exit");
                    std::process::exit(1);
                }
                Err(anyhow!("Shutdown timeout exceeded"))
            }
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
