use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[cfg(unix)]
use signal::unix::{signal, SignalKind};

/// Signal types that can trigger shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ShutdownSignal {
    /// Docker/Kubernetes graceful shutdown
    #[strum(to_string = "SIGTERM")]
    Terminate,
    /// Ctrl+C interactive shutdown
    #[strum(to_string = "SIGINT")]
    Interrupt,
    /// Forces exit when draining times out
    #[strum(to_string = "SIGQUIT")]
    Quit,
    /// Application-triggered shutdown, e.g. the worker stopped on its own
    #[strum(to_string = "INTERNAL")]
    Internal,
}

/// Signal handler for graceful shutdown
pub struct SignalHandler {
    shutdown_signal: Option<ShutdownSignal>,
    internal_shutdown: CancellationToken,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self { shutdown_signal: None, internal_shutdown: CancellationToken::new() }
    }

    /// Token that, once cancelled, ends [`SignalHandler::wait_for_shutdown`] with [`ShutdownSignal::Internal`]
    pub fn shutdown_trigger(&self) -> CancellationToken {
        self.internal_shutdown.clone()
    }

    /// Wait for any shutdown signal and return which one was received
    pub async fn wait_for_shutdown(&mut self) -> Result<ShutdownSignal> {
        let signal = self.wait_for_signal().await?;
        self.shutdown_signal = Some(signal);
        info!("🛑 Received shutdown signal: {}", signal);
        Ok(signal)
    }

    pub fn shutdown_signal(&self) -> Option<ShutdownSignal> {
        self.shutdown_signal
    }

    #[cfg(unix)]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigquit = signal(SignalKind::quit())?;

        info!("📡 Signal handler initialized, listening for SIGTERM, SIGINT and SIGQUIT");

        let received = tokio::select! {
            _ = sigterm.recv() => ShutdownSignal::Terminate,
            _ = sigint.recv() => ShutdownSignal::Interrupt,
            _ = sigquit.recv() => {
                warn!("Force quit signal received (SIGQUIT)");
                ShutdownSignal::Quit
            }
            _ = self.internal_shutdown.cancelled() => {
                warn!("Internal application shutdown requested");
                ShutdownSignal::Internal
            }
        };
        Ok(received)
    }

    #[cfg(not(unix))]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        info!("Signal handler initialized, listening for Ctrl+C");

        let received = tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                ShutdownSignal::Interrupt
            }
            _ = self.internal_shutdown.cancelled() => {
                warn!("Internal application shutdown requested");
                ShutdownSignal::Internal
            }
        };
        Ok(received)
    }

    /// Runs `shutdown_fn` with a deadline.
    ///
    /// On timeout a SIGQUIT-triggered shutdown exits the process immediately; any
    /// other signal returns an error and leaves unfinished jobs to queue redelivery.
    pub async fn handle_graceful_shutdown<F, Fut>(&self, shutdown_fn: F, timeout: Duration) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let signal = self.shutdown_signal.unwrap_or(ShutdownSignal::Interrupt);
        info!(timeout_secs = timeout.as_secs(), "Starting graceful shutdown (triggered by: {})", signal);

        match tokio::time::timeout(timeout, shutdown_fn()).await {
            Ok(Ok(())) => {
                info!("✅ Graceful shutdown completed successfully");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("❌ Graceful shutdown failed: {}", e);
                Err(e)
            }
            Err(_) => {
                error!("⏰ Graceful shutdown timed out after {} seconds", timeout.as_secs());
                if signal == ShutdownSignal::Quit {
                    warn!("💥 SIGQUIT received - forcing immediate exit");
                    std::process::exit(1);
                }
                warn!("🔌 Shutdown timeout reached - unacknowledged jobs will be redelivered");
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
