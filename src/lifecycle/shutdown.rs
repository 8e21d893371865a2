//! Signal handling for graceful shutdown

use tracing::debug;

/// Handles shutdown signals (Ctrl-C and console close on Windows,
/// SIGTERM and SIGINT elsewhere)
pub struct ShutdownSignal;

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    #[cfg(windows)]
    pub async fn wait(&self) -> std::io::Result<()> {
        use tokio::signal::windows::{ctrl_c, ctrl_close, ctrl_shutdown};

        let mut ctrl_c = ctrl_c()?;
        let mut close = ctrl_close()?;
        let mut shutdown = ctrl_shutdown()?;

        tokio::select! {
            _ = ctrl_c.recv() => {
                debug!("received Ctrl-C");
            }
            _ = close.recv() => {
                debug!("received console close");
            }
            _ = shutdown.recv() => {
                debug!("received system shutdown");
            }
        }
        Ok(())
    }

    /// Wait for a shutdown signal
    #[cfg(unix)]
    pub async fn wait(&self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                debug!("received SIGTERM");
            }
            _ = sigint.recv() => {
                debug!("received SIGINT");
            }
        }
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
