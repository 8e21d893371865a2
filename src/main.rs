//! better-paste-agent: Background agent for the Explorer paste helper
//!
//! This agent runs in the user session and provides:
//! - Global Win+Shift+V detection via a low-level keyboard hook
//! - Resolution of the folder shown by the foreground Explorer window
//! - Launching the paste helper with that folder
//!
//! Tray icon, dialogs and startup registration live outside this agent.

mod config;
mod dispatch;
mod events;
mod explorer;
mod hotkey;
mod lifecycle;
mod state;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::dispatch::{HelperLauncher, TriggerConsumer};
use crate::explorer::{ExplorerLocator, PlatformShell};
use crate::hotkey::HotkeyListener;
use crate::lifecycle::ShutdownSignal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "better-paste-agent starting"
    );

    // Load configuration
    let config = Config::load()?;
    let key_map = config.key_map()?;
    let launcher = HelperLauncher::new(config.helper_path()?);
    info!(
        target_key = %config.target_key,
        helper = %launcher.program().display(),
        timeout_ms = config.resolve_timeout_ms,
        "configuration loaded"
    );

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Hook thread -> trigger consumer
    let (trigger_tx, trigger_rx) = mpsc::channel(8);

    // Start the hotkey listener (runs on dedicated thread)
    let hotkey_listener = HotkeyListener::new(key_map, trigger_tx);
    match hotkey_listener.start() {
        Ok(()) => {
            info!("hotkey listener started");
        }
        Err(e) => {
            error!(error = %e, "failed to start hotkey listener");
            warn!("continuing without hotkey support");
        }
    }

    let locator = ExplorerLocator::new(PlatformShell::default());
    let mut consumer = TriggerConsumer::new(locator, launcher, config.resolve_timeout());

    info!("agent initialized, entering main loop");

    tokio::select! {
        _ = consumer.run(trigger_rx) => {
            info!("trigger consumer exited");
        }

        result = shutdown.wait() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "failed to listen for shutdown signals"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    hotkey_listener.stop();

    info!("better-paste-agent stopped");

    Ok(())
}
