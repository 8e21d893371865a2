//! Global hotkey listener using a Windows low-level keyboard hook
//!
//! Owns the dedicated hook thread. The thread installs the hook, pumps its
//! message queue so the OS can deliver callbacks, and removes the hook when
//! asked to quit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::keys::KeyMap;
use crate::events::TriggerEvent;

/// Global hotkey listener that turns chord episodes into trigger events
pub struct HotkeyListener {
    key_map: KeyMap,
    #[cfg_attr(not(windows), allow(dead_code))]
    trigger_tx: mpsc::Sender<TriggerEvent>,
    running: Arc<AtomicBool>,
    thread: Mutex<Option<HookThread>>,
}

/// Handle to a running hook thread
#[cfg_attr(not(windows), allow(dead_code))]
struct HookThread {
    /// OS thread id, the target for the quit message
    thread_id: u32,
    handle: JoinHandle<()>,
}

impl HotkeyListener {
    /// Create a new hotkey listener
    pub fn new(key_map: KeyMap, trigger_tx: mpsc::Sender<TriggerEvent>) -> Self {
        Self {
            key_map,
            trigger_tx,
            running: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    /// Start the hotkey listener
    ///
    /// Spawns the hook thread and waits until it reports whether the hook
    /// could be installed. On failure the thread has already exited and the
    /// listener can be left inert.
    pub fn start(&self) -> Result<(), HotkeyError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }

        match self.spawn_hook_thread() {
            Ok(thread) => {
                info!(thread_id = thread.thread_id, "keyboard hook installed");
                if let Ok(mut slot) = self.thread.lock() {
                    *slot = Some(thread);
                }
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    #[cfg(windows)]
    fn spawn_hook_thread(&self) -> Result<HookThread, HotkeyError> {
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let key_map = self.key_map;
        let trigger_tx = self.trigger_tx.clone();
        let running = Arc::clone(&self.running);

        let handle = std::thread::Builder::new()
            .name("hotkey-hook".to_string())
            .spawn(move || {
                super::hook::run_hook_thread(key_map, trigger_tx, ready_tx);
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| HotkeyError::ThreadSpawn(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(HookThread { thread_id, handle }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(HotkeyError::ThreadExited)
            }
        }
    }

    #[cfg(not(windows))]
    fn spawn_hook_thread(&self) -> Result<HookThread, HotkeyError> {
        debug!(target_key = self.key_map.target(), "no keyboard hook on this platform");
        Err(HotkeyError::Unsupported)
    }

    /// Stop the hotkey listener and wait for the hook to be removed
    pub fn stop(&self) {
        let thread = match self.thread.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        let Some(thread) = thread else {
            return;
        };

        #[cfg(windows)]
        super::hook::request_quit(thread.thread_id);

        if thread.handle.join().is_err() {
            warn!("hotkey hook thread panicked");
        }
        self.running.store(false, Ordering::SeqCst);
        debug!("hotkey listener stopped");
    }

    /// Check if the listener is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Errors that can occur in the hotkey listener
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("hotkey listener is already running")]
    AlreadyRunning,

    #[error("failed to install keyboard hook: {0}")]
    #[cfg_attr(not(windows), allow(dead_code))]
    Install(String),

    #[error("failed to spawn hook thread: {0}")]
    #[cfg_attr(not(windows), allow(dead_code))]
    ThreadSpawn(String),

    #[error("hook thread exited before reporting status")]
    #[cfg_attr(not(windows), allow(dead_code))]
    ThreadExited,

    #[error("global keyboard hooks are not supported on this platform")]
    Unsupported,
}
