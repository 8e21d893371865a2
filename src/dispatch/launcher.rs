//! Helper process launcher
//!
//! Starts the paste helper with the resolved folder as its only argument.
//! The child runs detached; nothing waits on it.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::events::TriggerEvent;

/// Receives each trigger together with its folder string
///
/// An empty folder means "no folder context", never an error.
pub trait Dispatcher: Send + 'static {
    fn dispatch(&mut self, trigger: TriggerEvent, folder: &str) -> Result<(), DispatchError>;
}

/// Errors that can occur while dispatching a trigger
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to launch {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Launches the helper executable for each trigger with a folder
pub struct HelperLauncher {
    program: PathBuf,
}

impl HelperLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Dispatcher for HelperLauncher {
    fn dispatch(&mut self, trigger: TriggerEvent, folder: &str) -> Result<(), DispatchError> {
        if folder.is_empty() {
            debug!(episode = trigger.episode, "no folder context, helper not launched");
            return Ok(());
        }

        let child = helper_command(&self.program, folder)
            .spawn()
            .map_err(|source| DispatchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        info!(
            episode = trigger.episode,
            pid = child.id(),
            program = %self.program.display(),
            "helper launched"
        );
        Ok(())
    }
}

fn helper_command(program: &Path, folder: &str) -> Command {
    let mut command = Command::new(program);
    command
        .arg(escape_backslashes(folder))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    command
}

/// The helper expects every backslash doubled
fn escape_backslashes(folder: &str) -> String {
    folder.replace('\\', "\\\\")
}
