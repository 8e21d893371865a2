//! Foreground Explorer folder resolution
//!
//! Two phases: a cheap classification of the foreground window that also
//! captures its title, then a walk of the shell window list down to the
//! folder path. The title is the fallback whenever the walk does not
//! produce a path.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Window classes of Explorer folder windows
pub const EXPLORER_WINDOW_CLASSES: [&str; 2] = ["CabinetWClass", "ExploreWClass"];

/// Size of the title buffer in UTF-16 units, including the terminator
pub const TITLE_BUFFER_LEN: usize = 512;

/// Opaque top-level window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHandle(isize);

impl WindowHandle {
    #[cfg_attr(not(windows), allow(dead_code))]
    pub fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> isize {
        self.0
    }
}

/// Outcome of one folder lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExplorerFolderResult {
    /// Absolute path of the folder shown by the foreground window
    Resolved(String),
    /// Best-effort title text of the foreground Explorer window
    Fallback(String),
    /// The foreground window is not an Explorer window
    Empty,
}

impl ExplorerFolderResult {
    /// Collapse to the string handed to the dispatcher
    pub fn into_folder_string(self) -> String {
        match self {
            Self::Resolved(text) | Self::Fallback(text) => text,
            Self::Empty => String::new(),
        }
    }
}

/// Errors from walking the shell automation objects
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("shell window enumeration unavailable")]
    Enumeration,

    #[error("folder has no file-system path")]
    NotFileSystem,

    #[error("shell automation call failed: {0}")]
    #[cfg_attr(not(windows), allow(dead_code))]
    Os(String),
}

/// Foreground window already known to be an Explorer folder window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundExplorer {
    pub handle: WindowHandle,
    /// Window title, clamped to the title buffer
    pub title: String,
}

/// Window queries and the shell window service of one desktop session
pub trait ShellSession {
    type Windows: ShellWindowList;

    /// Current foreground window, if any
    fn foreground_window(&self) -> Option<WindowHandle>;

    /// Window class name, `None` if the query fails
    fn class_name(&self, window: WindowHandle) -> Option<String>;

    /// Window text, empty if the query fails
    fn window_text(&self, window: WindowHandle) -> String;

    /// A fresh snapshot of the live shell windows
    fn shell_windows(&self) -> Result<Self::Windows, ResolveError>;
}

/// Indexed snapshot of shell windows
///
/// Entries must be dropped before the list.
pub trait ShellWindowList {
    type Entry: ShellWindowEntry;

    fn len(&self) -> Result<usize, ResolveError>;

    fn entry(&self, index: usize) -> Result<Self::Entry, ResolveError>;
}

/// One shell window; dropping it releases every reference it holds
pub trait ShellWindowEntry {
    fn handle(&self) -> Result<WindowHandle, ResolveError>;

    /// Walk browser, view, folder and ID list down to a display path
    fn folder_path(&self) -> Result<String, ResolveError>;
}

/// Resolves the folder shown by the foreground Explorer window
pub struct ExplorerLocator<S> {
    shell: S,
}

impl<S: ShellSession> ExplorerLocator<S> {
    pub fn new(shell: S) -> Self {
        Self { shell }
    }

    /// Classify the foreground window and capture its title
    ///
    /// `None` when there is no foreground window or it is not Explorer.
    /// Only plain window queries run here, never the shell objects.
    pub fn foreground_explorer(&self) -> Option<ForegroundExplorer> {
        let Some(handle) = self.shell.foreground_window() else {
            trace!("no foreground window");
            return None;
        };

        match self.shell.class_name(handle) {
            Some(class) if is_explorer_class(&class) => {}
            class => {
                trace!(?class, "foreground window is not an Explorer window");
                return None;
            }
        }

        Some(ForegroundExplorer {
            handle,
            title: truncate_title(self.shell.window_text(handle)),
        })
    }

    /// Walk the shell windows to the folder shown by `target`
    ///
    /// Never `Empty`: anything short of a non-empty path is the title.
    pub fn resolve_folder(&self, target: &ForegroundExplorer) -> ExplorerFolderResult {
        match self.find_folder_path(target.handle) {
            Ok(Some(path)) if !path.is_empty() => return ExplorerFolderResult::Resolved(path),
            Ok(Some(_)) => debug!("Explorer window reported an empty path"),
            Ok(None) => debug!(
                handle = target.handle.raw(),
                "foreground Explorer window not in shell window list"
            ),
            Err(e) => debug!(error = %e, "folder resolution failed"),
        }

        ExplorerFolderResult::Fallback(target.title.clone())
    }

    /// `Ok(None)` when no entry matches the foreground handle
    fn find_folder_path(&self, foreground: WindowHandle) -> Result<Option<String>, ResolveError> {
        let windows = self.shell.shell_windows()?;
        let count = windows.len()?;

        for index in 0..count {
            let entry = match windows.entry(index) {
                Ok(entry) => entry,
                Err(e) => {
                    trace!(index, error = %e, "skipping shell window");
                    continue;
                }
            };

            match entry.handle() {
                Ok(handle) if handle == foreground => {
                    // Handles are unique per live window: stop here either way
                    return entry.folder_path().map(Some);
                }
                Ok(_) => {}
                Err(e) => trace!(index, error = %e, "shell window has no handle"),
            }
        }

        Ok(None)
    }
}

fn is_explorer_class(class: &str) -> bool {
    EXPLORER_WINDOW_CLASSES.contains(&class)
}

/// Clamp to what fits in the title buffer, never splitting a surrogate pair
fn truncate_title(title: String) -> String {
    let limit = TITLE_BUFFER_LEN - 1;
    if title.encode_utf16().count() <= limit {
        return title;
    }

    let mut units = 0;
    let mut end = 0;
    for (offset, c) in title.char_indices() {
        if units + c.len_utf16() > limit {
            break;
        }
        units += c.len_utf16();
        end = offset + c.len_utf8();
    }
    let mut title = title;
    title.truncate(end);
    title
}
