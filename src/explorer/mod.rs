//! Explorer module for foreground folder detection
//!
//! Resolves the folder shown by the focused Explorer window through the
//! shell automation objects, with the window title as a fallback.

mod locator;
#[cfg(windows)]
mod win32;

pub use locator::{ExplorerFolderResult, ExplorerLocator, ForegroundExplorer, ShellSession};

#[cfg(test)]
pub use locator::WindowHandle;

#[cfg(windows)]
pub use win32::Win32Shell as PlatformShell;

#[cfg(not(windows))]
pub use unsupported::UnsupportedShell as PlatformShell;

#[cfg(not(windows))]
mod unsupported {
    use super::locator::{
        ResolveError, ShellSession, ShellWindowEntry, ShellWindowList, WindowHandle,
    };

    /// Stand-in for platforms without an Explorer; never has a foreground window
    #[derive(Debug, Default, Clone, Copy)]
    pub struct UnsupportedShell;

    pub struct NoWindows;

    pub struct NoEntry;

    impl ShellSession for UnsupportedShell {
        type Windows = NoWindows;

        fn foreground_window(&self) -> Option<WindowHandle> {
            None
        }

        fn class_name(&self, _window: WindowHandle) -> Option<String> {
            None
        }

        fn window_text(&self, _window: WindowHandle) -> String {
            String::new()
        }

        fn shell_windows(&self) -> Result<NoWindows, ResolveError> {
            Err(ResolveError::Enumeration)
        }
    }

    impl ShellWindowList for NoWindows {
        type Entry = NoEntry;

        fn len(&self) -> Result<usize, ResolveError> {
            Ok(0)
        }

        fn entry(&self, _index: usize) -> Result<NoEntry, ResolveError> {
            Err(ResolveError::Enumeration)
        }
    }

    impl ShellWindowEntry for NoEntry {
        fn handle(&self) -> Result<WindowHandle, ResolveError> {
            Err(ResolveError::Enumeration)
        }

        fn folder_path(&self) -> Result<String, ResolveError> {
            Err(ResolveError::Enumeration)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::explorer::ExplorerLocator;

        #[test]
        fn test_unsupported_shell_has_no_foreground_explorer() {
            let locator = ExplorerLocator::new(UnsupportedShell);
            assert_eq!(locator.foreground_explorer(), None);
        }
    }
}
