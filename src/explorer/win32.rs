//! COM-backed shell session
//!
//! Every interface pointer from the `windows` crate releases its reference
//! on drop, so each early `?` return below releases whatever was acquired
//! up to that point.

use windows::core::{Interface, VARIANT};
use windows::Win32::Foundation::{HWND, MAX_PATH};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, IServiceProvider, CLSCTX_ALL,
    COINIT_APARTMENTTHREADED,
};
use windows::Win32::UI::Shell::Common::ITEMIDLIST;
use windows::Win32::UI::Shell::{
    IFolderView, IPersistFolder2, IShellBrowser, IShellWindows, IWebBrowserApp,
    SHGetPathFromIDListW, SID_STopLevelBrowser, ShellWindows,
};
use windows::Win32::UI::WindowsAndMessaging::{GetClassNameW, GetForegroundWindow, GetWindowTextW};

use super::locator::{
    ResolveError, ShellSession, ShellWindowEntry, ShellWindowList, WindowHandle, TITLE_BUFFER_LEN,
};

const CLASS_BUFFER_LEN: usize = 64;

impl From<windows::core::Error> for ResolveError {
    fn from(e: windows::core::Error) -> Self {
        ResolveError::Os(e.to_string())
    }
}

/// The interactive desktop of the current user
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Shell;

impl ShellSession for Win32Shell {
    type Windows = Win32ShellWindows;

    fn foreground_window(&self) -> Option<WindowHandle> {
        let hwnd = unsafe { GetForegroundWindow() };
        (!hwnd.0.is_null()).then(|| WindowHandle::from_raw(hwnd.0 as isize))
    }

    fn class_name(&self, window: WindowHandle) -> Option<String> {
        let mut buffer = [0u16; CLASS_BUFFER_LEN];
        let len = unsafe { GetClassNameW(to_hwnd(window), &mut buffer) };
        (len > 0).then(|| String::from_utf16_lossy(&buffer[..len as usize]))
    }

    fn window_text(&self, window: WindowHandle) -> String {
        let mut buffer = [0u16; TITLE_BUFFER_LEN];
        let len = unsafe { GetWindowTextW(to_hwnd(window), &mut buffer) };
        if len <= 0 {
            return String::new();
        }
        String::from_utf16_lossy(&buffer[..len as usize])
    }

    fn shell_windows(&self) -> Result<Win32ShellWindows, ResolveError> {
        let apartment = ComApartment::enter();
        let windows: IShellWindows = unsafe { CoCreateInstance(&ShellWindows, None, CLSCTX_ALL) }?;
        Ok(Win32ShellWindows {
            windows,
            _apartment: apartment,
        })
    }
}

/// Live `IShellWindows` snapshot
pub struct Win32ShellWindows {
    // Declared before the apartment so it is released first
    windows: IShellWindows,
    _apartment: ComApartment,
}

impl ShellWindowList for Win32ShellWindows {
    type Entry = Win32ShellEntry;

    fn len(&self) -> Result<usize, ResolveError> {
        let count = unsafe { self.windows.Count() }?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn entry(&self, index: usize) -> Result<Win32ShellEntry, ResolveError> {
        let index = i32::try_from(index).map_err(|_| ResolveError::Enumeration)?;
        let dispatch = unsafe { self.windows.Item(&VARIANT::from(index)) }?;
        let browser: IWebBrowserApp = dispatch.cast()?;
        Ok(Win32ShellEntry { browser })
    }
}

/// One Explorer (or browser) window from the snapshot
pub struct Win32ShellEntry {
    browser: IWebBrowserApp,
}

impl ShellWindowEntry for Win32ShellEntry {
    fn handle(&self) -> Result<WindowHandle, ResolveError> {
        let handle = unsafe { self.browser.HWND() }?;
        Ok(WindowHandle::from_raw(handle.0 as isize))
    }

    fn folder_path(&self) -> Result<String, ResolveError> {
        let provider: IServiceProvider = self.browser.cast()?;
        let shell_browser: IShellBrowser = unsafe { provider.QueryService(&SID_STopLevelBrowser) }?;
        let view = unsafe { shell_browser.QueryActiveShellView() }?;
        let folder_view: IFolderView = view.cast()?;
        let folder: IPersistFolder2 = unsafe { folder_view.GetFolder() }?;
        let id_list = OwnedIdList::new(unsafe { folder.GetCurFolder() }?)?;

        let mut buffer = [0u16; MAX_PATH as usize];
        if !unsafe { SHGetPathFromIDListW(id_list.as_ptr(), &mut buffer) }.as_bool() {
            return Err(ResolveError::NotFileSystem);
        }
        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        Ok(String::from_utf16_lossy(&buffer[..len]))
    }
}

/// Absolute item ID list allocated by the shell, freed on drop
struct OwnedIdList(*mut ITEMIDLIST);

impl OwnedIdList {
    fn new(pidl: *mut ITEMIDLIST) -> Result<Self, ResolveError> {
        if pidl.is_null() {
            return Err(ResolveError::NotFileSystem);
        }
        Ok(Self(pidl))
    }

    fn as_ptr(&self) -> *const ITEMIDLIST {
        self.0
    }
}

impl Drop for OwnedIdList {
    fn drop(&mut self) {
        unsafe { CoTaskMemFree(Some(self.0 as *const _)) };
    }
}

/// Single-threaded apartment for the calling thread
///
/// Balanced with `CoUninitialize` only when the enter call succeeded,
/// including `S_FALSE` for an already initialized thread.
struct ComApartment {
    initialized: bool,
}

impl ComApartment {
    fn enter() -> Self {
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
        Self {
            initialized: hr.is_ok(),
        }
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

fn to_hwnd(window: WindowHandle) -> HWND {
    HWND(window.raw() as *mut _)
}
