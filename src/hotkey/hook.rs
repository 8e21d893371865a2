//! WH_KEYBOARD_LL adapter
//!
//! The OS calls `keyboard_proc` synchronously on the hook thread for every
//! keystroke in the session. The callback only classifies the key, feeds
//! the detector and posts a trigger with `try_send`; anything slower here
//! shows up as system-wide input lag.

use std::cell::RefCell;
use std::sync::mpsc as std_mpsc;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
    TranslateMessage, UnhookWindowsHookEx, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, MSG,
    WH_KEYBOARD_LL, WM_QUIT,
};

use super::keys::{direction_from_message, KeyDirection, KeyMap};
use super::listener::HotkeyError;
use crate::events::TriggerEvent;
use crate::state::HotkeyDetector;

/// Everything the callback needs, owned by the hook thread
struct HookContext {
    hook: HHOOK,
    key_map: KeyMap,
    detector: HotkeyDetector,
    trigger_tx: mpsc::Sender<TriggerEvent>,
}

impl HookContext {
    fn forward(&mut self, code: u32, direction: KeyDirection) {
        let key = self.key_map.classify(code);
        if let Some(trigger) = self.detector.process_key_event(key, direction) {
            // A full queue already holds a pending trigger
            let _ = self.trigger_tx.try_send(trigger);
        }
    }
}

thread_local! {
    static CONTEXT: RefCell<Option<HookContext>> = const { RefCell::new(None) };
}

/// Body of the hook thread
///
/// Reports the thread id (or the install error) through `ready`, then pumps
/// messages until `WM_QUIT` arrives and removes the hook.
pub(super) fn run_hook_thread(
    key_map: KeyMap,
    trigger_tx: mpsc::Sender<TriggerEvent>,
    ready: std_mpsc::Sender<Result<u32, HotkeyError>>,
) {
    let thread_id = unsafe { GetCurrentThreadId() };

    let hook = match install() {
        Ok(hook) => hook,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    CONTEXT.with(|cell| {
        *cell.borrow_mut() = Some(HookContext {
            hook,
            key_map,
            detector: HotkeyDetector::new(),
            trigger_tx,
        });
    });

    if ready.send(Ok(thread_id)).is_err() {
        debug!("listener went away before the hook thread reported in");
    } else {
        pump_messages();
    }

    CONTEXT.with(|cell| cell.borrow_mut().take());
    if let Err(e) = unsafe { UnhookWindowsHookEx(hook) } {
        warn!(?e, "failed to remove keyboard hook");
    }
    debug!("keyboard hook removed");
}

/// Ask the hook thread to leave its message loop
pub(super) fn request_quit(thread_id: u32) {
    if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
        warn!(?e, thread_id, "failed to post quit to hook thread");
    }
}

fn install() -> Result<HHOOK, HotkeyError> {
    unsafe {
        let module = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| HotkeyError::Install(e.to_string()))?;
        SetWindowsHookExW(
            WH_KEYBOARD_LL,
            Some(keyboard_proc),
            HINSTANCE(module.0),
            0,
        )
        .map_err(|e| HotkeyError::Install(e.to_string()))
    }
}

fn pump_messages() {
    let mut msg = MSG::default();
    unsafe {
        // 0 is WM_QUIT, -1 is an error
        while GetMessageW(&mut msg, HWND::default(), 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let mut hook = HHOOK::default();

    if code == HC_ACTION as i32 {
        let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
        let direction = direction_from_message(wparam.0 as u32);

        CONTEXT.with(|cell| {
            if let Ok(mut slot) = cell.try_borrow_mut() {
                if let Some(context) = slot.as_mut() {
                    hook = context.hook;
                    if let Some(direction) = direction {
                        context.forward(info.vkCode, direction);
                    }
                }
            }
        });
    }

    CallNextHookEx(hook, code, wparam, lparam)
}
