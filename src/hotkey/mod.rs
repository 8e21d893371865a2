//! Hotkey module for global keyboard event listening
//!
//! Uses a Windows low-level keyboard hook to watch for the Win+Shift+V
//! chord and forwards each detected episode to the consumer.

#[cfg(windows)]
mod hook;
mod keys;
mod listener;

pub use keys::{parse_key_name, KeyDirection, KeyMap, TrackedKey};
pub use listener::HotkeyListener;
