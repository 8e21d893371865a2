//! State machine module for chord detection
//!
//! Provides the debounced Win+Shift+V detector:
//! - fires on whichever key-down completes the chord
//! - stays latched until all three keys have been released

// Only the Windows hook thread drives the detector
#[cfg_attr(not(windows), allow(dead_code))]
mod machine;

#[cfg(windows)]
pub use machine::HotkeyDetector;
