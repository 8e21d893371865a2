//! Dispatch module for acting on detected hotkeys
//!
//! Provides the consumer loop that resolves the folder for every trigger
//! and the launcher that hands it to the paste helper.

mod consumer;
mod launcher;

pub use consumer::TriggerConsumer;
pub use launcher::HelperLauncher;
