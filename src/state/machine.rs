//! Chord detection state machine
//!
//! Tracks the held state of the three chord keys and fires exactly once
//! per episode in which all of them are held together.

use crate::events::TriggerEvent;
use crate::hotkey::{KeyDirection, TrackedKey};

/// Held flags for the chord keys plus the debounce latch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComboState {
    /// Win is held
    pub primary: bool,
    /// Shift is held
    pub secondary: bool,
    /// Target key is held
    pub target: bool,
    /// A trigger has been emitted for the current episode
    pub fired: bool,
}

impl ComboState {
    fn held_mut(&mut self, key: TrackedKey) -> &mut bool {
        match key {
            TrackedKey::PrimaryModifier => &mut self.primary,
            TrackedKey::SecondaryModifier => &mut self.secondary,
            TrackedKey::Target => &mut self.target,
        }
    }

    /// All three keys are held
    pub fn all_held(&self) -> bool {
        self.primary && self.secondary && self.target
    }

    /// None of the three keys is held
    pub fn all_released(&self) -> bool {
        !self.primary && !self.secondary && !self.target
    }
}

/// Debounced AND gate over the three chord keys
///
/// Runs on the hook thread for every keystroke in the system, so it only
/// flips booleans and never blocks or allocates.
#[derive(Debug, Default)]
pub struct HotkeyDetector {
    state: ComboState,
    episodes: u64,
}

impl HotkeyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current combo state
    pub fn state(&self) -> ComboState {
        self.state
    }

    /// Feed one key transition, `None` meaning a key outside the chord
    ///
    /// Returns a trigger on the down event that completes the chord. The
    /// latch is only re-armed once all three keys are up again, so
    /// autorepeat and re-pressing a single key while the other two stay
    /// held never fire twice.
    pub fn process_key_event(
        &mut self,
        key: Option<TrackedKey>,
        direction: KeyDirection,
    ) -> Option<TriggerEvent> {
        let key = key?;

        match direction {
            KeyDirection::Down => {
                *self.state.held_mut(key) = true;
                if self.state.all_held() && !self.state.fired {
                    self.state.fired = true;
                    self.episodes += 1;
                    return Some(TriggerEvent {
                        episode: self.episodes,
                    });
                }
                None
            }
            KeyDirection::Up => {
                *self.state.held_mut(key) = false;
                if self.state.all_released() {
                    self.state.fired = false;
                }
                None
            }
        }
    }
}
