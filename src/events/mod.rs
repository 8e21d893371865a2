//! Events module for chord detection
//!
//! Provides the trigger event handed from the hook thread to the
//! consumer once the chord has been detected.

use serde::Serialize;

/// Emitted once per chord episode by the hotkey detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "hotkey_triggered")]
pub struct TriggerEvent {
    /// 1-based count of chord episodes since startup
    pub episode: u64,
}

impl std::fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HOTKEY_TRIGGERED (#{})", self.episode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = TriggerEvent { episode: 3 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("hotkey_triggered"));
        assert!(json.contains("\"episode\":3"));
    }

    #[test]
    fn test_event_display() {
        assert_eq!(TriggerEvent { episode: 12 }.to_string(), "HOTKEY_TRIGGERED (#12)");
    }
}
