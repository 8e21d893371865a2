//! Tracked key definitions and virtual-key classification
//!
//! Provides the Windows virtual-key codes the chord cares about and a
//! mapping from raw codes to the three keys of the chord.

/// Virtual-key codes as reported by the low-level keyboard hook
pub mod vk {
    /// Generic Shift
    pub const SHIFT: u32 = 0x10;
    /// Left Shift
    pub const LSHIFT: u32 = 0xA0;
    /// Right Shift
    pub const RSHIFT: u32 = 0xA1;
    /// Left Windows key
    pub const LWIN: u32 = 0x5B;
    /// Right Windows key
    pub const RWIN: u32 = 0x5C;
    /// The letter V
    pub const V: u32 = 0x56;
    /// F1; F2..F24 follow contiguously
    pub const F1: u32 = 0x70;
}

/// Keyboard message identifiers delivered as the hook's `wparam`
pub mod msg {
    pub const WM_KEYDOWN: u32 = 0x0100;
    pub const WM_KEYUP: u32 = 0x0101;
    /// Sent instead of `WM_KEYDOWN` while Alt is held
    pub const WM_SYSKEYDOWN: u32 = 0x0104;
    pub const WM_SYSKEYUP: u32 = 0x0105;
}

/// One of the three keys that make up the chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedKey {
    /// Win key (either side)
    PrimaryModifier,
    /// Shift key (either side)
    SecondaryModifier,
    /// The configured letter, `V` by default
    Target,
}

/// Direction of a single key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

/// Direction of a keyboard hook message, `None` for anything else
#[cfg_attr(not(windows), allow(dead_code))]
pub fn direction_from_message(message: u32) -> Option<KeyDirection> {
    match message {
        msg::WM_KEYDOWN | msg::WM_SYSKEYDOWN => Some(KeyDirection::Down),
        msg::WM_KEYUP | msg::WM_SYSKEYUP => Some(KeyDirection::Up),
        _ => None,
    }
}

/// Maps virtual-key codes to tracked keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    target: u32,
}

impl KeyMap {
    /// Create a key map with the given target virtual-key code
    pub fn new(target: u32) -> Self {
        Self { target }
    }

    /// The target virtual-key code
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Classify a virtual-key code, `None` for keys outside the chord
    pub fn classify(&self, code: u32) -> Option<TrackedKey> {
        match code {
            vk::LWIN | vk::RWIN => Some(TrackedKey::PrimaryModifier),
            vk::SHIFT | vk::LSHIFT | vk::RSHIFT => Some(TrackedKey::SecondaryModifier),
            code if code == self.target => Some(TrackedKey::Target),
            _ => None,
        }
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new(vk::V)
    }
}

/// Errors from parsing a configured key name
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("unknown key name: {0:?}")]
    Unknown(String),

    #[error("key {0:?} is already part of the chord as a modifier")]
    Modifier(String),
}

/// Parse a key name into a virtual-key code
///
/// Accepts `A`..`Z`, `0`..`9`, `F1`..`F24` (case-insensitive) or a hex
/// code such as `0x56`.
pub fn parse_key_name(name: &str) -> Result<u32, KeyParseError> {
    let trimmed = name.trim();
    let upper = trimmed.to_ascii_uppercase();
    let unknown = || KeyParseError::Unknown(trimmed.to_string());

    let code = if let Some(hex) = upper.strip_prefix("0X") {
        u32::from_str_radix(hex, 16).map_err(|_| unknown())?
    } else if let &[c] = upper.as_bytes() {
        match c {
            b'A'..=b'Z' | b'0'..=b'9' => u32::from(c),
            _ => return Err(unknown()),
        }
    } else if let Some(n) = upper.strip_prefix('F') {
        match n.parse::<u32>() {
            Ok(n @ 1..=24) => vk::F1 + n - 1,
            _ => return Err(unknown()),
        }
    } else {
        return Err(unknown());
    };

    if code == 0 || code > 0xFE {
        return Err(unknown());
    }
    if KeyMap::new(0).classify(code).is_some() {
        return Err(KeyParseError::Modifier(trimmed.to_string()));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_modifiers_both_sides() {
        let map = KeyMap::default();
        assert_eq!(map.classify(vk::LWIN), Some(TrackedKey::PrimaryModifier));
        assert_eq!(map.classify(vk::RWIN), Some(TrackedKey::PrimaryModifier));
        assert_eq!(map.classify(vk::SHIFT), Some(TrackedKey::SecondaryModifier));
        assert_eq!(map.classify(vk::LSHIFT), Some(TrackedKey::SecondaryModifier));
        assert_eq!(map.classify(vk::RSHIFT), Some(TrackedKey::SecondaryModifier));
    }

    #[test]
    fn test_classify_target_and_other() {
        let map = KeyMap::default();
        assert_eq!(map.classify(vk::V), Some(TrackedKey::Target));
        assert_eq!(map.classify(u32::from(b'C')), None);
        assert_eq!(map.classify(0x11), None); // Control
    }

    #[test]
    fn test_custom_target() {
        let map = KeyMap::new(u32::from(b'P'));
        assert_eq!(map.classify(u32::from(b'P')), Some(TrackedKey::Target));
        assert_eq!(map.classify(vk::V), None);
    }

    #[test]
    fn test_direction_from_message() {
        assert_eq!(direction_from_message(msg::WM_KEYDOWN), Some(KeyDirection::Down));
        assert_eq!(direction_from_message(msg::WM_KEYUP), Some(KeyDirection::Up));
        // Win+Shift+V with Alt held arrives as system key messages
        assert_eq!(direction_from_message(msg::WM_SYSKEYDOWN), Some(KeyDirection::Down));
        assert_eq!(direction_from_message(msg::WM_SYSKEYUP), Some(KeyDirection::Up));
    }

    #[test]
    fn test_direction_ignores_other_messages() {
        assert_eq!(direction_from_message(0x0102), None); // WM_CHAR
        assert_eq!(direction_from_message(0x0000), None);
        assert_eq!(direction_from_message(0x0012), None); // WM_QUIT
    }

    #[test]
    fn test_parse_letters_digits() {
        assert_eq!(parse_key_name("V"), Ok(0x56));
        assert_eq!(parse_key_name(" v "), Ok(0x56));
        assert_eq!(parse_key_name("7"), Ok(0x37));
    }

    #[test]
    fn test_parse_function_keys() {
        assert_eq!(parse_key_name("F1"), Ok(0x70));
        assert_eq!(parse_key_name("f24"), Ok(0x87));
        assert!(parse_key_name("F25").is_err());
        assert!(parse_key_name("F0").is_err());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_key_name("0x56"), Ok(0x56));
        assert!(parse_key_name("0xZZ").is_err());
        assert!(parse_key_name("0x1FF").is_err());
    }

    #[test]
    fn test_parse_rejects_modifiers_and_garbage() {
        assert_eq!(
            parse_key_name("0xA0"),
            Err(KeyParseError::Modifier("0xA0".to_string()))
        );
        assert!(matches!(parse_key_name("0x5B"), Err(KeyParseError::Modifier(_))));
        assert!(matches!(parse_key_name("Enter"), Err(KeyParseError::Unknown(_))));
        assert!(matches!(parse_key_name(""), Err(KeyParseError::Unknown(_))));
    }
}
