//! Host keycode → Android keycode table.
//!
//! Host keys are USB HID usage IDs (page 0x07, Keyboard/Keypad), the same
//! canonical codes a presentation layer gets from any platform's key
//! translation. The table is built once on first use and never mutated.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Named HID usage IDs referenced outside the table.
pub mod hid {
    pub const KEY_A: u32 = 0x04;
    pub const KEY_Z: u32 = 0x1D;
    pub const DIGIT_1: u32 = 0x1E;
    pub const DIGIT_0: u32 = 0x27;
    pub const ENTER: u32 = 0x28;
    pub const ESCAPE: u32 = 0x29;
    pub const BACKSPACE: u32 = 0x2A;
    pub const SPACE: u32 = 0x2C;
    pub const CAPS_LOCK: u32 = 0x39;
    pub const F1: u32 = 0x3A;
    pub const HOME: u32 = 0x4A;
    pub const ARROW_UP: u32 = 0x52;
    pub const VOLUME_UP: u32 = 0x80;
    pub const VOLUME_DOWN: u32 = 0x81;
}

/// `(hid_usage, android_keycode)`; a keycode `<= 0` marks a key that is
/// known but deliberately not forwarded.
static KEY_TABLE: &[(u32, i32)] = &[
    // Letters A..Z → KEYCODE_A (29) ..
    (0x04, 29), (0x05, 30), (0x06, 31), (0x07, 32), (0x08, 33), (0x09, 34),
    (0x0A, 35), (0x0B, 36), (0x0C, 37), (0x0D, 38), (0x0E, 39), (0x0F, 40),
    (0x10, 41), (0x11, 42), (0x12, 43), (0x13, 44), (0x14, 45), (0x15, 46),
    (0x16, 47), (0x17, 48), (0x18, 49), (0x19, 50), (0x1A, 51), (0x1B, 52),
    (0x1C, 53), (0x1D, 54),
    // Digits 1..9, 0 → KEYCODE_1 (8) .. KEYCODE_9 (16), KEYCODE_0 (7)
    (0x1E, 8), (0x1F, 9), (0x20, 10), (0x21, 11), (0x22, 12), (0x23, 13),
    (0x24, 14), (0x25, 15), (0x26, 16), (0x27, 7),
    (0x28, 66),  // Enter → ENTER
    (0x29, 4),   // Escape → BACK
    (0x2A, 67),  // Backspace → DEL
    (0x2B, 61),  // Tab
    (0x2C, 62),  // Space
    (0x2D, 69),  // Minus
    (0x2E, 70),  // Equals
    (0x2F, 71),  // [
    (0x30, 72),  // ]
    (0x31, 73),  // Backslash
    (0x33, 74),  // Semicolon
    (0x34, 75),  // Apostrophe
    (0x35, 68),  // Grave
    (0x36, 55),  // Comma
    (0x37, 56),  // Period
    (0x38, 76),  // Slash
    (0x39, 0),   // Caps Lock
    (0x3A, 82),  // F1 → MENU
    (0x3B, 0),   // F2
    (0x46, 120), // Print Screen → SYSRQ
    (0x49, 0),   // Insert
    (0x4A, 3),   // Home → HOME
    (0x4B, 92),  // Page Up
    (0x4C, 112), // Delete → FORWARD_DEL
    (0x4E, 93),  // Page Down
    (0x4F, 22),  // Right → DPAD_RIGHT
    (0x50, 21),  // Left → DPAD_LEFT
    (0x51, 20),  // Down → DPAD_DOWN
    (0x52, 19),  // Up → DPAD_UP
    (0x58, 23),  // Keypad Enter → DPAD_CENTER
    (0x66, 26),  // Power
    (0x7F, 164), // Mute → VOLUME_MUTE
    (0x80, 24),  // Volume Up
    (0x81, 25),  // Volume Down
];

static GLOBAL: LazyLock<KeyMap> = LazyLock::new(|| KeyMap::from_pairs(KEY_TABLE.iter().copied()));

/// Read-only lookup from host keycode to device keycode.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    keys: HashMap<u32, i32>,
}

impl KeyMap {
    /// The process-wide table.
    pub fn global() -> &'static KeyMap {
        &GLOBAL
    }

    /// Build a table from `(host, device)` pairs; later pairs win.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, i32)>,
    {
        Self {
            keys: pairs.into_iter().collect(),
        }
    }

    /// Device keycode for `host`, or `None` when unmapped.
    pub fn lookup(&self, host: u32) -> Option<u32> {
        match self.keys.get(&host) {
            Some(&code) if code > 0 => Some(code as u32),
            _ => None,
        }
    }

    /// Number of entries, unmapped markers included.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_digits() {
        let map = KeyMap::global();
        assert_eq!(map.lookup(hid::KEY_A), Some(29));
        assert_eq!(map.lookup(hid::KEY_Z), Some(54));
        assert_eq!(map.lookup(hid::DIGIT_1), Some(8));
        assert_eq!(map.lookup(hid::DIGIT_0), Some(7));
    }

    #[test]
    fn navigation_keys() {
        let map = KeyMap::global();
        assert_eq!(map.lookup(hid::ESCAPE), Some(4));
        assert_eq!(map.lookup(hid::HOME), Some(3));
        assert_eq!(map.lookup(hid::ARROW_UP), Some(19));
        assert_eq!(map.lookup(hid::VOLUME_DOWN), Some(25));
    }

    #[test]
    fn non_positive_entries_are_unmapped() {
        let map = KeyMap::global();
        assert_eq!(map.lookup(hid::CAPS_LOCK), None);
        assert_eq!(map.lookup(0xFFFF), None);

        let custom = KeyMap::from_pairs([(1, -1), (2, 0), (3, 5)]);
        assert_eq!(custom.lookup(1), None);
        assert_eq!(custom.lookup(2), None);
        assert_eq!(custom.lookup(3), Some(5));
    }

    #[test]
    fn later_pairs_override() {
        let map = KeyMap::from_pairs([(1, 10), (1, 20)]);
        assert_eq!(map.lookup(1), Some(20));
        assert_eq!(map.len(), 1);
    }
}
