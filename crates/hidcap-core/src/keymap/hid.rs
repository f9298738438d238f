//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page) for the keys that
//! the capture codec can type.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # What is a HID Usage ID? (for beginners)
//!
//! The **USB Human Interface Device (HID)** standard assigns a unique number to
//! every key on a keyboard.  A keyboard in boot protocol reports the keys it
//! currently holds down as these numbers, one byte each:
//!
//! | Key          | HID Usage ID |
//! |--------------|-------------|
//! | Letter A     | 0x04        |
//! | Digit 1      | 0x1E        |
//! | Enter        | 0x28        |
//! | Caps Lock    | 0x39        |
//!
//! The codes name **physical key positions**, not characters.  Whether 0x1E
//! means `1` or `!` depends on the Shift bit in the report's modifier byte,
//! which is why [`crate::keymap::KeyMap`] stores a `(plain, shifted)` pair per
//! code.
//!
//! Usage ID 0x00 means "no key" and is what a release report carries.

use serde::{Deserialize, Serialize};

/// USB HID Usage ID for the keys the codec knows about.
///
/// The numeric value of each variant is its HID Usage ID on the keyboard/keypad page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Whitespace and punctuation (HID 0x28–0x38)
    Enter = 0x28,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Semicolon = 0x33,
    Quote = 0x34,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    // Lock keys
    CapsLock = 0x39,
}

impl HidKeyCode {
    /// Converts a raw HID Usage ID byte to a [`HidKeyCode`].
    ///
    /// Returns `None` for 0x00 ("no key") and for any usage the codec does
    /// not type.
    pub fn from_u8(value: u8) -> Option<Self> {
        let code = match value {
            0x04 => HidKeyCode::KeyA,
            0x05 => HidKeyCode::KeyB,
            0x06 => HidKeyCode::KeyC,
            0x07 => HidKeyCode::KeyD,
            0x08 => HidKeyCode::KeyE,
            0x09 => HidKeyCode::KeyF,
            0x0A => HidKeyCode::KeyG,
            0x0B => HidKeyCode::KeyH,
            0x0C => HidKeyCode::KeyI,
            0x0D => HidKeyCode::KeyJ,
            0x0E => HidKeyCode::KeyK,
            0x0F => HidKeyCode::KeyL,
            0x10 => HidKeyCode::KeyM,
            0x11 => HidKeyCode::KeyN,
            0x12 => HidKeyCode::KeyO,
            0x13 => HidKeyCode::KeyP,
            0x14 => HidKeyCode::KeyQ,
            0x15 => HidKeyCode::KeyR,
            0x16 => HidKeyCode::KeyS,
            0x17 => HidKeyCode::KeyT,
            0x18 => HidKeyCode::KeyU,
            0x19 => HidKeyCode::KeyV,
            0x1A => HidKeyCode::KeyW,
            0x1B => HidKeyCode::KeyX,
            0x1C => HidKeyCode::KeyY,
            0x1D => HidKeyCode::KeyZ,
            0x1E => HidKeyCode::Digit1,
            0x1F => HidKeyCode::Digit2,
            0x20 => HidKeyCode::Digit3,
            0x21 => HidKeyCode::Digit4,
            0x22 => HidKeyCode::Digit5,
            0x23 => HidKeyCode::Digit6,
            0x24 => HidKeyCode::Digit7,
            0x25 => HidKeyCode::Digit8,
            0x26 => HidKeyCode::Digit9,
            0x27 => HidKeyCode::Digit0,
            0x28 => HidKeyCode::Enter,
            0x2C => HidKeyCode::Space,
            0x2D => HidKeyCode::Minus,
            0x2E => HidKeyCode::Equal,
            0x2F => HidKeyCode::BracketLeft,
            0x30 => HidKeyCode::BracketRight,
            0x33 => HidKeyCode::Semicolon,
            0x34 => HidKeyCode::Quote,
            0x36 => HidKeyCode::Comma,
            0x37 => HidKeyCode::Period,
            0x38 => HidKeyCode::Slash,
            0x39 => HidKeyCode::CapsLock,
            _ => return None,
        };
        Some(code)
    }

    /// Returns the raw USB HID Usage ID value for this key code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD_KEYS: &[(u8, HidKeyCode)] = &[
        (0x04, HidKeyCode::KeyA),
        (0x1D, HidKeyCode::KeyZ),
        (0x1E, HidKeyCode::Digit1),
        (0x27, HidKeyCode::Digit0),
        (0x28, HidKeyCode::Enter),
        (0x2C, HidKeyCode::Space),
        (0x2F, HidKeyCode::BracketLeft),
        (0x30, HidKeyCode::BracketRight),
        (0x33, HidKeyCode::Semicolon),
        (0x38, HidKeyCode::Slash),
        (0x39, HidKeyCode::CapsLock),
    ];

    #[test]
    fn test_from_u8_produces_correct_key_codes_for_all_standard_keys() {
        for &(raw, expected) in STANDARD_KEYS {
            assert_eq!(
                HidKeyCode::from_u8(raw),
                Some(expected),
                "from_u8(0x{raw:02X}) should produce {expected:?}"
            );
            assert_eq!(expected.as_u8(), raw);
        }
    }

    #[test]
    fn test_unassigned_and_untyped_values_return_none() {
        // 0x00 is "no key"; 0x29 (Escape), 0x31 (Backslash), 0x35 (Backquote)
        // exist on a keyboard but are not part of the typing table.
        for raw in [0x00, 0x01, 0x29, 0x2A, 0x31, 0x32, 0x35, 0x3A, 0xE1, 0xFF] {
            assert_eq!(
                HidKeyCode::from_u8(raw),
                None,
                "0x{raw:02X} should not map to a key code"
            );
        }
    }

    #[test]
    fn test_all_letter_keys_are_contiguous() {
        for offset in 0..26u8 {
            let code = HidKeyCode::from_u8(0x04 + offset).expect("letter code");
            assert_eq!(code.as_u8(), 0x04 + offset);
        }
    }
}
