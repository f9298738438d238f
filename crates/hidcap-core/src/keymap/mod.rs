//! Bidirectional table between HID usage IDs and the characters they type.
//!
//! The table is an explicitly ordered list of `(code, plain, shifted)`
//! entries.  Resolving a character to a key searches it in that order:
//! every entry's plain slot first, and only if no plain slot matches, every
//! entry's shifted slot.  Enter and Space carry the same character in both
//! slots, so they always resolve without Shift.

pub mod hid;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use hid::HidKeyCode;

/// Errors returned by [`KeyMap`] lookups.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum KeymapError {
    /// The scan code has no entry in the table.
    #[error("unknown scan code: 0x{0:02X}")]
    UnknownScanCode(u8),

    /// Neither slot of any entry produces this character.
    #[error("unmappable character: {0:?}")]
    UnmappableCharacter(char),
}

/// What a key produces when typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySymbol {
    /// An ordinary character.
    Char(char),
    /// The Caps Lock key.  It never comes out of text encoding; a decoded
    /// Caps Lock press is rendered as the literal text `CAPS`.
    CapsLock,
}

impl KeySymbol {
    /// Appends the text this symbol stands for to `out`.
    pub fn push_to(self, out: &mut String) {
        match self {
            KeySymbol::Char(c) => out.push(c),
            KeySymbol::CapsLock => out.push_str("CAPS"),
        }
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySymbol::Char(c) => write!(f, "{c}"),
            KeySymbol::CapsLock => f.write_str("CAPS"),
        }
    }
}

/// One row of the typing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    pub code: HidKeyCode,
    pub plain: KeySymbol,
    pub shifted: KeySymbol,
}

const fn key(code: HidKeyCode, plain: char, shifted: char) -> KeyEntry {
    KeyEntry {
        code,
        plain: KeySymbol::Char(plain),
        shifted: KeySymbol::Char(shifted),
    }
}

/// US layout, in ascending usage order.  The order is part of the contract:
/// it decides which entry wins when a character appears more than once.
pub const KEY_TABLE: &[KeyEntry] = &[
    key(HidKeyCode::KeyA, 'a', 'A'),
    key(HidKeyCode::KeyB, 'b', 'B'),
    key(HidKeyCode::KeyC, 'c', 'C'),
    key(HidKeyCode::KeyD, 'd', 'D'),
    key(HidKeyCode::KeyE, 'e', 'E'),
    key(HidKeyCode::KeyF, 'f', 'F'),
    key(HidKeyCode::KeyG, 'g', 'G'),
    key(HidKeyCode::KeyH, 'h', 'H'),
    key(HidKeyCode::KeyI, 'i', 'I'),
    key(HidKeyCode::KeyJ, 'j', 'J'),
    key(HidKeyCode::KeyK, 'k', 'K'),
    key(HidKeyCode::KeyL, 'l', 'L'),
    key(HidKeyCode::KeyM, 'm', 'M'),
    key(HidKeyCode::KeyN, 'n', 'N'),
    key(HidKeyCode::KeyO, 'o', 'O'),
    key(HidKeyCode::KeyP, 'p', 'P'),
    key(HidKeyCode::KeyQ, 'q', 'Q'),
    key(HidKeyCode::KeyR, 'r', 'R'),
    key(HidKeyCode::KeyS, 's', 'S'),
    key(HidKeyCode::KeyT, 't', 'T'),
    key(HidKeyCode::KeyU, 'u', 'U'),
    key(HidKeyCode::KeyV, 'v', 'V'),
    key(HidKeyCode::KeyW, 'w', 'W'),
    key(HidKeyCode::KeyX, 'x', 'X'),
    key(HidKeyCode::KeyY, 'y', 'Y'),
    key(HidKeyCode::KeyZ, 'z', 'Z'),
    key(HidKeyCode::Digit1, '1', '!'),
    key(HidKeyCode::Digit2, '2', '@'),
    key(HidKeyCode::Digit3, '3', '#'),
    key(HidKeyCode::Digit4, '4', '$'),
    key(HidKeyCode::Digit5, '5', '%'),
    key(HidKeyCode::Digit6, '6', '^'),
    key(HidKeyCode::Digit7, '7', '&'),
    key(HidKeyCode::Digit8, '8', '*'),
    key(HidKeyCode::Digit9, '9', '('),
    key(HidKeyCode::Digit0, '0', ')'),
    key(HidKeyCode::Enter, '\n', '\n'),
    key(HidKeyCode::Space, ' ', ' '),
    key(HidKeyCode::Minus, '-', '_'),
    key(HidKeyCode::Equal, '=', '+'),
    key(HidKeyCode::BracketLeft, '[', '{'),
    key(HidKeyCode::BracketRight, ']', '}'),
    key(HidKeyCode::Semicolon, ';', ':'),
    key(HidKeyCode::Quote, '\'', '"'),
    key(HidKeyCode::Comma, ',', '<'),
    key(HidKeyCode::Period, '.', '>'),
    key(HidKeyCode::Slash, '/', '?'),
    KeyEntry {
        code: HidKeyCode::CapsLock,
        plain: KeySymbol::CapsLock,
        shifted: KeySymbol::CapsLock,
    },
];

/// Lookups in both directions over [`KEY_TABLE`].
pub struct KeyMap;

impl KeyMap {
    /// Returns the symbol `scan_code` types with or without Shift held.
    ///
    /// # Errors
    ///
    /// Returns [`KeymapError::UnknownScanCode`] if the table has no entry
    /// for `scan_code`.
    pub fn char_for(scan_code: u8, shifted: bool) -> Result<KeySymbol, KeymapError> {
        let entry = KEY_TABLE
            .iter()
            .find(|e| e.code.as_u8() == scan_code)
            .ok_or(KeymapError::UnknownScanCode(scan_code))?;
        Ok(if shifted { entry.shifted } else { entry.plain })
    }

    /// Returns the key and Shift state that type `c`.
    ///
    /// A plain-slot match anywhere in the table beats any shifted-slot match.
    ///
    /// # Errors
    ///
    /// Returns [`KeymapError::UnmappableCharacter`] if no entry produces `c`.
    pub fn scan_code_for(c: char) -> Result<(HidKeyCode, bool), KeymapError> {
        let wanted = KeySymbol::Char(c);
        if let Some(entry) = KEY_TABLE.iter().find(|e| e.plain == wanted) {
            return Ok((entry.code, false));
        }
        KEY_TABLE
            .iter()
            .find(|e| e.shifted == wanted)
            .map(|e| (e.code, true))
            .ok_or(KeymapError::UnmappableCharacter(c))
    }

    /// Returns `true` if `c` can be typed.
    pub fn is_mappable(c: char) -> bool {
        Self::scan_code_for(c).is_ok()
    }
}
