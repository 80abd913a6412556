//! Named USB HID usage IDs of the keyboard/keypad usage page (`0x07`).
//!
//! The table covers the keys found on analog keyboards. Code points inside
//! the covered range without a name are listed in [`RESERVED_HID_CODES`]
//! instead of being guessed at.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Code points between [`HidCode::A`] and [`HidCode::RightMeta`] that are
/// deliberately left without a name.
///
/// `0x32` is the non-US hash key, `0x77` is SELECT. The others are either
/// uncommon on keyboards or reserved by the HID usage tables.
pub const RESERVED_HID_CODES: &[RangeInclusive<u16>] = &[
    0x32..=0x32,
    0x76..=0x78,
    0x82..=0x84,
    0x86..=0x86,
    0x8c..=0x8f,
    0x94..=0xdf,
];

/// Checks whether a code point is one of the [`RESERVED_HID_CODES`].
pub fn is_reserved(code: u16) -> bool {
    RESERVED_HID_CODES.iter().any(|range| range.contains(&code))
}

macro_rules! hid_codes {
    ($($(#[$meta:meta])* $name:ident = $value:literal,)*) => {
        /// Represents a named USB HID keyboard usage ID.
        ///
        /// Names follow the key position on the US layout.
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        #[repr(u16)]
        pub enum HidCode {
            $($(#[$meta])* $name = $value,)*
        }

        impl HidCode {
            /// All named codes in ascending order.
            pub const ALL: &'static [Self] = &[$(Self::$name,)*];

            /// The name of the constant.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }
    };
}

hid_codes! {
    // Letters
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0a,
    H = 0x0b,
    I = 0x0c,
    J = 0x0d,
    K = 0x0e,
    L = 0x0f,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1a,
    X = 0x1b,
    Y = 0x1c,
    Z = 0x1d,

    // Digits of the main block
    Digit1 = 0x1e,
    Digit2 = 0x1f,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2a,
    Tab = 0x2b,
    Space = 0x2c,
    Minus = 0x2d,
    Equal = 0x2e,
    BracketLeft = 0x2f,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,

    F1 = 0x3a,
    F2 = 0x3b,
    F3 = 0x3c,
    F4 = 0x3d,
    F5 = 0x3e,
    F6 = 0x3f,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // System and navigation
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    PauseBreak = 0x48,
    Insert = 0x49,
    Home = 0x4a,
    PageUp = 0x4b,
    Delete = 0x4c,
    End = 0x4d,
    PageDown = 0x4e,
    ArrowRight = 0x4f,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Keypad
    NumLock = 0x53,
    NumpadDivide = 0x54,
    NumpadMultiply = 0x55,
    NumpadSubtract = 0x56,
    NumpadAdd = 0x57,
    NumpadEnter = 0x58,
    Numpad1 = 0x59,
    Numpad2 = 0x5a,
    Numpad3 = 0x5b,
    Numpad4 = 0x5c,
    Numpad5 = 0x5d,
    Numpad6 = 0x5e,
    Numpad7 = 0x5f,
    Numpad8 = 0x60,
    Numpad9 = 0x61,
    Numpad0 = 0x62,
    NumpadDecimal = 0x63,

    InternationalBackslash = 0x64,
    ContextMenu = 0x65,
    Power = 0x66,
    NumpadEqual = 0x67,

    // Extended function keys
    F13 = 0x68,
    F14 = 0x69,
    F15 = 0x6a,
    F16 = 0x6b,
    F17 = 0x6c,
    F18 = 0x6d,
    F19 = 0x6e,
    F20 = 0x6f,
    F21 = 0x70,
    F22 = 0x71,
    F23 = 0x72,
    F24 = 0x73,

    // Editing and media
    Open = 0x74,
    Help = 0x75,
    Again = 0x79,
    Undo = 0x7a,
    Cut = 0x7b,
    Copy = 0x7c,
    Paste = 0x7d,
    Find = 0x7e,
    VolumeMute = 0x7f,
    VolumeUp = 0x80,
    VolumeDown = 0x81,

    // International and language
    NumpadComma = 0x85,
    InternationalRO = 0x87,
    KanaMode = 0x88,
    InternationalYen = 0x89,
    Convert = 0x8a,
    NonConvert = 0x8b,
    Lang1 = 0x90,
    Lang2 = 0x91,
    Lang3 = 0x92,
    Lang4 = 0x93,

    // Modifiers
    LeftCtrl = 0xe0,
    LeftShift = 0xe1,
    LeftAlt = 0xe2,
    LeftMeta = 0xe3,
    RightCtrl = 0xe4,
    RightShift = 0xe5,
    RightAlt = 0xe6,
    RightMeta = 0xe7,
}

impl HidCode {
    /// The raw usage ID.
    pub fn code(self) -> u16 {
        self.into()
    }
}

impl fmt::Display for HidCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HidCode {
    type Err = UnknownHidCode;

    /// Looks up a code by its constant name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownHidCode(s.to_owned()))
    }
}

/// Indicates that a string does not name a [`HidCode`].
#[derive(Debug, thiserror::Error)]
#[error("unknown HID key name `{0}`")]
pub struct UnknownHidCode(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in HidCode::ALL.windows(2) {
            assert!(pair[0].code() < pair[1].code(), "{:?} / {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn named_and_reserved_cover_the_range_exactly() {
        for code in HidCode::A.code()..=HidCode::RightMeta.code() {
            let named = HidCode::try_from(code).is_ok();
            assert_ne!(named, is_reserved(code), "code {code:#04x}");
        }
    }

    #[test]
    fn well_known_values() {
        assert_eq!(HidCode::A.code(), 0x04);
        assert_eq!(HidCode::Digit0.code(), 0x27);
        assert_eq!(HidCode::F24.code(), 0x73);
        assert_eq!(HidCode::LeftCtrl.code(), 0xe0);
        assert_eq!(HidCode::ALL.len(), 140);
    }

    #[test]
    fn names_parse_back() {
        for &code in HidCode::ALL {
            assert_eq!(code.name().parse::<HidCode>().unwrap(), code);
        }
        assert_eq!("leftshift".parse::<HidCode>().unwrap(), HidCode::LeftShift);
        assert!("IntlHash".parse::<HidCode>().is_err());
    }
}
