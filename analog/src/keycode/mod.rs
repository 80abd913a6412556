//! Keycode spaces understood by the SDK and the constant tables for them.

use std::{fmt, str::FromStr};

use num_enum::{IntoPrimitive, TryFromPrimitive};

pub mod hid;
pub mod scancode;

pub use hid::{HidCode, RESERVED_HID_CODES};

/// Represents the interpretation space used to decode keycodes passed to
/// and returned from the SDK.
///
/// The same integer identifies a different physical key depending on the
/// active type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum KeycodeType {
    /// USB HID usage IDs of the keyboard/keypad page.
    #[default]
    Hid = 0,

    /// Scan code set 1.
    ScanCode1 = 1,

    /// Windows virtual keys.
    VirtualKey = 2,

    /// Windows virtual keys translated to the current keyboard locale.
    ///
    /// A code identifies the key that produces the character on the active
    /// layout, not the key at that position on the standard layout.
    VirtualKeyTranslate = 3,
}

impl KeycodeType {
    /// All keycode types in discriminant order.
    pub const ALL: [Self; 4] = [
        Self::Hid,
        Self::ScanCode1,
        Self::VirtualKey,
        Self::VirtualKeyTranslate,
    ];
}

impl fmt::Display for KeycodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hid => "hid",
            Self::ScanCode1 => "scancode1",
            Self::VirtualKey => "virtual-key",
            Self::VirtualKeyTranslate => "virtual-key-translate",
        })
    }
}

impl FromStr for KeycodeType {
    type Err = UnknownKeycodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|typ| typ.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKeycodeType(s.to_owned()))
    }
}

/// Indicates that a string does not name a [`KeycodeType`].
#[derive(Debug, thiserror::Error)]
#[error("unknown keycode type `{0}`")]
pub struct UnknownKeycodeType(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_match_the_c_surface() {
        assert_eq!(u32::from(KeycodeType::Hid), 0);
        assert_eq!(u32::from(KeycodeType::ScanCode1), 1);
        assert_eq!(u32::from(KeycodeType::VirtualKey), 2);
        assert_eq!(u32::from(KeycodeType::VirtualKeyTranslate), 3);
        assert!(KeycodeType::try_from(4).is_err());
    }

    #[test]
    fn names_parse_back() {
        for typ in KeycodeType::ALL {
            assert_eq!(typ.to_string().parse::<KeycodeType>().unwrap(), typ);
        }
        assert_eq!("HID".parse::<KeycodeType>().unwrap(), KeycodeType::Hid);
        assert!("dvorak".parse::<KeycodeType>().is_err());
    }
}
