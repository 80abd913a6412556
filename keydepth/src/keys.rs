//! Parses and names keys and devices given on the command line.

use std::num::ParseIntError;

use analog::{
    device::DeviceId,
    keycode::{HidCode, KeycodeType, scancode},
};
use anyhow::{Result, anyhow, bail};

/// Parses a decimal or `0x`-prefixed hexadecimal number.
fn parse_number(s: &str) -> Result<u64, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

/// Parses a device ID as accepted by `--device`.
pub fn parse_device_id(s: &str) -> Result<DeviceId, String> {
    let raw = parse_number(s).map_err(|err| err.to_string())?;
    DeviceId::new(raw).ok_or_else(|| "0 is not a device ID".to_owned())
}

/// Resolves a key given either as a number or as a HID key name to a code of
/// the given keycode type.
pub fn parse_key(s: &str, mode: KeycodeType) -> Result<u16> {
    if let Ok(raw) = parse_number(s) {
        return u16::try_from(raw).map_err(|_| anyhow!("keycode {s} is out of range"));
    }

    let hid = s.parse::<HidCode>()?;
    match mode {
        KeycodeType::Hid => Ok(hid.code()),
        KeycodeType::ScanCode1 => scancode::hid_to_scancode(hid.code())
            .ok_or_else(|| anyhow!("{hid} has no scan code")),
        KeycodeType::VirtualKey | KeycodeType::VirtualKeyTranslate => {
            bail!("keys must be given as numbers in {mode} mode")
        },
    }
}

/// Looks up the HID name of a code of the given keycode type.
pub fn key_name(code: u16, mode: KeycodeType) -> Option<&'static str> {
    let hid = scancode::code_to_hid(code, mode)?;
    HidCode::try_from(hid).ok().map(HidCode::name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_taken_literally() {
        assert_eq!(parse_key("0x04", KeycodeType::Hid).unwrap(), 0x04);
        assert_eq!(parse_key("30", KeycodeType::ScanCode1).unwrap(), 30);
        assert_eq!(parse_key("0x41", KeycodeType::VirtualKey).unwrap(), 0x41);
        assert!(parse_key("0x10000", KeycodeType::Hid).is_err());
    }

    #[test]
    fn names_follow_the_mode() {
        assert_eq!(parse_key("a", KeycodeType::Hid).unwrap(), 0x04);
        assert_eq!(parse_key("ArrowUp", KeycodeType::ScanCode1).unwrap(), 0xe048);
        assert!(parse_key("A", KeycodeType::VirtualKey).is_err());
        assert!(parse_key("NotAKey", KeycodeType::Hid).is_err());
    }

    #[test]
    fn device_ids() {
        assert_eq!(parse_device_id("0x2a").unwrap().get(), 42);
        assert_eq!(parse_device_id("42").unwrap().get(), 42);
        assert!(parse_device_id("0").is_err());
        assert!(parse_device_id("keyboard").is_err());
    }

    #[test]
    fn names_of_codes() {
        assert_eq!(key_name(0x04, KeycodeType::Hid), Some("A"));
        assert_eq!(key_name(0x1e, KeycodeType::ScanCode1), Some("A"));
        assert_eq!(key_name(0x32, KeycodeType::Hid), None);
        assert_eq!(key_name(0x41, KeycodeType::VirtualKey), None);
    }
}
