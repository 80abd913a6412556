//! Translation between HID usage IDs and scan code set 1.
//!
//! Extended scan codes carry the `0xE0` escape byte in their high byte
//! (e.g. `0xE048` for the up arrow). A high byte of `0x01` is accepted as an
//! alias for `0xE0`, as some platforms report extended codes that way.

use bimap::BiMap;
use lazy_static::lazy_static;
use log::warn;

use super::KeycodeType;

/// The high byte marking an extended scan code.
const EXTENDED_PREFIX: u16 = 0xe0;

/// The alternative high byte some platforms use for extended scan codes.
const EXTENDED_ALIAS_PREFIX: u16 = 0x01;

/// Codes at or above this value are vendor-defined custom keys, unless they
/// carry the extended prefix. They are identical in every keycode space.
const CUSTOM_KEY_START: u16 = 0x200;

/// Pairs of (HID usage ID, scan code set 1 code).
///
/// OPEN, AGAIN and FIND have no scan code and are absent.
#[rustfmt::skip]
const SCANCODE_PAIRS: &[(u8, u16)] = &[
    (0x04, 0x001e), (0x05, 0x0030), (0x06, 0x002e), (0x07, 0x0020),
    (0x08, 0x0012), (0x09, 0x0021), (0x0a, 0x0022), (0x0b, 0x0023),
    (0x0c, 0x0017), (0x0d, 0x0024), (0x0e, 0x0025), (0x0f, 0x0026),
    (0x10, 0x0032), (0x11, 0x0031), (0x12, 0x0018), (0x13, 0x0019),
    (0x14, 0x0010), (0x15, 0x0013), (0x16, 0x001f), (0x17, 0x0014),
    (0x18, 0x0016), (0x19, 0x002f), (0x1a, 0x0011), (0x1b, 0x002d),
    (0x1c, 0x0015), (0x1d, 0x002c), (0x1e, 0x0002), (0x1f, 0x0003),
    (0x20, 0x0004), (0x21, 0x0005), (0x22, 0x0006), (0x23, 0x0007),
    (0x24, 0x0008), (0x25, 0x0009), (0x26, 0x000a), (0x27, 0x000b),
    (0x28, 0x001c), (0x29, 0x0001), (0x2a, 0x000e), (0x2b, 0x000f),
    (0x2c, 0x0039), (0x2d, 0x000c), (0x2e, 0x000d), (0x2f, 0x001a),
    (0x30, 0x001b), (0x31, 0x002b), (0x33, 0x0027), (0x34, 0x0028),
    (0x35, 0x0029), (0x36, 0x0033), (0x37, 0x0034), (0x38, 0x0035),
    (0x39, 0x003a), (0x3a, 0x003b), (0x3b, 0x003c), (0x3c, 0x003d),
    (0x3d, 0x003e), (0x3e, 0x003f), (0x3f, 0x0040), (0x40, 0x0041),
    (0x41, 0x0042), (0x42, 0x0043), (0x43, 0x0044), (0x44, 0x0057),
    (0x45, 0x0058), (0x46, 0xe037), (0x47, 0x0046), (0x48, 0x0045),
    (0x49, 0xe052), (0x4a, 0xe047), (0x4b, 0xe049), (0x4c, 0xe053),
    (0x4d, 0xe04f), (0x4e, 0xe051), (0x4f, 0xe04d), (0x50, 0xe04b),
    (0x51, 0xe050), (0x52, 0xe048), (0x53, 0xe045), (0x54, 0xe035),
    (0x55, 0x0037), (0x56, 0x004a), (0x57, 0x004e), (0x58, 0xe01c),
    (0x59, 0x004f), (0x5a, 0x0050), (0x5b, 0x0051), (0x5c, 0x004b),
    (0x5d, 0x004c), (0x5e, 0x004d), (0x5f, 0x0047), (0x60, 0x0048),
    (0x61, 0x0049), (0x62, 0x0052), (0x63, 0x0053), (0x64, 0x0056),
    (0x65, 0xe05d), (0x66, 0xe05e), (0x67, 0x0059), (0x68, 0x0064),
    (0x69, 0x0065), (0x6a, 0x0066), (0x6b, 0x0067), (0x6c, 0x0068),
    (0x6d, 0x0069), (0x6e, 0x006a), (0x6f, 0x006b), (0x70, 0x006c),
    (0x71, 0x006d), (0x72, 0x006e), (0x73, 0x0076), (0x75, 0xe03b),
    (0x7a, 0xe008), (0x7b, 0xe017), (0x7c, 0xe018), (0x7d, 0xe00a),
    (0x7f, 0xe020), (0x80, 0xe030), (0x81, 0xe02e), (0x85, 0x007e),
    (0x87, 0x0073), (0x88, 0x0070), (0x89, 0x007d), (0x8a, 0x0079),
    (0x8b, 0x007b), (0x90, 0x0072), (0x91, 0x0071), (0x92, 0x0078),
    (0x93, 0x0077), (0xe0, 0x001d), (0xe1, 0x002a), (0xe2, 0x0038),
    (0xe3, 0xe05b), (0xe4, 0xe01d), (0xe5, 0x0036), (0xe6, 0xe038),
    (0xe7, 0xe05c),
];

lazy_static! {
    static ref SCANCODE_MAP: BiMap<u8, u16> = {
        let mut map = BiMap::with_capacity(SCANCODE_PAIRS.len());
        for &(hid, scancode) in SCANCODE_PAIRS {
            if let Err((hid, scancode)) = map.insert_no_overwrite(hid, scancode) {
                warn!("duplicate scan code mapping {hid:#04x} -> {scancode:#06x}");
            }
        }
        map
    };
}

/// Translates a HID usage ID to its scan code.
pub fn hid_to_scancode(code: u16) -> Option<u16> {
    let code = u8::try_from(code).ok()?;
    SCANCODE_MAP.get_by_left(&code).copied()
}

/// Translates a scan code to its HID usage ID.
pub fn scancode_to_hid(code: u16) -> Option<u16> {
    let code = if code >> 8 == EXTENDED_ALIAS_PREFIX {
        (EXTENDED_PREFIX << 8) | (code & 0xff)
    } else {
        code
    };

    SCANCODE_MAP.get_by_right(&code).map(|&hid| u16::from(hid))
}

fn is_custom(code: u16) -> bool {
    code >= CUSTOM_KEY_START && code >> 8 != EXTENDED_PREFIX
}

/// Translates a keycode of the given type to a HID usage ID.
///
/// Returns [`None`] if there is no mapping. Virtual keys depend on the
/// operating system's keyboard layout and are not translated here.
pub fn code_to_hid(code: u16, typ: KeycodeType) -> Option<u16> {
    if is_custom(code) {
        return Some(code);
    }

    match typ {
        KeycodeType::Hid => (code >> 8 == 0).then_some(code),
        KeycodeType::ScanCode1 => scancode_to_hid(code),
        KeycodeType::VirtualKey | KeycodeType::VirtualKeyTranslate => None,
    }
}

/// Translates a HID usage ID to a keycode of the given type.
///
/// Returns [`None`] if there is no mapping.
pub fn hid_to_code(code: u16, typ: KeycodeType) -> Option<u16> {
    if is_custom(code) {
        return Some(code);
    }
    if code >> 8 != 0 {
        return None;
    }

    match typ {
        KeycodeType::Hid => Some(code),
        KeycodeType::ScanCode1 => hid_to_scancode(code),
        KeycodeType::VirtualKey | KeycodeType::VirtualKeyTranslate => None,
    }
}
