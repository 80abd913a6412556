//! Describes the analog devices reported by the SDK.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Uniquely identifies a connected device.
///
/// The ID is generated by the SDK from the device's vendor ID, product ID
/// and serial number, so it stays stable across reconnects.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceId(pub(crate) u64);

impl DeviceId {
    /// The raw value the C surface uses to address all devices at once.
    pub(crate) const ANY: u64 = 0;

    /// Wraps a raw device ID.
    ///
    /// Returns [`None`] for `0`, which the SDK reserves for "any device".
    pub fn new(raw: u64) -> Option<Self> {
        (raw != Self::ANY).then_some(Self(raw))
    }

    /// The raw device ID.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Converts an optional device ID into the raw value passed to the SDK.
    pub(crate) fn to_raw(id: Option<Self>) -> u64 {
        id.map_or(Self::ANY, Self::get)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Represents the hardware category of a device.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(i32)]
pub enum DeviceType {
    /// A full keyboard.
    Keyboard = 1,

    /// A keypad.
    Keypad = 2,

    /// Anything else.
    #[default]
    Other = 3,
}

/// Describes a connected device.
///
/// Returned by [`crate::client::AnalogClient::get_connected_devices_info`].
/// The values are a snapshot taken at the time of the call.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceInfo {
    /// The USB vendor ID.
    pub vendor_id: u16,

    /// The USB product ID.
    pub product_id: u16,

    /// The name of the manufacturer.
    pub manufacturer_name: String,

    /// The name of the device.
    pub device_name: String,

    /// The unique ID of the device.
    pub device_id: DeviceId,

    /// The hardware category of the device.
    pub device_type: DeviceType,
}

/// Represents the kind of a [`DeviceEvent`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(i32)]
pub enum DeviceEventKind {
    /// The device has been connected.
    Connected = 1,

    /// The device has been disconnected.
    Disconnected = 2,
}

/// Notifies about a device being connected or disconnected.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceEvent {
    /// What happened to the device.
    pub kind: DeviceEventKind,

    /// The device the event applies to.
    pub device: DeviceInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_device_id() {
        assert_eq!(DeviceId::new(0), None);
        assert_eq!(DeviceId::to_raw(None), 0);
        assert_eq!(DeviceId::to_raw(DeviceId::new(42)), 42);
    }

    #[test]
    fn device_types_match_the_c_surface() {
        assert_eq!(DeviceType::try_from(1).unwrap(), DeviceType::Keyboard);
        assert_eq!(DeviceType::try_from(2).unwrap(), DeviceType::Keypad);
        assert_eq!(DeviceType::try_from(3).unwrap(), DeviceType::Other);
        assert!(DeviceType::try_from(0).is_err());
    }
}
