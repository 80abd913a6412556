//! Implements the seam between the client and the analog SDK.
//!
//! The SDK is a native library exporting a small, fixed set of C functions.
//! [`Backend`] mirrors that surface one function per method, including its
//! conventions: results and failures share a single return value, and
//! variable-length results are written into caller-provided buffers.
//! Translating these conventions into Rust types is the job of
//! [`crate::client::AnalogClient`], not of the backend implementations.

use std::sync::Arc;

use log::warn;

use crate::{
    device::{DeviceEvent, DeviceId, DeviceInfo, DeviceType},
    event::EventEmitter,
};

#[cfg(feature = "native")]
pub mod native;
pub mod simulated;
pub mod status;

/// The emitter a backend forwards device connection events to.
pub type DeviceEventSink = Arc<EventEmitter<DeviceEvent>>;

/// Represents a device record as it crosses the C surface.
///
/// Unlike [`DeviceInfo`], no field has been validated yet.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct RawDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer_name: String,
    pub device_name: String,
    pub device_id: u64,
    pub device_type: i32,
}

impl RawDeviceInfo {
    /// Validates the record.
    ///
    /// Returns [`None`] if the record carries the reserved device ID `0`.
    /// Unknown device types are reported as [`DeviceType::Other`].
    pub fn into_device_info(self) -> Option<DeviceInfo> {
        let Some(device_id) = DeviceId::new(self.device_id) else {
            warn!(
                "ignoring device record without an ID ({:#06x}:{:#06x})",
                self.vendor_id, self.product_id
            );
            return None;
        };

        let device_type = DeviceType::try_from(self.device_type).unwrap_or_else(|_| {
            warn!(
                "device {} reported unknown device type {}",
                device_id, self.device_type
            );
            DeviceType::Other
        });

        Some(DeviceInfo {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            manufacturer_name: self.manufacturer_name,
            device_name: self.device_name,
            device_id,
            device_type,
        })
    }
}

impl From<DeviceInfo> for RawDeviceInfo {
    fn from(info: DeviceInfo) -> Self {
        Self {
            vendor_id: info.vendor_id,
            product_id: info.product_id,
            manufacturer_name: info.manufacturer_name,
            device_name: info.device_name,
            device_id: info.device_id.get(),
            device_type: info.device_type.into(),
        }
    }
}

/// Represents the function surface exported by the analog SDK.
///
/// Integer return values are either a non-negative result (a count) or a
/// negative [`status::Status`] code. Functions without a result return
/// [`status::Status::Ok`] on success. A device ID of `0` addresses all
/// connected devices.
///
/// Implementations must not panic on any input; invalid input is reported
/// through the status codes.
pub trait Backend {
    /// Returns the major version of the SDK.
    fn version(&self) -> i32;

    /// Initialises the SDK.
    ///
    /// Returns the amount of devices found during initialisation.
    fn initialise(&mut self) -> i32;

    /// Checks whether the SDK is initialised.
    fn is_initialised(&self) -> bool;

    /// Returns the SDK to its uninitialised state.
    fn uninitialise(&mut self) -> i32;

    /// Sets the keycode type (see [`crate::keycode::KeycodeType`]) used by
    /// all following reads.
    fn set_keycode_mode(&mut self, mode: u32) -> i32;

    /// Reads the analog value of a single key.
    ///
    /// Returns a value between `0.0` and `1.0`, or a negative status code
    /// cast to a float.
    fn read_analog_device(&self, code: u16, device_id: u64) -> f32;

    /// Fills `buffer` with the currently connected devices.
    ///
    /// Returns the amount of records written.
    fn get_connected_devices_info(&self, buffer: &mut [RawDeviceInfo]) -> i32;

    /// Fills `code_buffer` and `analog_buffer` pairwise with all keys that
    /// are currently pressed.
    ///
    /// Returns the amount of pairs written, never more than the length of the
    /// shorter buffer.
    fn read_full_buffer_device(
        &self,
        code_buffer: &mut [u16],
        analog_buffer: &mut [f32],
        device_id: u64,
    ) -> i32;

    /// Sets or clears the emitter device connection events are sent to.
    fn set_device_event_sink(&mut self, sink: Option<DeviceEventSink>) -> i32;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn version(&self) -> i32 {
        (**self).version()
    }

    fn initialise(&mut self) -> i32 {
        (**self).initialise()
    }

    fn is_initialised(&self) -> bool {
        (**self).is_initialised()
    }

    fn uninitialise(&mut self) -> i32 {
        (**self).uninitialise()
    }

    fn set_keycode_mode(&mut self, mode: u32) -> i32 {
        (**self).set_keycode_mode(mode)
    }

    fn read_analog_device(&self, code: u16, device_id: u64) -> f32 {
        (**self).read_analog_device(code, device_id)
    }

    fn get_connected_devices_info(&self, buffer: &mut [RawDeviceInfo]) -> i32 {
        (**self).get_connected_devices_info(buffer)
    }

    fn read_full_buffer_device(
        &self,
        code_buffer: &mut [u16],
        analog_buffer: &mut [f32],
        device_id: u64,
    ) -> i32 {
        (**self).read_full_buffer_device(code_buffer, analog_buffer, device_id)
    }

    fn set_device_event_sink(&mut self, sink: Option<DeviceEventSink>) -> i32 {
        (**self).set_device_event_sink(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_without_id_are_rejected() {
        assert!(RawDeviceInfo::default().into_device_info().is_none());
    }

    #[test]
    fn unknown_device_types_become_other() {
        let raw = RawDeviceInfo {
            device_id: 9,
            device_type: 42,
            ..Default::default()
        };

        let info = raw.into_device_info().unwrap();
        assert_eq!(info.device_type, DeviceType::Other);
        assert_eq!(info.device_id.get(), 9);
    }
}
