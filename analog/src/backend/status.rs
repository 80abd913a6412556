//! Status codes returned across the C surface of the analog SDK.
//!
//! Every exported SDK function reports its outcome through a single integer
//! (or, for analog reads, a single float). Non-negative values are results
//! such as device or entry counts, negative values are one of the [`Status`]
//! codes below.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Represents a status code reported by the SDK.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(i32)]
pub enum Status {
    /// The call succeeded.
    Ok = 1,

    /// The SDK has not been initialised.
    UnInitialized = -2000,

    /// No devices are connected, or none matches the requested device ID.
    NoDevices = -1999,

    /// The addressed device has been disconnected.
    DeviceDisconnected = -1998,

    /// Generic failure inside the SDK or one of its plugins.
    Failure = -1997,

    /// A given parameter was invalid.
    InvalidArgument = -1996,

    /// No plugins were found or none could be initialised.
    NoPlugins = -1995,

    /// The requested function was not found in the loaded library.
    FunctionNotFound = -1994,

    /// No mapping between the active keycode type and HID exists for the
    /// given keycode.
    NoMapping = -1993,

    /// The requested feature is not available on this platform.
    NotAvailable = -1992,

    /// The installed SDK is of an incompatible major version.
    IncompatibleVersion = -1991,

    /// The SDK library could not be found on the system.
    DllNotFound = -1990,
}

/// Represents a negative value received from the SDK, which may or may not
/// be a known [`Status`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StatusCode {
    /// The value is one of the known status codes.
    Known(Status),

    /// The value is not part of the status table.
    Unknown(i32),
}

impl From<i32> for StatusCode {
    fn from(raw: i32) -> Self {
        match Status::try_from(raw) {
            Ok(status) => Self::Known(status),
            Err(_) => Self::Unknown(raw),
        }
    }
}

impl From<Status> for StatusCode {
    fn from(status: Status) -> Self {
        Self::Known(status)
    }
}

impl Status {
    /// Interprets a raw status-or-count value.
    ///
    /// Non-negative values are counts, negative ones are status codes.
    pub fn from_count(raw: i32) -> Result<u32, StatusCode> {
        if raw >= 0 {
            return Ok(raw as u32);
        }

        Err(StatusCode::from(raw))
    }

    /// Interprets a raw analog value, where negative values carry a status
    /// code cast to a float.
    pub fn from_analog(raw: f32) -> Result<f32, StatusCode> {
        if raw >= 0.0 {
            return Ok(raw);
        }

        Err(StatusCode::from(raw as i32))
    }

    /// Interprets a raw value returned by a function that reports nothing
    /// but its status.
    pub fn from_plain(raw: i32) -> Result<(), StatusCode> {
        match StatusCode::from(raw) {
            StatusCode::Known(Status::Ok) => Ok(()),
            other => Err(other),
        }
    }

    /// Encodes the status as the float an analog read would return.
    pub fn to_analog(self) -> f32 {
        i32::from(self) as f32
    }
}
