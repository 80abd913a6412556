//! A client for analog keyboards reached through the Wooting Analog SDK.
//!
//! Analog keyboards report how far each key is pressed instead of a binary
//! pressed/released state. The SDK hides the device handling behind a small
//! C surface; this crate wraps that surface in a typed, validated client.
//!
//! # Quickstart
//!
//! The SDK itself is reached through the [`backend::Backend`] trait. With
//! the `native` feature enabled, [`backend::native::NativeBackend`] links the
//! SDK installed on the system. [`backend::simulated::SimulatedBackend`]
//! works without any hardware:
//!
//! ```
//! use analog::{
//!     AnalogClient,
//!     ClientError,
//!     backend::simulated::SimulatedBackend,
//!     keycode::HidCode,
//! };
//!
//! let mut client = AnalogClient::new(SimulatedBackend::demo());
//!
//! // Queries fail until the session is open.
//! assert_eq!(
//!     client.read_analog(HidCode::A.code(), None),
//!     Err(ClientError::NotInitialized)
//! );
//!
//! let devices = client.initialize().expect("could not initialise the SDK");
//! assert_eq!(devices, 1);
//!
//! for device in client.get_connected_devices_info(5).unwrap() {
//!     println!("{} by {}", device.device_name, device.manufacturer_name);
//! }
//!
//! // Without a device ID, the values of all devices are combined.
//! let depth = client.read_analog(HidCode::A.code(), None).unwrap();
//! assert!((depth - 0.73).abs() < 1e-6);
//!
//! // Keys at rest are omitted from full reads.
//! let pressed = client.read_full_buffer(16).unwrap();
//! assert!(!pressed.contains_key(&HidCode::Z.code()));
//!
//! client.uninitialize();
//! ```
//!
//! Keycodes are interpreted according to the active [`keycode::KeycodeType`],
//! which defaults to HID usage IDs and can be switched using
//! [`AnalogClient::set_keycode_mode`].
//!
//! The client never retries a failed call. Polling loops can use
//! [`poll::Backoff`] to tell transient errors apart from fatal ones.

pub mod backend;
pub mod client;
pub mod device;
pub mod event;
pub mod keycode;
pub mod poll;

pub use client::{AnalogClient, ClientError, ErrorKind, FullBuffer, Session};
