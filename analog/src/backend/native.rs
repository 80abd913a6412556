//! Binds the vendor's `wooting_analog_wrapper` library.
//!
//! The library keeps its state in globals, so only one [`NativeBackend`] may
//! exist per process. [`NativeBackend::claim`] enforces this.

use std::{
    ffi::{CStr, c_char, c_float, c_int, c_uint, c_ushort},
    ptr,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use lazy_static::lazy_static;
use log::{debug, warn};

use super::{Backend, DeviceEventSink, RawDeviceInfo, status::Status};
use crate::device::{DeviceEvent, DeviceEventKind};

/// Mirrors the device record laid out by the library.
#[repr(C)]
struct DeviceInfoFfi {
    vendor_id: c_ushort,
    product_id: c_ushort,
    manufacturer_name: *mut c_char,
    device_name: *mut c_char,
    device_id: u64,
    device_type: c_int,
}

type DeviceEventCallback = extern "C" fn(c_int, *mut DeviceInfoFfi);

#[link(name = "wooting_analog_wrapper")]
unsafe extern "C" {
    fn wooting_analog_version() -> c_int;
    fn wooting_analog_initialise() -> c_int;
    fn wooting_analog_is_initialised() -> bool;
    fn wooting_analog_uninitialise() -> c_int;
    fn wooting_analog_set_keycode_mode(mode: c_uint) -> c_int;
    fn wooting_analog_read_analog_device(code: c_ushort, device_id: u64) -> c_float;
    fn wooting_analog_set_device_event_cb(cb: DeviceEventCallback) -> c_int;
    fn wooting_analog_clear_device_event_cb() -> c_int;
    fn wooting_analog_get_connected_devices_info(
        buffer: *mut *mut DeviceInfoFfi,
        len: c_uint,
    ) -> c_int;
    fn wooting_analog_read_full_buffer_device(
        code_buffer: *mut c_ushort,
        analog_buffer: *mut c_float,
        len: c_uint,
        device_id: u64,
    ) -> c_int;
}

static CLAIMED: AtomicBool = AtomicBool::new(false);

lazy_static! {
    static ref EVENT_SINK: Mutex<Option<DeviceEventSink>> = Mutex::new(None);
}

/// Copies a string owned by the library.
///
/// # Safety
///
/// `raw` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn copy_string(raw: *const c_char) -> String {
    if raw.is_null() {
        return String::new();
    }

    unsafe { CStr::from_ptr(raw) }
        .to_string_lossy()
        .into_owned()
}

/// Copies a device record owned by the library.
///
/// # Safety
///
/// `raw` must be null or point to a valid record whose strings satisfy the
/// requirements of [`copy_string`].
unsafe fn copy_device(raw: *const DeviceInfoFfi) -> Option<RawDeviceInfo> {
    let raw = unsafe { raw.as_ref() }?;

    Some(RawDeviceInfo {
        vendor_id: raw.vendor_id,
        product_id: raw.product_id,
        manufacturer_name: unsafe { copy_string(raw.manufacturer_name) },
        device_name: unsafe { copy_string(raw.device_name) },
        device_id: raw.device_id,
        device_type: raw.device_type,
    })
}

/// Runs on the library's event thread.
extern "C" fn on_device_event(kind: c_int, device: *mut DeviceInfoFfi) {
    let Ok(kind) = DeviceEventKind::try_from(kind) else {
        warn!("ignoring device event of unknown kind {kind}");
        return;
    };

    // The record is freed by the library once the callback returns.
    let Some(device) = (unsafe { copy_device(device) }).and_then(RawDeviceInfo::into_device_info)
    else {
        return;
    };

    let sink = EVENT_SINK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(sink) = sink.as_ref() {
        sink.emit(DeviceEvent { kind, device });
    }
}

fn buffer_len(len: usize) -> c_uint {
    c_uint::try_from(len).unwrap_or(c_uint::MAX)
}

/// The SDK installed on the system.
#[derive(Debug)]
pub struct NativeBackend {
    _private: (),
}

impl NativeBackend {
    /// Claims the library for this process.
    ///
    /// Returns [`None`] while another instance exists.
    pub fn claim() -> Option<Self> {
        CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        debug!("claimed the native analog SDK");
        Some(Self { _private: () })
    }

    fn replace_sink(sink: Option<DeviceEventSink>) {
        *EVENT_SINK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = sink;
    }
}

impl Drop for NativeBackend {
    fn drop(&mut self) {
        Self::replace_sink(None);
        CLAIMED.store(false, Ordering::Release);
    }
}

impl Backend for NativeBackend {
    fn version(&self) -> i32 {
        unsafe { wooting_analog_version() }
    }

    fn initialise(&mut self) -> i32 {
        unsafe { wooting_analog_initialise() }
    }

    fn is_initialised(&self) -> bool {
        unsafe { wooting_analog_is_initialised() }
    }

    fn uninitialise(&mut self) -> i32 {
        Self::replace_sink(None);
        unsafe { wooting_analog_uninitialise() }
    }

    fn set_keycode_mode(&mut self, mode: u32) -> i32 {
        unsafe { wooting_analog_set_keycode_mode(mode) }
    }

    fn read_analog_device(&self, code: u16, device_id: u64) -> f32 {
        unsafe { wooting_analog_read_analog_device(code, device_id) }
    }

    fn get_connected_devices_info(&self, buffer: &mut [RawDeviceInfo]) -> i32 {
        let mut pointers: Vec<*mut DeviceInfoFfi> = vec![ptr::null_mut(); buffer.len()];
        let ret = unsafe {
            wooting_analog_get_connected_devices_info(
                pointers.as_mut_ptr(),
                buffer_len(pointers.len()),
            )
        };
        let Ok(filled) = usize::try_from(ret) else {
            return ret;
        };

        // The records stay valid until the next enumeration on this thread.
        let mut written = 0;
        for (slot, &pointer) in buffer.iter_mut().zip(pointers.iter().take(filled)) {
            match unsafe { copy_device(pointer) } {
                Some(device) => {
                    *slot = device;
                    written += 1;
                },
                None => warn!("library returned a null device record"),
            }
        }

        i32::try_from(written).unwrap_or(i32::MAX)
    }

    fn read_full_buffer_device(
        &self,
        code_buffer: &mut [u16],
        analog_buffer: &mut [f32],
        device_id: u64,
    ) -> i32 {
        let len = code_buffer.len().min(analog_buffer.len());
        unsafe {
            wooting_analog_read_full_buffer_device(
                code_buffer.as_mut_ptr(),
                analog_buffer.as_mut_ptr(),
                buffer_len(len),
                device_id,
            )
        }
    }

    fn set_device_event_sink(&mut self, sink: Option<DeviceEventSink>) -> i32 {
        match sink {
            Some(sink) => {
                Self::replace_sink(Some(sink));
                let ret = unsafe { wooting_analog_set_device_event_cb(on_device_event) };
                if ret != i32::from(Status::Ok) {
                    Self::replace_sink(None);
                }
                ret
            },
            None => {
                Self::replace_sink(None);
                unsafe { wooting_analog_clear_device_event_cb() }
            },
        }
    }
}
