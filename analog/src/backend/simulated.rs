//! An in-memory [`Backend`] behaving like the analog SDK with a configurable
//! set of devices.
//!
//! [`SimulatedBackend`] is a cheap handle: clones share the same state, so a
//! test can hand one clone to a client and keep pressing keys through
//! another.
//!
//! Analog values are stored per device and per HID usage ID. Reads translate
//! between the active keycode type and HID like the SDK does, using
//! [`crate::keycode::scancode`].

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use log::{trace, warn};

use super::{Backend, DeviceEventSink, RawDeviceInfo, status::Status};
use crate::{
    device::{DeviceEvent, DeviceEventKind, DeviceId, DeviceInfo, DeviceType},
    keycode::{KeycodeType, scancode},
};

/// Determines how values of the same key on multiple devices are combined
/// when reading from all devices at once.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Aggregation {
    /// The greatest value wins. This is what the SDK does.
    #[default]
    Max,

    /// Values are summed up and capped at `1.0`.
    Sum,

    /// The device connected last wins.
    Last,
}

/// Determines which entries are kept when more keys are pressed than fit
/// into the caller's buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Truncation {
    /// Keeps the entries with the lowest keycodes.
    #[default]
    LowestCodes,

    /// Keeps the entries with the greatest analog values.
    HighestValues,
}

/// Configures a [`SimulatedBackend`].
#[derive(Clone, PartialEq, Debug)]
pub struct SimulatedConfig {
    /// The major version reported by [`Backend::version`].
    pub version: u32,

    /// Values below this threshold are treated as noise and omitted from
    /// full-buffer reads. Values of `0.0` are always omitted.
    pub threshold: f32,

    /// See [`Aggregation`].
    pub aggregation: Aggregation,

    /// See [`Truncation`].
    pub truncation: Truncation,

    /// The keycode types accepted by [`Backend::set_keycode_mode`].
    /// Other known types are rejected with [`Status::NotAvailable`].
    pub supported_modes: Vec<KeycodeType>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            version: 0,
            threshold: 0.0,
            aggregation: Aggregation::default(),
            truncation: Truncation::default(),
            // Virtual keys need the keyboard layout of the operating system.
            supported_modes: vec![KeycodeType::Hid, KeycodeType::ScanCode1],
        }
    }
}

struct SimulatedDevice {
    info: DeviceInfo,
    connected: bool,
    values: HashMap<u16, f32>,
}

struct State {
    config: SimulatedConfig,
    initialised: bool,
    mode: KeycodeType,
    devices: Vec<SimulatedDevice>,
    sink: Option<DeviceEventSink>,
    calls: usize,
    failures: VecDeque<Status>,
}

impl State {
    /// Records a backend call and pops a pending injected failure.
    fn begin_call(&mut self, name: &str) -> Option<Status> {
        trace!("simulated backend: {name}");
        self.calls += 1;
        self.failures.pop_front()
    }

    fn device_mut(&mut self, id: DeviceId) -> Option<&mut SimulatedDevice> {
        self.devices.iter_mut().find(|dev| dev.info.device_id == id)
    }

    /// Collects the connected devices addressed by a raw device ID.
    fn addressed(&self, device_id: u64) -> Vec<&SimulatedDevice> {
        self.devices
            .iter()
            .filter(|dev| dev.connected)
            .filter(|dev| device_id == DeviceId::ANY || dev.info.device_id.get() == device_id)
            .collect()
    }

    fn aggregate(&self, acc: Option<f32>, value: f32) -> f32 {
        match (acc, self.config.aggregation) {
            (None, _) | (Some(_), Aggregation::Last) => value,
            (Some(acc), Aggregation::Max) => acc.max(value),
            (Some(acc), Aggregation::Sum) => (acc + value).min(1.0),
        }
    }

    fn emit(&self, kind: DeviceEventKind, device: &DeviceInfo) {
        if !self.initialised {
            return;
        }

        if let Some(sink) = &self.sink {
            sink.emit(DeviceEvent {
                kind,
                device: device.clone(),
            });
        }
    }
}

/// An in-memory implementation of the SDK surface.
#[derive(Clone)]
pub struct SimulatedBackend {
    state: Arc<Mutex<State>>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(SimulatedConfig::default())
    }
}

impl SimulatedBackend {
    /// Creates a backend without any devices.
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                config,
                initialised: false,
                mode: KeycodeType::Hid,
                devices: Vec::new(),
                sink: None,
                calls: 0,
                failures: VecDeque::new(),
            })),
        }
    }

    /// Creates a backend with a single connected keyboard on which a few
    /// keys are partially pressed.
    pub fn demo() -> Self {
        let backend = Self::default();
        let id = backend.add_device(DeviceInfo {
            vendor_id: 0x31e3,
            product_id: 0x1100,
            manufacturer_name: "Wooting".to_owned(),
            device_name: "Simulated Keyboard".to_owned(),
            device_id: DeviceId(0x1d2c_3b4a_5968_7f01),
            device_type: DeviceType::Keyboard,
        });

        backend.set_analog(id, 0x04, 0.73);
        backend.set_analog(id, 0x1a, 0.25);
        backend.set_analog(id, 0xe1, 1.0);
        backend
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a connected device.
    ///
    /// A device with the same ID replaces the existing one.
    pub fn add_device(&self, info: DeviceInfo) -> DeviceId {
        let mut state = self.lock();
        let id = info.device_id;

        state.devices.retain(|dev| dev.info.device_id != id);
        state.emit(DeviceEventKind::Connected, &info);
        state.devices.push(SimulatedDevice {
            info,
            connected: true,
            values: HashMap::new(),
        });

        id
    }

    /// Marks a device as disconnected. Its analog values are kept.
    pub fn disconnect(&self, id: DeviceId) {
        self.set_connected(id, false, DeviceEventKind::Disconnected);
    }

    /// Marks a previously disconnected device as connected again.
    pub fn reconnect(&self, id: DeviceId) {
        self.set_connected(id, true, DeviceEventKind::Connected);
    }

    fn set_connected(&self, id: DeviceId, connected: bool, kind: DeviceEventKind) {
        let mut state = self.lock();
        let Some(device) = state.device_mut(id) else {
            warn!("simulated device {id} does not exist");
            return;
        };
        if device.connected == connected {
            return;
        }

        device.connected = connected;
        let info = device.info.clone();

        // Keep the list in connection order.
        if connected {
            if let Some(pos) = state.devices.iter().position(|dev| dev.info.device_id == id) {
                let device = state.devices.remove(pos);
                state.devices.push(device);
            }
        }

        state.emit(kind, &info);
    }

    /// Sets the analog value of a key, identified by its HID usage ID, on a
    /// device. The value is clamped to `0.0..=1.0`.
    pub fn set_analog(&self, id: DeviceId, hid_code: u16, value: f32) {
        let mut state = self.lock();
        let Some(device) = state.device_mut(id) else {
            warn!("simulated device {id} does not exist");
            return;
        };

        let value = value.clamp(0.0, 1.0);
        if value == 0.0 {
            device.values.remove(&hid_code);
        } else {
            device.values.insert(hid_code, value);
        }
    }

    /// Releases all keys of a device.
    pub fn release_all(&self, id: DeviceId) {
        if let Some(device) = self.lock().device_mut(id) {
            device.values.clear();
        }
    }

    /// Makes the next backend call return `status` instead of doing its job.
    /// Multiple injected failures are consumed in order.
    pub fn fail_next(&self, status: Status) {
        self.lock().failures.push_back(status);
    }

    /// The amount of backend calls received so far.
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }

    /// The keycode type currently active in the backend.
    pub fn keycode_mode(&self) -> KeycodeType {
        self.lock().mode
    }
}

impl Backend for SimulatedBackend {
    fn version(&self) -> i32 {
        let mut state = self.lock();
        if let Some(status) = state.begin_call("version") {
            return status.into();
        }

        i32::try_from(state.config.version).unwrap_or(i32::MAX)
    }

    fn initialise(&mut self) -> i32 {
        let mut state = self.lock();
        if let Some(status) = state.begin_call("initialise") {
            return status.into();
        }

        state.initialised = true;
        match state.addressed(DeviceId::ANY).len() {
            0 => Status::NoDevices.into(),
            count => i32::try_from(count).unwrap_or(i32::MAX),
        }
    }

    fn is_initialised(&self) -> bool {
        self.lock().initialised
    }

    fn uninitialise(&mut self) -> i32 {
        let mut state = self.lock();
        if let Some(status) = state.begin_call("uninitialise") {
            return status.into();
        }

        state.initialised = false;
        state.sink = None;
        Status::Ok.into()
    }

    fn set_keycode_mode(&mut self, mode: u32) -> i32 {
        let mut state = self.lock();
        if let Some(status) = state.begin_call("set_keycode_mode") {
            return status.into();
        }
        if !state.initialised {
            return Status::UnInitialized.into();
        }

        let Ok(mode) = KeycodeType::try_from(mode) else {
            return Status::InvalidArgument.into();
        };
        if !state.config.supported_modes.contains(&mode) {
            return Status::NotAvailable.into();
        }

        state.mode = mode;
        Status::Ok.into()
    }

    fn read_analog_device(&self, code: u16, device_id: u64) -> f32 {
        let mut state = self.lock();
        if let Some(status) = state.begin_call("read_analog_device") {
            return status.to_analog();
        }
        if !state.initialised {
            return Status::UnInitialized.to_analog();
        }

        let Some(hid_code) = scancode::code_to_hid(code, state.mode) else {
            return Status::NoMapping.to_analog();
        };

        let devices = state.addressed(device_id);
        if devices.is_empty() {
            return Status::NoDevices.to_analog();
        }

        devices
            .iter()
            .map(|dev| dev.values.get(&hid_code).copied().unwrap_or(0.0))
            .fold(None, |acc, value| Some(state.aggregate(acc, value)))
            .unwrap_or(0.0)
    }

    fn get_connected_devices_info(&self, buffer: &mut [RawDeviceInfo]) -> i32 {
        let mut state = self.lock();
        if let Some(status) = state.begin_call("get_connected_devices_info") {
            return status.into();
        }
        if !state.initialised {
            return Status::UnInitialized.into();
        }

        let devices = state.addressed(DeviceId::ANY);
        let count = devices.len().min(buffer.len());
        for (slot, dev) in buffer.iter_mut().zip(devices) {
            *slot = RawDeviceInfo::from(dev.info.clone());
        }

        i32::try_from(count).unwrap_or(i32::MAX)
    }

    fn read_full_buffer_device(
        &self,
        code_buffer: &mut [u16],
        analog_buffer: &mut [f32],
        device_id: u64,
    ) -> i32 {
        let mut state = self.lock();
        if let Some(status) = state.begin_call("read_full_buffer_device") {
            return status.into();
        }
        if !state.initialised {
            return Status::UnInitialized.into();
        }

        let devices = state.addressed(device_id);
        if devices.is_empty() {
            return Status::NoDevices.into();
        }

        let mut merged = HashMap::<u16, f32>::new();
        for dev in devices {
            for (&hid_code, &value) in &dev.values {
                if value <= 0.0 || value < state.config.threshold {
                    continue;
                }
                let Some(code) = scancode::hid_to_code(hid_code, state.mode) else {
                    warn!("no {} mapping for HID code {:#04x}", state.mode, hid_code);
                    continue;
                };

                let acc = merged.get(&code).copied();
                merged.insert(code, state.aggregate(acc, value));
            }
        }

        let mut entries: Vec<(u16, f32)> = merged.into_iter().collect();
        match state.config.truncation {
            Truncation::LowestCodes => entries.sort_by_key(|&(code, _)| code),
            Truncation::HighestValues => {
                entries.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)))
            },
        }

        let capacity = code_buffer.len().min(analog_buffer.len());
        entries.truncate(capacity);
        for (i, (code, value)) in entries.iter().copied().enumerate() {
            code_buffer[i] = code;
            analog_buffer[i] = value;
        }

        i32::try_from(entries.len()).unwrap_or(i32::MAX)
    }

    fn set_device_event_sink(&mut self, sink: Option<DeviceEventSink>) -> i32 {
        let mut state = self.lock();
        if let Some(status) = state.begin_call("set_device_event_sink") {
            return status.into();
        }
        if !state.initialised {
            return Status::UnInitialized.into();
        }

        state.sink = sink;
        Status::Ok.into()
    }
}
