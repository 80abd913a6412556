//! Implements the caller-facing client on top of a [`Backend`].

use std::{collections::HashMap, ops::Deref, sync::Arc};

use log::{debug, trace, warn};
use thiserror::Error;

use crate::{
    backend::{
        Backend,
        DeviceEventSink,
        RawDeviceInfo,
        status::{Status, StatusCode},
    },
    device::{DeviceEvent, DeviceId, DeviceInfo},
    event::EventEmitter,
    keycode::KeycodeType,
};

/// More entries than there are distinct keycodes never fit into a result,
/// so buffers passed to the backend are capped at this length.
const BUFFER_LIMIT: usize = u16::MAX as usize + 1;

/// Represents whether the connection to the backend is open.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Session {
    #[default]
    Uninitialized,
    Initialized,
}

/// Classifies a [`ClientError`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorKind {
    NotInitialized,
    InvalidArgument,
    NoDevices,
    BackendUnavailable,
    Unknown,
}

/// Describes why an argument was refused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Error)]
pub enum ArgumentError {
    /// The argument was refused before reaching the backend.
    #[error("{0}")]
    Local(&'static str),

    /// The backend refused the argument.
    #[error("rejected by the SDK with status {0:?}")]
    Rejected(Status),
}

/// Represents an error returned by [`AnalogClient`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Error)]
pub enum ClientError {
    /// Indicates that the session is not initialized.
    #[error("the analog SDK has not been initialised")]
    NotInitialized,

    /// Indicates that a parameter is out of its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(ArgumentError),

    /// Indicates that no connected device matches the request.
    #[error("no matching device is connected")]
    NoDevices,

    /// Indicates a driver-level failure of the backend.
    #[error("the analog SDK is unavailable ({0:?})")]
    BackendUnavailable(Status),

    /// Indicates a status code that has no meaning in this context.
    #[error("the analog SDK returned unexpected status {0}")]
    Unknown(i32),
}

impl ClientError {
    /// The kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NoDevices => ErrorKind::NoDevices,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// The backend status the error originates from, if any.
    ///
    /// [`Self::NotInitialized`] carries no status, as the client detects a
    /// closed session itself.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::NotInitialized => None,
            Self::InvalidArgument(ArgumentError::Rejected(status)) => Some(*status),
            Self::InvalidArgument(ArgumentError::Local(_)) => None,
            Self::NoDevices => Some(Status::NoDevices),
            Self::BackendUnavailable(status) => Some(*status),
            Self::Unknown(raw) => Status::try_from(*raw).ok(),
        }
    }

    /// Checks whether retrying the same call later may succeed.
    ///
    /// This is the case when devices are missing or were disconnected, as
    /// they may be plugged in again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NoDevices | Self::BackendUnavailable(Status::DeviceDisconnected)
        )
    }

    fn local(reason: &'static str) -> Self {
        Self::InvalidArgument(ArgumentError::Local(reason))
    }
}

impl From<StatusCode> for ClientError {
    fn from(code: StatusCode) -> Self {
        let status = match code {
            StatusCode::Known(status) => status,
            StatusCode::Unknown(raw) => return Self::Unknown(raw),
        };

        match status {
            Status::UnInitialized => Self::NotInitialized,
            Status::InvalidArgument | Status::NoMapping | Status::NotAvailable => {
                Self::InvalidArgument(ArgumentError::Rejected(status))
            },
            Status::NoDevices => Self::NoDevices,
            Status::DeviceDisconnected
            | Status::Failure
            | Status::NoPlugins
            | Status::FunctionNotFound
            | Status::IncompatibleVersion
            | Status::DllNotFound => Self::BackendUnavailable(status),
            Status::Ok => Self::Unknown(status.into()),
        }
    }
}

/// The analog values of all actuated keys, keyed by keycode.
///
/// Keys at rest are not contained. The iteration order is unspecified, use
/// [`Self::sorted`] for a deterministic order.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FullBuffer(HashMap<u16, f32>);

impl FullBuffer {
    /// The entries ordered by keycode.
    pub fn sorted(&self) -> Vec<(u16, f32)> {
        let mut entries: Vec<(u16, f32)> = self
            .0
            .iter()
            .map(|(&code, &value)| (code, value))
            .collect();
        entries.sort_by_key(|&(code, _)| code);
        entries
    }
}

impl Deref for FullBuffer {
    type Target = HashMap<u16, f32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Validates a caller-supplied buffer length.
fn buffer_len(requested: usize, name: &'static str) -> Result<usize, ClientError> {
    if requested == 0 {
        return Err(ClientError::local(name));
    }

    Ok(requested.min(BUFFER_LIMIT))
}

/// Clamps a reported count to the capacity of the buffer it describes.
fn filled(count: u32, capacity: usize, what: &str) -> usize {
    let count = count as usize;
    if count > capacity {
        warn!("backend reported {count} {what} for a buffer of {capacity}");
        return capacity;
    }

    count
}

fn clamp_reading(code: u16, value: f32) -> f32 {
    if value > 1.0 {
        warn!("backend reported analog value {value} for key {code:#06x}");
        return 1.0;
    }

    value
}

/// A handle over one connection to an analog SDK backend.
///
/// All queries require an initialized session and fail with
/// [`ClientError::NotInitialized`] otherwise, without reaching the backend.
/// Nothing is retried; see [`crate::poll::Backoff`] for polling loops.
///
/// Dropping the client uninitializes the session.
pub struct AnalogClient<B: Backend> {
    backend: B,
    session: Session,
    mode: KeycodeType,
    events: Option<DeviceEventSink>,
}

impl<B: Backend> AnalogClient<B> {
    /// Creates an uninitialized client.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            session: Session::Uninitialized,
            mode: KeycodeType::default(),
            events: None,
        }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn is_initialized(&self) -> bool {
        self.session == Session::Initialized
    }

    /// The keycode type last accepted by the backend.
    pub fn keycode_mode(&self) -> KeycodeType {
        self.mode
    }

    fn ensure_initialized(&self) -> Result<(), ClientError> {
        match self.session {
            Session::Initialized => Ok(()),
            Session::Uninitialized => Err(ClientError::NotInitialized),
        }
    }

    /// Queries the major version of the backend. Allowed in any state.
    pub fn backend_version(&self) -> Result<u32, ClientError> {
        trace!("querying backend version");
        Ok(Status::from_count(self.backend.version())?)
    }

    /// Opens the session.
    ///
    /// Returns the amount of devices found. If the backend fails but stays
    /// initialised, as it does when no device is connected yet, the session
    /// is open and the error is returned anyway.
    pub fn initialize(&mut self) -> Result<u32, ClientError> {
        trace!("initialising backend");
        let ret = self.backend.initialise();

        let session = if self.backend.is_initialised() {
            Session::Initialized
        } else {
            Session::Uninitialized
        };
        if session != self.session {
            debug!("session {:?} -> {:?}", self.session, session);
            self.session = session;
        }

        let count = Status::from_count(ret)?;
        debug!("backend found {count} devices");
        Ok(count)
    }

    /// Closes the session. Does nothing if it is not open.
    ///
    /// A failure of the backend is logged, the session is closed regardless.
    pub fn uninitialize(&mut self) {
        if self.session == Session::Uninitialized {
            return;
        }

        trace!("uninitialising backend");
        self.events = None;
        if let Err(code) = Status::from_plain(self.backend.uninitialise()) {
            warn!("backend failed to uninitialise: {code:?}");
        }

        debug!("session {:?} -> {:?}", self.session, Session::Uninitialized);
        self.session = Session::Uninitialized;
    }

    /// Lists up to `max_count` connected devices.
    ///
    /// Records the backend reports without a device ID are skipped.
    pub fn get_connected_devices_info(
        &self,
        max_count: usize,
    ) -> Result<Vec<DeviceInfo>, ClientError> {
        self.ensure_initialized()?;
        let len = buffer_len(max_count, "max_count must be positive")?;

        trace!("enumerating up to {len} devices");
        let mut buffer = vec![RawDeviceInfo::default(); len];
        let count = Status::from_count(self.backend.get_connected_devices_info(&mut buffer))?;
        buffer.truncate(filled(count, len, "devices"));

        Ok(buffer
            .into_iter()
            .filter_map(RawDeviceInfo::into_device_info)
            .collect())
    }

    /// Switches the keycode type used by all following reads.
    pub fn set_keycode_mode(&mut self, mode: KeycodeType) -> Result<(), ClientError> {
        self.ensure_initialized()?;

        trace!("setting keycode mode {mode}");
        Status::from_plain(self.backend.set_keycode_mode(mode.into()))?;

        debug!("keycode mode {} -> {}", self.mode, mode);
        self.mode = mode;
        Ok(())
    }

    /// Reads the analog value of a single key.
    ///
    /// `code` is interpreted according to the active keycode type. Without a
    /// device, the values of all connected devices are combined by the
    /// backend. A key at rest reads `0.0`.
    pub fn read_analog(&self, code: u16, device: Option<DeviceId>) -> Result<f32, ClientError> {
        self.ensure_initialized()?;

        trace!("reading key {code:#06x}");
        let raw = self
            .backend
            .read_analog_device(code, DeviceId::to_raw(device));

        Ok(clamp_reading(code, Status::from_analog(raw)?))
    }

    /// Reads all actuated keys of all connected devices, at most
    /// `max_entries` of them.
    ///
    /// Which entries are dropped when more keys are actuated is up to the
    /// backend.
    pub fn read_full_buffer(&self, max_entries: usize) -> Result<FullBuffer, ClientError> {
        self.read_full_buffer_device(max_entries, None)
    }

    /// Like [`Self::read_full_buffer`], restricted to a single device when
    /// one is given.
    pub fn read_full_buffer_device(
        &self,
        max_entries: usize,
        device: Option<DeviceId>,
    ) -> Result<FullBuffer, ClientError> {
        self.ensure_initialized()?;
        let len = buffer_len(max_entries, "max_entries must be positive")?;

        trace!("reading up to {len} keys");
        let mut codes = vec![0u16; len];
        let mut values = vec![0f32; len];
        let count = Status::from_count(self.backend.read_full_buffer_device(
            &mut codes,
            &mut values,
            DeviceId::to_raw(device),
        ))?;
        let count = filled(count, len, "keys");

        let mut buffer = HashMap::with_capacity(count);
        for (&code, &value) in codes.iter().zip(&values).take(count) {
            // Released keys are reported once with a value of zero.
            if value.is_nan() || value <= 0.0 {
                continue;
            }

            let value = clamp_reading(code, value);
            buffer
                .entry(code)
                .and_modify(|acc: &mut f32| *acc = acc.max(value))
                .or_insert(value);
        }

        Ok(FullBuffer(buffer))
    }

    /// Subscribes to device connection events.
    ///
    /// The subscription ends when the session is closed.
    pub fn device_events(&mut self) -> Result<flume::Receiver<DeviceEvent>, ClientError> {
        self.ensure_initialized()?;

        if let Some(sink) = &self.events {
            return Ok(sink.create_receiver());
        }

        trace!("registering device event sink");
        let sink: DeviceEventSink = Arc::new(EventEmitter::new());
        Status::from_plain(self.backend.set_device_event_sink(Some(Arc::clone(&sink))))?;

        let receiver = sink.create_receiver();
        self.events = Some(sink);
        Ok(receiver)
    }
}

impl<B: Backend> Drop for AnalogClient<B> {
    fn drop(&mut self) {
        self.uninitialize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::simulated::SimulatedBackend;

    #[test]
    fn statuses_map_to_exactly_one_kind() {
        let cases = [
            (Status::UnInitialized, ErrorKind::NotInitialized),
            (Status::NoDevices, ErrorKind::NoDevices),
            (Status::DeviceDisconnected, ErrorKind::BackendUnavailable),
            (Status::Failure, ErrorKind::BackendUnavailable),
            (Status::InvalidArgument, ErrorKind::InvalidArgument),
            (Status::NoPlugins, ErrorKind::BackendUnavailable),
            (Status::FunctionNotFound, ErrorKind::BackendUnavailable),
            (Status::NoMapping, ErrorKind::InvalidArgument),
            (Status::NotAvailable, ErrorKind::InvalidArgument),
            (Status::IncompatibleVersion, ErrorKind::BackendUnavailable),
            (Status::DllNotFound, ErrorKind::BackendUnavailable),
            (Status::Ok, ErrorKind::Unknown),
        ];

        for (status, kind) in cases {
            let err = ClientError::from(StatusCode::Known(status));
            assert_eq!(err.kind(), kind, "{status:?}");
            if kind != ErrorKind::NotInitialized {
                assert_eq!(err.status(), Some(status));
            }
        }

        assert_eq!(
            ClientError::from(StatusCode::Unknown(-7)),
            ClientError::Unknown(-7)
        );
    }

    #[test]
    fn locally_detected_errors_carry_no_status() {
        let client = AnalogClient::new(SimulatedBackend::demo());
        let err = client.read_analog(0x04, None).unwrap_err();

        assert_eq!(err, ClientError::NotInitialized);
        assert_eq!(err.status(), None);
        assert_eq!(ClientError::local("max_count").status(), None);
    }

    #[test]
    fn transient_errors() {
        assert!(ClientError::NoDevices.is_transient());
        assert!(ClientError::BackendUnavailable(Status::DeviceDisconnected).is_transient());
        assert!(!ClientError::BackendUnavailable(Status::DllNotFound).is_transient());
        assert!(!ClientError::NotInitialized.is_transient());
    }

    #[test]
    fn full_buffer_sorts_by_code() {
        let buffer = FullBuffer(HashMap::from([(0x1a, 0.2), (0x04, 0.5), (0xe1, 1.0)]));
        assert_eq!(buffer.sorted(), [(0x04, 0.5), (0x1a, 0.2), (0xe1, 1.0)]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn zero_lengths_are_refused_locally() {
        let backend = SimulatedBackend::demo();
        let mut client = AnalogClient::new(backend.clone());
        client.initialize().unwrap();
        let calls = backend.call_count();

        assert_eq!(
            client.read_full_buffer(0).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(backend.call_count(), calls);
    }

    #[test]
    fn uninitialize_is_a_no_op_when_closed() {
        let backend = SimulatedBackend::demo();
        let mut client = AnalogClient::new(backend.clone());

        client.uninitialize();
        assert_eq!(backend.call_count(), 0);
        assert_eq!(client.session(), Session::Uninitialized);
    }

    #[test]
    fn failed_uninitialise_still_closes_the_session() {
        let backend = SimulatedBackend::demo();
        let mut client = AnalogClient::new(backend.clone());
        client.initialize().unwrap();

        backend.fail_next(Status::Failure);
        client.uninitialize();
        assert!(!client.is_initialized());
    }

    #[test]
    fn dropping_the_client_uninitialises_the_backend() {
        let backend = SimulatedBackend::demo();
        let mut client = AnalogClient::new(backend.clone());
        client.initialize().unwrap();
        assert!(backend.is_initialised());

        drop(client);
        assert!(!backend.is_initialised());
    }

    /// Replays fixed raw results, like an SDK reporting odd values.
    #[derive(Default)]
    struct ReplayBackend {
        analog: f32,
        entries: Vec<(u16, f32)>,
        reported_count: i32,
    }

    impl Backend for ReplayBackend {
        fn version(&self) -> i32 {
            1
        }

        fn initialise(&mut self) -> i32 {
            1
        }

        fn is_initialised(&self) -> bool {
            true
        }

        fn uninitialise(&mut self) -> i32 {
            Status::Ok.into()
        }

        fn set_keycode_mode(&mut self, _mode: u32) -> i32 {
            Status::Ok.into()
        }

        fn read_analog_device(&self, _code: u16, _device_id: u64) -> f32 {
            self.analog
        }

        fn get_connected_devices_info(&self, _buffer: &mut [RawDeviceInfo]) -> i32 {
            0
        }

        fn read_full_buffer_device(
            &self,
            code_buffer: &mut [u16],
            analog_buffer: &mut [f32],
            _device_id: u64,
        ) -> i32 {
            let pairs = code_buffer.iter_mut().zip(analog_buffer.iter_mut());
            for ((code, value), &(c, v)) in pairs.zip(&self.entries) {
                *code = c;
                *value = v;
            }
            self.reported_count
        }

        fn set_device_event_sink(&mut self, _sink: Option<DeviceEventSink>) -> i32 {
            Status::Ok.into()
        }
    }

    fn replay(backend: ReplayBackend) -> AnalogClient<ReplayBackend> {
        let mut client = AnalogClient::new(backend);
        client.initialize().unwrap();
        client
    }

    #[test]
    fn full_buffer_drops_released_and_invalid_entries() {
        let client = replay(ReplayBackend {
            entries: vec![
                (0x04, 0.5),
                (0x05, 0.0),
                (0x06, f32::NAN),
                (0x07, -0.25),
                (0x08, 1.5),
                (0x04, 0.8),
            ],
            reported_count: 6,
            ..Default::default()
        });

        let buffer = client.read_full_buffer(6).unwrap();
        assert_eq!(buffer.sorted(), [(0x04, 0.8), (0x08, 1.0)]);
    }

    #[test]
    fn full_buffer_ignores_counts_beyond_the_buffer() {
        let client = replay(ReplayBackend {
            entries: vec![(0x04, 0.5), (0x05, 0.6), (0x06, 0.7)],
            reported_count: 40,
            ..Default::default()
        });

        let buffer = client.read_full_buffer(2).unwrap();
        assert_eq!(buffer.sorted(), [(0x04, 0.5), (0x05, 0.6)]);
    }

    #[test]
    fn readings_above_full_actuation_are_clamped() {
        let client = replay(ReplayBackend {
            analog: 3.0,
            ..Default::default()
        });
        assert_eq!(client.read_analog(0x04, None), Ok(1.0));

        let client = replay(ReplayBackend {
            analog: f32::NAN,
            ..Default::default()
        });
        assert_eq!(client.read_analog(0x04, None), Err(ClientError::Unknown(0)));
    }
}
