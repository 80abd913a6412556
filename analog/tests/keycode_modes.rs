use analog::{
    AnalogClient,
    ClientError,
    ErrorKind,
    backend::{
        simulated::{SimulatedBackend, SimulatedConfig},
        status::Status,
    },
    client::ArgumentError,
    device::{DeviceId, DeviceInfo, DeviceType},
    keycode::{HidCode, KeycodeType, scancode},
};

fn keyboard_with(config: SimulatedConfig) -> (SimulatedBackend, DeviceId) {
    let backend = SimulatedBackend::new(config);
    let id = backend.add_device(DeviceInfo {
        vendor_id: 0x31e3,
        product_id: 0x1100,
        manufacturer_name: "Wooting".to_owned(),
        device_name: "Keyboard".to_owned(),
        device_id: DeviceId::new(7).unwrap(),
        device_type: DeviceType::Keyboard,
    });
    (backend, id)
}

#[test]
fn unsupported_modes_are_surfaced_as_invalid_arguments() {
    let (backend, id) = keyboard_with(SimulatedConfig::default());
    backend.set_analog(id, HidCode::A.code(), 0.73);

    let mut client = AnalogClient::new(backend);
    client.initialize().unwrap();
    client.set_keycode_mode(KeycodeType::Hid).unwrap();
    assert_eq!(client.read_analog(0x04, None), Ok(0.73));

    assert_eq!(
        client.set_keycode_mode(KeycodeType::VirtualKey),
        Err(ClientError::InvalidArgument(ArgumentError::Rejected(
            Status::NotAvailable
        )))
    );

    // The previous mode stays active.
    assert_eq!(client.keycode_mode(), KeycodeType::Hid);
    assert_eq!(client.read_analog(0x04, None), Ok(0.73));
}

#[test]
fn accepted_modes_change_the_meaning_of_codes() {
    let (backend, id) = keyboard_with(SimulatedConfig {
        supported_modes: KeycodeType::ALL.to_vec(),
        ..Default::default()
    });
    backend.set_analog(id, HidCode::A.code(), 0.73);

    let mut client = AnalogClient::new(backend);
    client.initialize().unwrap();

    client.set_keycode_mode(KeycodeType::ScanCode1).unwrap();
    // 0x04 is the scan code of the `3` key, which is at rest.
    assert_eq!(client.read_analog(0x04, None), Ok(0.0));
    let a = scancode::hid_to_scancode(HidCode::A.code()).unwrap();
    assert_eq!(client.read_analog(a, None), Ok(0.73));

    // Virtual keys cannot be translated without the operating system.
    client.set_keycode_mode(KeycodeType::VirtualKey).unwrap();
    let err = client.read_analog(0x41, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.status(), Some(Status::NoMapping));
}

#[test]
fn full_buffers_use_the_active_mode() {
    let (backend, id) = keyboard_with(SimulatedConfig::default());
    backend.set_analog(id, HidCode::ArrowUp.code(), 0.5);
    backend.set_analog(id, HidCode::LeftShift.code(), 1.0);

    let mut client = AnalogClient::new(backend);
    client.initialize().unwrap();
    client.set_keycode_mode(KeycodeType::ScanCode1).unwrap();

    let buffer = client.read_full_buffer(8).unwrap();
    assert_eq!(buffer.sorted(), [(0x2a, 1.0), (0xe048, 0.5)]);
}

#[test]
fn custom_keys_pass_through_every_mode() {
    let (backend, id) = keyboard_with(SimulatedConfig::default());
    backend.set_analog(id, 0x0401, 0.4);

    let mut client = AnalogClient::new(backend);
    client.initialize().unwrap();

    for mode in [KeycodeType::Hid, KeycodeType::ScanCode1] {
        client.set_keycode_mode(mode).unwrap();
        assert_eq!(client.read_analog(0x0401, None), Ok(0.4), "{mode}");
    }
}
