use std::collections::HashMap;

use analog::{
    AnalogClient,
    ErrorKind,
    backend::simulated::{Aggregation, SimulatedBackend, SimulatedConfig, Truncation},
    device::{DeviceId, DeviceInfo, DeviceType},
    keycode::HidCode,
};
use proptest::prelude::*;

fn device(id: u64) -> DeviceInfo {
    DeviceInfo {
        vendor_id: 0x31e3,
        product_id: 0x1200,
        manufacturer_name: "Wooting".to_owned(),
        device_name: format!("Device {id}"),
        device_id: DeviceId::new(id).unwrap(),
        device_type: DeviceType::Keyboard,
    }
}

fn aggregation() -> impl Strategy<Value = Aggregation> {
    prop_oneof![
        Just(Aggregation::Max),
        Just(Aggregation::Sum),
        Just(Aggregation::Last),
    ]
}

fn truncation() -> impl Strategy<Value = Truncation> {
    prop_oneof![Just(Truncation::LowestCodes), Just(Truncation::HighestValues)]
}

/// Analog values per device, with a good share of keys at rest.
fn snapshots() -> impl Strategy<Value = Vec<HashMap<u16, f32>>> {
    let value = prop_oneof![Just(0.0f32), 0.0f32..=1.0];
    prop::collection::vec(
        prop::collection::hash_map(0x04u16..=0xe7, value, 0..24),
        1..4,
    )
}

proptest! {
    #[test]
    fn zero_device_counts_never_reach_the_backend(extra_devices in 0u64..4) {
        let backend = SimulatedBackend::demo();
        for id in 1..=extra_devices {
            backend.add_device(device(id));
        }
        let mut client = AnalogClient::new(backend.clone());
        client.initialize().unwrap();

        let calls = backend.call_count();
        let err = client.get_connected_devices_info(0).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        prop_assert_eq!(backend.call_count(), calls);
    }

    #[test]
    fn device_lists_respect_the_limit(devices in 0u64..10, max_count in 1usize..12) {
        let backend = SimulatedBackend::default();
        for id in 1..=devices {
            backend.add_device(device(id));
        }
        let mut client = AnalogClient::new(backend);
        let _ = client.initialize();

        let listed = client.get_connected_devices_info(max_count).unwrap();
        prop_assert_eq!(listed.len() as u64, devices.min(max_count as u64));
    }

    #[test]
    fn full_buffers_hold_no_phantom_keys(
        snapshots in snapshots(),
        max_entries in 1usize..32,
        aggregation in aggregation(),
        truncation in truncation(),
    ) {
        let backend = SimulatedBackend::new(SimulatedConfig {
            aggregation,
            truncation,
            ..Default::default()
        });
        for (i, values) in snapshots.iter().enumerate() {
            let id = backend.add_device(device(i as u64 + 1));
            for (&code, &value) in values {
                backend.set_analog(id, code, value);
            }
        }
        let mut client = AnalogClient::new(backend);
        client.initialize().unwrap();

        let buffer = client.read_full_buffer(max_entries).unwrap();
        prop_assert!(buffer.len() <= max_entries);
        for (code, &value) in buffer.iter() {
            prop_assert!(value > 0.0 && value <= 1.0);
            let actuated = snapshots
                .iter()
                .any(|values| values.get(code).is_some_and(|&v| v > 0.0));
            prop_assert!(actuated, "phantom key {:#04x}", code);
        }
    }

    #[test]
    fn readings_stay_in_range(
        snapshots in snapshots(),
        code in 0x00u16..=0xff,
        aggregation in aggregation(),
    ) {
        let backend = SimulatedBackend::new(SimulatedConfig {
            aggregation,
            ..Default::default()
        });
        for (i, values) in snapshots.iter().enumerate() {
            let id = backend.add_device(device(i as u64 + 1));
            for (&code, &value) in values {
                backend.set_analog(id, code, value);
            }
        }
        let mut client = AnalogClient::new(backend);
        client.initialize().unwrap();

        let value = client.read_analog(code, None).unwrap();
        prop_assert!((0.0..=1.0).contains(&value));
    }
}

#[test]
fn every_named_hid_code_is_accepted() {
    let mut client = AnalogClient::new(SimulatedBackend::demo());
    client.initialize().unwrap();

    for code in HidCode::ALL {
        let result = client.read_analog(code.code(), None);
        assert!(result.is_ok(), "{code}: {result:?}");
    }
}
