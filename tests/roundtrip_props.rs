//! Property-based tests for the codec and the Actisense line format.

use chrono::{DateTime, TimeZone, Utc};
use empirbus_rs::nxt::channels::{ratio_to_raw, raw_to_ratio};
use empirbus_rs::nxt::frame::{decode, encode, ModuleState};
use empirbus_rs::SerialLine;
use proptest::prelude::*;

fn module_state() -> impl Strategy<Value = ModuleState> {
    (0u8..=49, 0u16..=1000, 0u16..=1000, any::<[bool; 8]>()).prop_map(
        |(instance, d0, d1, switches)| ModuleState {
            instance,
            dimmers: [d0, d1],
            switches,
        },
    )
}

fn well_formed_payload() -> impl Strategy<Value = [u8; 8]> {
    (0u8..=49, 0u16..=1000, 0u16..=1000, any::<u8>()).prop_map(|(instance, d0, d1, bits)| {
        let [d0_lo, d0_hi] = d0.to_le_bytes();
        let [d1_lo, d1_hi] = d1.to_le_bytes();
        [0x30, 0x99, instance, d0_lo, d0_hi, d1_lo, d1_hi, bits]
    })
}

fn nanosecond_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800_000_000_000).prop_map(|ns| Utc.timestamp_nanos(ns))
}

proptest! {
    #[test]
    fn prop_state_roundtrip(state in module_state()) {
        let payload = encode(&state).unwrap();
        prop_assert_eq!(decode(&payload).unwrap(), state);
    }

    #[test]
    fn prop_payload_roundtrip(payload in well_formed_payload()) {
        let state = decode(&payload).unwrap();
        prop_assert_eq!(encode(&state).unwrap(), payload);
    }

    #[test]
    fn prop_ratio_roundtrip(raw in 0u16..=1000) {
        prop_assert_eq!(ratio_to_raw(0, raw_to_ratio(raw)).unwrap(), raw);
    }

    #[test]
    fn prop_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..16)) {
        let result = decode(&data);
        if data.len() != 8 {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn prop_serial_line_roundtrip(
        pgn in 0u32..=0x1FFFF,
        source in any::<u8>(),
        destination in any::<u8>(),
        data in proptest::collection::vec(any::<u8>(), 0..=255),
        timestamp in nanosecond_timestamp(),
    ) {
        let line = SerialLine::new(pgn, &data, source, Some(destination), timestamp).unwrap();
        let text = line.to_string();
        prop_assert_eq!(SerialLine::parse(&text).unwrap(), line);
    }
}
