//! Integration tests for the bridge: inbound filtering and publishing,
//! outbound command merging, and the line listener.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use empirbus_rs::bridge::listener::MAX_LINE_BYTES;
use empirbus_rs::bridge::{
    run_listener, Bridge, ChannelValue, Command, InboundMessage, InboundOutcome, RawData,
};
use empirbus_rs::error::EmpirBusError;
use empirbus_rs::nxt::frame::decode;
use empirbus_rs::{BridgeConfig, FrameTransport, SerialLine, SwitchState, UnknownInstancePolicy};
use tokio::io::BufReader;
use tokio::sync::mpsc;

/// Transport that records every line, optionally refusing them.
#[derive(Clone, Default)]
struct RecordingTransport {
    lines: Arc<Mutex<Vec<String>>>,
    refuse: bool,
}

impl RecordingTransport {
    fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl FrameTransport for RecordingTransport {
    async fn send_line(&self, line: &str) -> Result<(), EmpirBusError> {
        if self.refuse {
            return Err(EmpirBusError::SerialPortError("gateway offline".into()));
        }
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

fn bridge_with(policy: UnknownInstancePolicy) -> (Bridge<RecordingTransport>, RecordingTransport) {
    let transport = RecordingTransport::default();
    let config = BridgeConfig {
        unknown_instance: policy,
        ..BridgeConfig::default()
    };
    (Bridge::new(config, transport.clone()).unwrap(), transport)
}

fn empirbus_message(payload: Vec<u8>) -> InboundMessage {
    InboundMessage {
        pgn: 65280,
        manufacturer_code: Some(304),
        source: 12,
        data: RawData::Bytes(payload),
    }
}

fn payload_of(line: &str) -> Vec<u8> {
    SerialLine::parse(line).unwrap().data
}

#[tokio::test]
async fn test_inbound_publishes_every_channel() {
    let (bridge, _) = bridge_with(UnknownInstancePolicy::Reject);
    let msg = empirbus_message(vec![0x30, 0x99, 0x07, 0xF4, 0x01, 0x00, 0x00, 0x05]);

    let update = bridge.handle_inbound(&msg).await.into_update().unwrap();
    assert_eq!(update.values.len(), 10);

    let path = |kind: &str, i: usize| format!("electrical.empirBusNxt.7.{kind}.{i}.state");
    assert_eq!(update.get(&path("dimmers", 0)), Some(&ChannelValue::Ratio(0.5)));
    assert_eq!(update.get(&path("dimmers", 1)), Some(&ChannelValue::Ratio(0.0)));
    assert_eq!(update.get(&path("switches", 0)), Some(&ChannelValue::Switch(SwitchState::On)));
    assert_eq!(update.get(&path("switches", 1)), Some(&ChannelValue::Switch(SwitchState::Off)));
    assert_eq!(update.get(&path("switches", 2)), Some(&ChannelValue::Switch(SwitchState::On)));
    for i in 3..8 {
        assert_eq!(update.get(&path("switches", i)), Some(&ChannelValue::Switch(SwitchState::Off)));
    }

    let delta = update.to_delta().expect("delta serializes");
    assert!(delta["updates"].is_array());
    assert_eq!(delta["updates"][0]["values"][2]["value"], "on");
    assert_eq!(delta["updates"][0]["values"][0]["value"], 0.5);
}

#[tokio::test]
async fn test_inbound_filters_pgn_and_manufacturer() {
    let (bridge, _) = bridge_with(UnknownInstancePolicy::Reject);
    let payload = vec![0x30, 0x99, 0x07, 0xF4, 0x01, 0x00, 0x00, 0x05];

    let mut other_pgn = empirbus_message(payload.clone());
    other_pgn.pgn = 65281;
    assert!(matches!(bridge.handle_inbound(&other_pgn).await, InboundOutcome::Ignored));

    let mut other_vendor = empirbus_message(payload.clone());
    other_vendor.manufacturer_code = Some(381);
    assert!(matches!(bridge.handle_inbound(&other_vendor).await, InboundOutcome::Ignored));

    let mut no_vendor = empirbus_message(payload);
    no_vendor.manufacturer_code = None;
    assert!(matches!(bridge.handle_inbound(&no_vendor).await, InboundOutcome::Ignored));

    assert!(bridge.store().known_instances().await.is_empty());
}

#[tokio::test]
async fn test_inbound_drops_malformed_frames() {
    let (bridge, _) = bridge_with(UnknownInstancePolicy::Reject);

    let short = empirbus_message(vec![0x30, 0x99, 0x07]);
    assert!(matches!(
        bridge.handle_inbound(&short).await,
        InboundOutcome::Dropped(EmpirBusError::MalformedFrame { len: 3 })
    ));

    let bad_dimmer = empirbus_message(vec![0x30, 0x99, 0x07, 0xFF, 0xFF, 0x00, 0x00, 0x00]);
    assert!(matches!(
        bridge.handle_inbound(&bad_dimmer).await,
        InboundOutcome::Dropped(EmpirBusError::OutOfRangeDimmer { .. })
    ));

    // the listener keeps working afterwards
    let good = empirbus_message(vec![0x30, 0x99, 0x07, 0x00, 0x00, 0x00, 0x00, 0x01]);
    assert!(bridge.handle_inbound(&good).await.into_update().is_some());
}

#[tokio::test]
async fn test_inbound_integer_data_field() {
    let (bridge, _) = bridge_with(UnknownInstancePolicy::Reject);
    let value = u64::from_le_bytes([0x30, 0x99, 0x03, 0xE8, 0x03, 0x00, 0x00, 0x80]);
    let mut msg = empirbus_message(Vec::new());
    msg.data = RawData::Integer(value);

    let update = bridge.handle_inbound(&msg).await.into_update().unwrap();
    assert_eq!(
        update.get("electrical.empirBusNxt.3.dimmers.0.state"),
        Some(&ChannelValue::Ratio(1.0))
    );
    assert_eq!(
        update.get("electrical.empirBusNxt.3.switches.7.state"),
        Some(&ChannelValue::Switch(SwitchState::On))
    );
}

#[tokio::test]
async fn test_command_merges_into_observed_state() {
    let (bridge, transport) = bridge_with(UnknownInstancePolicy::Reject);
    let observed = empirbus_message(vec![0x30, 0x99, 0x07, 0xF4, 0x01, 0x00, 0x00, 0x05]);
    bridge.handle_inbound(&observed).await;

    let line = bridge
        .handle_command(&Command::parse("7", "switch1", "on").unwrap())
        .await
        .unwrap();
    assert_eq!(transport.lines(), vec![line.clone()]);

    let parsed = SerialLine::parse(&line).unwrap();
    assert_eq!(parsed.pgn, 65280);
    assert_eq!(parsed.priority, 2);
    assert_eq!(parsed.source, 0);
    assert_eq!(parsed.destination, 255);
    assert_eq!(parsed.data, vec![0x30, 0x99, 0x07, 0xF4, 0x01, 0x00, 0x00, 0x07]);

    let line = bridge
        .handle_command(&Command::parse("7", "dimmer1", "25%").unwrap())
        .await
        .unwrap();
    assert_eq!(payload_of(&line), vec![0x30, 0x99, 0x07, 0xF4, 0x01, 0xFA, 0x00, 0x07]);

    let stored = bridge.store().get(7).await.unwrap().unwrap();
    assert_eq!(stored, decode(&payload_of(&line)).unwrap());
}

#[tokio::test]
async fn test_command_for_unknown_instance_is_rejected() {
    let (bridge, transport) = bridge_with(UnknownInstancePolicy::Reject);
    let result = bridge
        .handle_command(&Command::parse("9", "switch0", "on").unwrap())
        .await;
    assert!(matches!(result, Err(EmpirBusError::UnknownInstance(9))));
    assert!(transport.lines().is_empty());
}

#[tokio::test]
async fn test_command_for_unknown_instance_assumes_off() {
    let (bridge, transport) = bridge_with(UnknownInstancePolicy::AssumeOff);
    bridge
        .handle_command(&Command::parse("9", "switch3", "on").unwrap())
        .await
        .unwrap();
    assert_eq!(
        payload_of(&transport.lines()[0]),
        vec![0x30, 0x99, 0x09, 0x00, 0x00, 0x00, 0x00, 0x08]
    );
}

#[tokio::test]
async fn test_refused_transmission_keeps_previous_state() {
    let config = BridgeConfig {
        unknown_instance: UnknownInstancePolicy::AssumeOff,
        ..BridgeConfig::default()
    };
    let bridge = Bridge::new(config, RecordingTransport::refusing()).unwrap();

    let result = bridge
        .handle_command(&Command::parse("2", "switch0", "on").unwrap())
        .await;
    assert!(matches!(result, Err(EmpirBusError::SerialPortError(_))));
    assert_eq!(bridge.store().get(2).await.unwrap(), None);
}

#[tokio::test]
async fn test_concurrent_commands_do_not_lose_updates() {
    let (bridge, transport) = bridge_with(UnknownInstancePolicy::AssumeOff);
    let bridge = Arc::new(bridge);

    let mut handles = Vec::new();
    for channel in 0..8 {
        let bridge = Arc::clone(&bridge);
        handles.push(tokio::spawn(async move {
            let cmd = Command::parse("5", &format!("switch{channel}"), "on").unwrap();
            bridge.handle_command(&cmd).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let state = bridge.store().get(5).await.unwrap().unwrap();
    assert_eq!(state.switches, [true; 8]);
    assert_eq!(transport.lines().len(), 8);
    let last = transport.lines().last().cloned().unwrap();
    assert_eq!(payload_of(&last)[7], 0xFF);
}

#[tokio::test]
async fn test_listener_processes_mixed_stream() {
    let (bridge, _) = bridge_with(UnknownInstancePolicy::Reject);
    let input = tokio_test::io::Builder::new()
        .read(b"2026-10-18T09:30:00.000Z,2,65280,0,255,8,30,99,07,f4,01,00,00,05\n")
        .read(b"2026-10-18T09:30:00.100Z,2,127250,36,255,8,00,fc,69,97,00,00,00,fc\n")
        .read(b"garbage line\n\n")
        .read(b"2026-10-18T09:30:00.200Z,2,65280,0,255,3,30,99,07\n")
        .read(&[0xFF, 0xFE, b'\n'])
        .read(b"2026-10-18T09:30:00.300Z,2,65280,1,255,8,30,99,08,00,00,e8,03,80\n")
        .build();

    let (tx, mut rx) = mpsc::channel(16);
    let stats = run_listener(&bridge, BufReader::new(input), tx).await.unwrap();

    assert_eq!(stats.lines, 6);
    assert_eq!(stats.published, 2);
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.unparsable, 2);

    let first = rx.recv().await.unwrap();
    assert_eq!(
        first.get("electrical.empirBusNxt.7.dimmers.0.state"),
        Some(&ChannelValue::Ratio(0.5))
    );
    let second = rx.recv().await.unwrap();
    assert_eq!(
        second.get("electrical.empirBusNxt.8.dimmers.1.state"),
        Some(&ChannelValue::Ratio(1.0))
    );
    assert!(rx.recv().await.is_none());

    assert_eq!(bridge.store().known_instances().await, vec![7, 8]);
}

#[tokio::test]
async fn test_listener_stops_when_receiver_closes() {
    let (bridge, _) = bridge_with(UnknownInstancePolicy::Reject);
    let input = b"2026-10-18T09:30:00.000Z,2,65280,0,255,8,30,99,07,f4,01,00,00,05\n\
2026-10-18T09:30:00.100Z,2,65280,0,255,8,30,99,08,f4,01,00,00,05\n";

    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let stats = run_listener(&bridge, &input[..], tx).await.unwrap();
    assert_eq!(stats.published, 1);
    assert_eq!(stats.lines, 1);
}

#[tokio::test]
async fn test_listener_discards_overlong_line() {
    let (bridge, _) = bridge_with(UnknownInstancePolicy::Reject);
    let mut input = vec![b'a'; 5000];
    input.push(b'\n');
    // Over the cap and never terminated before the valid record
    input.extend(std::iter::repeat(b',').take(3000));
    input.extend_from_slice(b"\n2026-10-18T09:30:00.000Z,2,65280,0,255,8,30,99,07,f4,01,00,00,05\n");
    input.extend(std::iter::repeat(b'z').take(2048));

    let (tx, mut rx) = mpsc::channel(4);
    let stats = run_listener(&bridge, &input[..], tx).await.unwrap();

    assert_eq!(stats.lines, 4);
    assert_eq!(stats.unparsable, 3);
    assert_eq!(stats.published, 1);
    let update = rx.recv().await.unwrap();
    assert_eq!(
        update.get("electrical.empirBusNxt.7.dimmers.0.state"),
        Some(&ChannelValue::Ratio(0.5))
    );
}

#[tokio::test]
async fn test_listener_keeps_line_at_cap() {
    let (bridge, _) = bridge_with(UnknownInstancePolicy::Reject);
    let record = b"2026-10-18T09:30:00.000Z,2,65280,0,255,8,30,99,07,f4,01,00,00,05";
    // Pad with trailing spaces so the line, newline included, is exactly the cap
    let mut input = record.to_vec();
    input.resize(MAX_LINE_BYTES as usize - 1, b' ');
    input.push(b'\n');

    let (tx, _rx) = mpsc::channel(4);
    let stats = run_listener(&bridge, &input[..], tx).await.unwrap();
    assert_eq!(stats.unparsable, 0);
    assert_eq!(stats.published, 1);
}

#[tokio::test]
async fn test_strict_tags_drop_foreign_header() {
    let config = BridgeConfig {
        strict_tags: true,
        ..BridgeConfig::default()
    };
    let bridge = Bridge::new(config, RecordingTransport::default()).unwrap();
    let msg = empirbus_message(vec![0x30, 0x9A, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00]);
    assert!(matches!(
        bridge.handle_inbound(&msg).await,
        InboundOutcome::Dropped(EmpirBusError::UnexpectedTag { .. })
    ));
}

#[test]
fn test_manufacturer_code_from_serial_line() {
    let line = SerialLine::parse("2026-10-18T09:30:00.000Z,2,65280,0,255,8,30,99,07,f4,01,00,00,05").unwrap();
    let msg = InboundMessage::from_serial_line(&line);
    assert_eq!(msg.manufacturer_code, Some(304));
    assert!(msg.is_empirbus());

    let line = SerialLine::parse("2026-10-18T09:30:00.000Z,2,65280,0,255,1,30").unwrap();
    assert_eq!(InboundMessage::from_serial_line(&line).manufacturer_code, None);
}

#[test]
fn test_unsupported_data_model_is_rejected() {
    let config = BridgeConfig {
        data_model: empirbus_rs::DataModel::Model1,
        ..BridgeConfig::default()
    };
    assert!(matches!(
        Bridge::new(config, RecordingTransport::default()),
        Err(EmpirBusError::UnsupportedDataModel(1))
    ));
}
