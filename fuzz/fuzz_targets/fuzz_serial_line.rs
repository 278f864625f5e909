#![no_main]

use empirbus_rs::bridge::InboundMessage;
use empirbus_rs::SerialLine;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(line) = SerialLine::parse(&text) {
        let _ = InboundMessage::from_serial_line(&line);

        // Whatever the formatter reproduces must carry the same record
        if let Ok(again) = SerialLine::parse(&line.to_string()) {
            assert_eq!(again.data, line.data);
            assert_eq!(again.pgn, line.pgn);
            assert_eq!(again.source, line.source);
        }
    }
});
