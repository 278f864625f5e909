#![no_main]

use empirbus_rs::nxt::frame::{decode, decode_strict, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let lenient = decode(data);
    let _ = decode_strict(data);

    // Anything that decodes must encode back to the same bytes after the header
    if let Ok(state) = lenient {
        let encoded = encode(&state).expect("decoded state must encode");
        assert_eq!(&encoded[2..], &data[2..]);
    }
});
