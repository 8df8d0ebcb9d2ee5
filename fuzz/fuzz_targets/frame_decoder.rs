//! Fuzz target for the frame decoder.
//!
//! Arbitrary byte streams must decode into frames or a `FrameError`, and any
//! frames that decode must re-encode to the same bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;

use headlint_core::{FrameReader, encode_frame};

fuzz_target!(|data: &[u8]| {
    let mut consumed = Vec::new();
    for frame in FrameReader::new(data).with_max_payload(1 << 20) {
        let Ok(frame) = frame else {
            return;
        };
        let bytes = encode_frame(frame.kind, &frame.payload).expect("re-encode");
        consumed.extend(bytes);
        let _ = frame.message();
    }
    assert_eq!(consumed, data);
});
