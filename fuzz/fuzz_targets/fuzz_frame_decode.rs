#![no_main]

use echonet_core::frame::Frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = Frame::decode(data) {
        // Anything that decodes must re-encode to the same bytes.
        let bytes = frame.to_bytes().expect("decoded frame encodes");
        assert_eq!(bytes, data);
    }
});
