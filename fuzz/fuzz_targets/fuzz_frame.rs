#![no_main]

use libfuzzer_sys::fuzz_target;
use vault_protocol::Frame;

fuzz_target!(|data: &[u8]| {
    // Header parsing must reject or accept, never panic or over-read
    if let Ok(frame) = Frame::from_bytes(data) {
        let header = frame.header().expect("decoded frames are within the size limit");
        assert_eq!(header.payload_len(), frame.payload.len());
    }
});
