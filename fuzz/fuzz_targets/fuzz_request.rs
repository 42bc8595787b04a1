#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;
use vault_protocol::core::codec::FrameCodec;
use vault_protocol::protocol::message::Request;
use vault_protocol::protocol::message_type::MessageType;

fuzz_target!(|data: &[u8]| {
    // Stream decode then body decode, as a session does for untrusted input
    let mut codec = FrameCodec::with_max_payload_size(64 * 1024);
    let mut buf = BytesMut::from(data);
    while let Ok(Some(frame)) = codec.decode(&mut buf) {
        if let Ok(message_type) = MessageType::try_from(frame.message_type) {
            let _ = Request::decode(message_type, &frame.payload);
        }
    }
});
