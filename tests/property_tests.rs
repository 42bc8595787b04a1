//! Property-based tests using proptest
//!
//! These tests check framing and envelope invariants across randomly
//! generated inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::BytesMut;
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};
use vault_protocol::config::PROTOCOL_VERSION;
use vault_protocol::core::codec::FrameCodec;
use vault_protocol::core::frame::{Frame, FrameHeader, HEADER_LEN};
use vault_protocol::protocol::message_type::MessageType;
use vault_protocol::utils::crypto::{decrypt, encrypt, KEY_LEN, NONCE_LEN, TAG_LEN};

// Property: Any frame survives to_bytes / from_bytes unchanged
proptest! {
    #[test]
    fn prop_frame_roundtrip(
        message_type in any::<u8>(),
        message_id in any::<u32>(),
        payload in prop::collection::vec(any::<u8>(), 0..65536),
    ) {
        let frame = Frame::new(message_type, message_id, payload);
        let decoded = Frame::from_bytes(&frame.to_bytes().unwrap()).expect("Decoding should not fail");
        prop_assert_eq!(decoded, frame);
    }
}

// Property: The header length field always equals the payload size
proptest! {
    #[test]
    fn prop_header_length_matches_payload(
        message_id in any::<u32>(),
        payload in prop::collection::vec(any::<u8>(), 0..4096),
    ) {
        let bytes = Frame::new(0x09, message_id, payload.clone()).to_bytes().unwrap();
        let header = FrameHeader::parse(&bytes).unwrap();

        prop_assert_eq!(header.payload_len(), payload.len());
        prop_assert_eq!(header.version, PROTOCOL_VERSION);
        prop_assert_eq!(bytes.len(), HEADER_LEN + payload.len());
    }
}

// Property: Splitting the byte stream at any point yields the same frame
proptest! {
    #[test]
    fn prop_codec_split_anywhere(
        payload in prop::collection::vec(any::<u8>(), 0..2048),
        split_seed in any::<usize>(),
    ) {
        let frame = Frame::new(0x05, 3, payload);
        let mut encoded = BytesMut::new();
        FrameCodec::new().encode(frame.clone(), &mut encoded).unwrap();

        let split = split_seed % (encoded.len() + 1);
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::from(&encoded[..split]);

        let first = codec.decode(&mut buffer).unwrap();
        if split < encoded.len() {
            prop_assert!(first.is_none());
            buffer.extend_from_slice(&encoded[split..]);
            let decoded = codec.decode(&mut buffer).unwrap();
            prop_assert_eq!(decoded, Some(frame));
        } else {
            prop_assert_eq!(first, Some(frame));
        }
        prop_assert!(buffer.is_empty());
    }
}

// Property: Truncating an encoded frame never panics and never yields a frame
proptest! {
    #[test]
    fn prop_truncated_frame_rejected(
        payload in prop::collection::vec(any::<u8>(), 1..1024),
        cut in any::<usize>(),
    ) {
        let bytes = Frame::new(0x07, 0, payload).to_bytes().unwrap();
        let cut = cut % bytes.len();
        prop_assert!(Frame::from_bytes(&bytes[..cut]).is_err());
    }
}

// Property: Arbitrary bytes never panic the frame parser
proptest! {
    #[test]
    fn prop_from_bytes_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Frame::from_bytes(&data);
    }
}

// Property: Every known type code round-trips through MessageType
proptest! {
    #[test]
    fn prop_message_type_codes(code in any::<u8>()) {
        match MessageType::try_from(code) {
            Ok(message_type) => prop_assert_eq!(message_type.code(), code),
            Err(_) => prop_assert!(!MessageType::ALL.iter().any(|t| t.code() == code)),
        }
    }
}

// Property: encrypt then decrypt with the same key returns the plaintext
proptest! {
    #[test]
    fn prop_envelope_roundtrip(
        key in prop::array::uniform32(any::<u8>()),
        plaintext in prop::collection::vec(any::<u8>(), 0..4096),
    ) {
        let sealed = encrypt(&plaintext, &key).unwrap();
        prop_assert_eq!(sealed.len(), NONCE_LEN + plaintext.len() + TAG_LEN);

        let opened = decrypt(&sealed, &key).unwrap();
        prop_assert_eq!(&opened[..], &plaintext[..]);
    }
}

// Property: A different key never opens the envelope
proptest! {
    #[test]
    fn prop_envelope_wrong_key_fails(
        key in prop::array::uniform32(any::<u8>()),
        flip in 0usize..KEY_LEN,
        plaintext in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let sealed = encrypt(&plaintext, &key).unwrap();
        let mut other = key;
        other[flip] ^= 0x01;
        prop_assert!(decrypt(&sealed, &other).is_err());
    }
}
