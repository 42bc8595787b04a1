#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Edge-case tests for framing, message bodies, envelopes and deadlines
//! Tests boundary conditions and malformed input handling

use std::time::Duration;

use vault_protocol::config::{MAX_PAYLOAD_SIZE, PROTOCOL_VERSION};
use vault_protocol::core::frame::{Frame, FrameHeader, HEADER_LEN};
use vault_protocol::error::ProtocolError;
use vault_protocol::protocol::message::{DataType, Request, Response, SyncRequest};
use vault_protocol::protocol::message_type::MessageType;
use vault_protocol::utils::crypto::{decrypt, encrypt, ItemKey, NONCE_LEN, TAG_LEN};
use vault_protocol::utils::timeout::with_timeout_error;

// ============================================================================
// FRAME EDGE CASES
// ============================================================================

#[test]
fn test_frame_empty_payload() {
    let frame = Frame::new(MessageType::SyncRequest.code(), 0, vec![]);
    let bytes = frame.to_bytes().unwrap();
    assert_eq!(bytes.len(), HEADER_LEN);

    let decoded = Frame::from_bytes(&bytes).expect("Should decode empty payload");
    assert!(decoded.payload.is_empty());
    assert_eq!(decoded.version, PROTOCOL_VERSION);
}

#[test]
fn test_frame_empty_buffer() {
    assert!(matches!(
        Frame::from_bytes(&[]),
        Err(ProtocolError::InvalidMessage)
    ));
}

#[test]
fn test_frame_oversized_length_rejected() {
    let mut bytes = FrameHeader {
        message_type: 0x07,
        version: PROTOCOL_VERSION,
        message_id: 0,
        length: (MAX_PAYLOAD_SIZE + 1) as u32,
    }
    .to_bytes()
    .to_vec();
    bytes.extend_from_slice(&[0xFF; 16]);

    match Frame::from_bytes(&bytes) {
        Err(ProtocolError::OversizedPacket(size)) => assert_eq!(size, MAX_PAYLOAD_SIZE + 1),
        other => panic!("Unexpected result: {other:?}"),
    }
}

#[test]
fn test_frame_max_message_id() {
    let frame = Frame::new(0x02, u32::MAX, b"{}".to_vec());
    let decoded = Frame::from_bytes(&frame.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded.message_id, u32::MAX);
}

#[test]
fn test_frame_large_payload_roundtrip() {
    let payload = vec![0xAB; 4 * 1024 * 1024];
    let frame = Frame::new(0x07, 1, payload);
    let decoded = Frame::from_bytes(&frame.to_bytes().unwrap()).expect("Should decode large payload");
    assert_eq!(decoded.payload.len(), 4 * 1024 * 1024);
}

// ============================================================================
// MESSAGE BODY EDGE CASES
// ============================================================================

#[test]
fn test_unknown_type_codes() {
    for code in [0x00, 0x11, 0x7F, 0xFE] {
        assert!(matches!(
            MessageType::try_from(code),
            Err(ProtocolError::UnknownMessageType(c)) if c == code
        ));
    }
}

#[test]
fn test_response_type_is_not_a_request() {
    let result = Request::decode(MessageType::AuthResponse, br#"{"success":true,"token":"t"}"#);
    assert!(matches!(result, Err(ProtocolError::UnexpectedMessage)));
}

#[test]
fn test_request_type_is_not_a_response() {
    let result = Response::decode(MessageType::SyncRequest, br#"{"lastSync":""}"#);
    assert!(matches!(result, Err(ProtocolError::UnexpectedMessage)));
}

#[test]
fn test_sync_cursor_variants() {
    let bodies: [&[u8]; 3] = [b"{}", br#"{"lastSync":""}"#, br#"{"lastSync":null}"#];
    for body in bodies {
        match Request::decode(MessageType::SyncRequest, body).unwrap() {
            Request::Sync(req) => assert_eq!(req, SyncRequest::default()),
            other => panic!("expected sync request, got {other:?}"),
        }
    }

    let result = Request::decode(MessageType::SyncRequest, br#"{"lastSync":"yesterday"}"#);
    assert!(matches!(result, Err(ProtocolError::Json(_))));
}

#[test]
fn test_unknown_data_type_rejected() {
    let body = br#"{"item":{"type":9,"name":"n","data":"","metadata":{}}}"#;
    assert!(Request::decode(MessageType::SaveDataRequest, body).is_err());
}

#[test]
fn test_null_data_and_metadata_accepted() {
    let body = br#"{"item":{"type":2,"name":"note","data":null,"metadata":null}}"#;
    match Request::decode(MessageType::SaveDataRequest, body).unwrap() {
        Request::SaveData(req) => {
            assert_eq!(req.item.data_type, DataType::Text);
            assert!(req.item.data.is_empty());
            assert!(req.item.metadata.is_empty());
        }
        other => panic!("expected save request, got {other:?}"),
    }
}

#[test]
fn test_invalid_base64_rejected() {
    let body = br#"{"item":{"type":2,"name":"note","data":"***","metadata":{}}}"#;
    assert!(Request::decode(MessageType::SaveDataRequest, body).is_err());
}

#[test]
fn test_missing_fields_rejected() {
    assert!(Request::decode(MessageType::AuthRequest, br#"{"username":"a"}"#).is_err());
    assert!(Request::decode(MessageType::DataRequest, b"{}").is_err());
    assert!(Request::decode(MessageType::AuthRequest, b"not json").is_err());
}

#[test]
fn test_error_response_into_result() {
    let response = Response::error(404, "Data not found");
    match response.into_result() {
        Err(ProtocolError::Server { code, message }) => {
            assert_eq!(code, 404);
            assert_eq!(message, "Data not found");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

// ============================================================================
// ENVELOPE EDGE CASES
// ============================================================================

#[test]
fn test_envelope_empty_plaintext() {
    let key = [7u8; 32];
    let sealed = encrypt(b"", &key).unwrap();
    assert_eq!(sealed.len(), NONCE_LEN + TAG_LEN);
    assert!(decrypt(&sealed, &key).unwrap().is_empty());
}

#[test]
fn test_envelope_too_short() {
    let key = [7u8; 32];
    for len in 0..NONCE_LEN + TAG_LEN {
        assert!(matches!(
            decrypt(&vec![0u8; len], &key),
            Err(ProtocolError::DecryptionFailure)
        ));
    }
}

#[test]
fn test_envelope_tampered_nonce() {
    let key = [3u8; 32];
    let mut sealed = encrypt(b"card 4111", &key).unwrap();
    sealed[0] ^= 0xFF;
    assert!(matches!(
        decrypt(&sealed, &key),
        Err(ProtocolError::DecryptionFailure)
    ));
}

#[test]
fn test_item_key_separates_users() {
    let alice = ItemKey::from_credentials("alice", "same-password");
    let bob = ItemKey::from_credentials("bob", "same-password");

    let sealed = alice.seal(b"secret").unwrap();
    assert!(bob.open(&sealed).is_err());
    assert_eq!(&alice.open(&sealed).unwrap()[..], b"secret");
}

// ============================================================================
// TIMEOUT EDGE CASES
// ============================================================================

#[tokio::test]
async fn test_timeout_zero_duration() {
    let result = with_timeout_error(
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        },
        Duration::ZERO,
    )
    .await;
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}
