//! Typed message bodies.
//!
//! Every frame payload decodes into exactly one body type chosen by the
//! frame's [`MessageType`]. [`Request`] and [`Response`] are the closed sum
//! types the dispatcher and client work with. Field names are camelCase on
//! the wire (`itemId`, `lastSync`, `createdAt`, `updatedAt`).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::serialization::{base64_bytes, null_as_default, rfc3339, sync_cursor, JsonBody};
use crate::error::{ProtocolError, Result};
use crate::protocol::message_type::MessageType;

/// Metadata key holding the uploaded file's name
pub const META_ORIGINAL_FILE_NAME: &str = "original_file_name";
/// Metadata key holding the plaintext size in bytes
pub const META_FILE_SIZE: &str = "file_size";
/// Metadata key holding the file extension including the dot
pub const META_FILE_EXTENSION: &str = "file_extension";

/// Kind of secret stored in an item. Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum DataType {
    LoginPassword = 0x01,
    Text = 0x02,
    Binary = 0x03,
    BankCard = 0x04,
}

impl TryFrom<u8> for DataType {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0x01 => Ok(DataType::LoginPassword),
            0x02 => Ok(DataType::Text),
            0x03 => Ok(DataType::Binary),
            0x04 => Ok(DataType::BankCard),
            other => Err(ProtocolError::UnknownDataType(other)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(data_type: DataType) -> Self {
        data_type as u8
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::LoginPassword => "login/password",
            DataType::Text => "text",
            DataType::Binary => "binary",
            DataType::BankCard => "bank card",
        };
        f.write_str(name)
    }
}

/// A stored item as returned by the server. `data` is ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataItem {
    pub id: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, String>,
    #[serde(with = "rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    pub updated_at: DateTime<Utc>,
}

/// Item contents supplied by the client on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDataItem {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, String>,
}

impl NewDataItem {
    pub fn new(data_type: DataType, name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            data_type,
            name: name.into(),
            data,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

/// Items changed strictly after `last_sync`. Empty or missing means everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(default = "epoch", with = "sync_cursor")]
    pub last_sync: DateTime<Utc>,
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            last_sync: epoch(),
        }
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<DataItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequest {
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    pub item: DataItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDataRequest {
    pub item: NewDataItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDataResponse {
    pub success: bool,
    pub message: String,
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDataRequest {
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDataResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDataRequest {
    pub item_id: String,
    pub item: NewDataItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDataResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub success: bool,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl JsonBody for AuthRequest {}
impl JsonBody for AuthResponse {}
impl JsonBody for RegisterRequest {}
impl JsonBody for RegisterResponse {}
impl JsonBody for SyncRequest {}
impl JsonBody for SyncResponse {}
impl JsonBody for DataRequest {}
impl JsonBody for DataResponse {}
impl JsonBody for SaveDataRequest {}
impl JsonBody for SaveDataResponse {}
impl JsonBody for DeleteDataRequest {}
impl JsonBody for DeleteDataResponse {}
impl JsonBody for UpdateDataRequest {}
impl JsonBody for UpdateDataResponse {}
impl JsonBody for DownloadRequest {}
impl JsonBody for DownloadResponse {}
impl JsonBody for ErrorResponse {}

// Passwords never reach logs
impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Every client-to-server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Auth(AuthRequest),
    Register(RegisterRequest),
    Sync(SyncRequest),
    Data(DataRequest),
    SaveData(SaveDataRequest),
    DeleteData(DeleteDataRequest),
    UpdateData(UpdateDataRequest),
    Download(DownloadRequest),
}

impl Request {
    pub fn message_type(&self) -> MessageType {
        match self {
            Request::Auth(_) => MessageType::AuthRequest,
            Request::Register(_) => MessageType::RegisterRequest,
            Request::Sync(_) => MessageType::SyncRequest,
            Request::Data(_) => MessageType::DataRequest,
            Request::SaveData(_) => MessageType::SaveDataRequest,
            Request::DeleteData(_) => MessageType::DeleteDataRequest,
            Request::UpdateData(_) => MessageType::UpdateDataRequest,
            Request::Download(_) => MessageType::DownloadRequest,
        }
    }

    /// Decode a request body.
    ///
    /// # Errors
    /// - `UnexpectedMessage` if `message_type` is a response type
    /// - `Json` if the payload does not match the body schema
    pub fn decode(message_type: MessageType, payload: &[u8]) -> Result<Self> {
        Ok(match message_type {
            MessageType::AuthRequest => Request::Auth(AuthRequest::from_payload(payload)?),
            MessageType::RegisterRequest => {
                Request::Register(RegisterRequest::from_payload(payload)?)
            }
            MessageType::SyncRequest => Request::Sync(SyncRequest::from_payload(payload)?),
            MessageType::DataRequest => Request::Data(DataRequest::from_payload(payload)?),
            MessageType::SaveDataRequest => {
                Request::SaveData(SaveDataRequest::from_payload(payload)?)
            }
            MessageType::DeleteDataRequest => {
                Request::DeleteData(DeleteDataRequest::from_payload(payload)?)
            }
            MessageType::UpdateDataRequest => {
                Request::UpdateData(UpdateDataRequest::from_payload(payload)?)
            }
            MessageType::DownloadRequest => {
                Request::Download(DownloadRequest::from_payload(payload)?)
            }
            MessageType::AuthResponse
            | MessageType::RegisterResponse
            | MessageType::SyncResponse
            | MessageType::DataResponse
            | MessageType::SaveDataResponse
            | MessageType::DeleteDataResponse
            | MessageType::UpdateDataResponse
            | MessageType::DownloadResponse
            | MessageType::Error => return Err(ProtocolError::UnexpectedMessage),
        })
    }

    pub fn encode(&self) -> Result<(MessageType, Vec<u8>)> {
        let payload = match self {
            Request::Auth(body) => body.to_payload()?,
            Request::Register(body) => body.to_payload()?,
            Request::Sync(body) => body.to_payload()?,
            Request::Data(body) => body.to_payload()?,
            Request::SaveData(body) => body.to_payload()?,
            Request::DeleteData(body) => body.to_payload()?,
            Request::UpdateData(body) => body.to_payload()?,
            Request::Download(body) => body.to_payload()?,
        };
        Ok((self.message_type(), payload))
    }
}

/// Every server-to-client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Auth(AuthResponse),
    Register(RegisterResponse),
    Sync(SyncResponse),
    Data(DataResponse),
    SaveData(SaveDataResponse),
    DeleteData(DeleteDataResponse),
    UpdateData(UpdateDataResponse),
    Download(DownloadResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            code,
            message: message.into(),
        })
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Response::Auth(_) => MessageType::AuthResponse,
            Response::Register(_) => MessageType::RegisterResponse,
            Response::Sync(_) => MessageType::SyncResponse,
            Response::Data(_) => MessageType::DataResponse,
            Response::SaveData(_) => MessageType::SaveDataResponse,
            Response::DeleteData(_) => MessageType::DeleteDataResponse,
            Response::UpdateData(_) => MessageType::UpdateDataResponse,
            Response::Download(_) => MessageType::DownloadResponse,
            Response::Error(_) => MessageType::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Decode a response body.
    ///
    /// # Errors
    /// - `UnexpectedMessage` if `message_type` is a request type
    /// - `Json` if the payload does not match the body schema
    pub fn decode(message_type: MessageType, payload: &[u8]) -> Result<Self> {
        Ok(match message_type {
            MessageType::AuthResponse => Response::Auth(AuthResponse::from_payload(payload)?),
            MessageType::RegisterResponse => {
                Response::Register(RegisterResponse::from_payload(payload)?)
            }
            MessageType::SyncResponse => Response::Sync(SyncResponse::from_payload(payload)?),
            MessageType::DataResponse => Response::Data(DataResponse::from_payload(payload)?),
            MessageType::SaveDataResponse => {
                Response::SaveData(SaveDataResponse::from_payload(payload)?)
            }
            MessageType::DeleteDataResponse => {
                Response::DeleteData(DeleteDataResponse::from_payload(payload)?)
            }
            MessageType::UpdateDataResponse => {
                Response::UpdateData(UpdateDataResponse::from_payload(payload)?)
            }
            MessageType::DownloadResponse => {
                Response::Download(DownloadResponse::from_payload(payload)?)
            }
            MessageType::Error => Response::Error(ErrorResponse::from_payload(payload)?),
            MessageType::AuthRequest
            | MessageType::RegisterRequest
            | MessageType::SyncRequest
            | MessageType::DataRequest
            | MessageType::SaveDataRequest
            | MessageType::DeleteDataRequest
            | MessageType::UpdateDataRequest
            | MessageType::DownloadRequest => return Err(ProtocolError::UnexpectedMessage),
        })
    }

    pub fn encode(&self) -> Result<(MessageType, Vec<u8>)> {
        let payload = match self {
            Response::Auth(body) => body.to_payload()?,
            Response::Register(body) => body.to_payload()?,
            Response::Sync(body) => body.to_payload()?,
            Response::Data(body) => body.to_payload()?,
            Response::SaveData(body) => body.to_payload()?,
            Response::DeleteData(body) => body.to_payload()?,
            Response::UpdateData(body) => body.to_payload()?,
            Response::Download(body) => body.to_payload()?,
            Response::Error(body) => body.to_payload()?,
        };
        Ok((self.message_type(), payload))
    }

    /// Turn an `ErrorResponse` into `ProtocolError::Server`.
    pub fn into_result(self) -> Result<Self> {
        match self {
            Response::Error(ErrorResponse { code, message }) => {
                Err(ProtocolError::Server { code, message })
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_data_type_codes() {
        assert_eq!(serde_json::to_string(&DataType::BankCard).unwrap(), "4");
        assert_eq!(
            serde_json::from_str::<DataType>("1").unwrap(),
            DataType::LoginPassword
        );
        assert!(serde_json::from_str::<DataType>("9").is_err());
    }

    #[test]
    fn test_new_item_wire_shape() {
        let item = NewDataItem::new(DataType::Binary, "photo", vec![1, 2, 3])
            .with_metadata(META_ORIGINAL_FILE_NAME, "photo.png")
            .with_metadata(META_FILE_EXTENSION, ".png");
        let value: serde_json::Value =
            serde_json::from_slice(&SaveDataRequest { item }.to_payload().unwrap()).unwrap();

        assert_eq!(value["item"]["type"], 3);
        assert_eq!(value["item"]["data"], "AQID");
        assert_eq!(value["item"]["metadata"]["original_file_name"], "photo.png");
    }

    #[test]
    fn test_null_metadata_and_items_accepted() {
        let item: NewDataItem =
            serde_json::from_str(r#"{"type":2,"name":"n","data":"","metadata":null}"#).unwrap();
        assert!(item.metadata.is_empty());

        let sync = SyncResponse::from_payload(br#"{"items":null}"#).unwrap();
        assert!(sync.items.is_empty());
    }

    #[test]
    fn test_unknown_data_type_fails_request_decode() {
        let payload = br#"{"item":{"type":7,"name":"x","data":"","metadata":{}}}"#;
        assert!(matches!(
            Request::decode(MessageType::SaveDataRequest, payload),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_sync_request_empty_cursor() {
        let request = Request::decode(MessageType::SyncRequest, br#"{"lastSync":""}"#).unwrap();
        assert_eq!(request, Request::Sync(SyncRequest::default()));
    }

    #[test]
    fn test_camel_case_field_names() {
        let sync = Request::decode(
            MessageType::SyncRequest,
            br#"{"lastSync":"2999-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        match sync {
            Request::Sync(body) => {
                assert_eq!(body.last_sync, Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap())
            }
            other => panic!("unexpected request: {other:?}"),
        }

        let update = Request::decode(
            MessageType::UpdateDataRequest,
            br#"{"itemId":"abc","item":{"type":2,"name":"n","data":"AQID","metadata":{}}}"#,
        )
        .unwrap();
        match update {
            Request::UpdateData(body) => {
                assert_eq!(body.item_id, "abc");
                assert_eq!(body.item.data, vec![1, 2, 3]);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        assert!(Request::decode(MessageType::DataRequest, br#"{"item_id":"abc"}"#).is_err());
    }

    #[test]
    fn test_item_timestamps_serialize_camel_case() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let item = DataItem {
            id: "id-9".into(),
            data_type: DataType::BankCard,
            name: "visa".into(),
            data: vec![],
            metadata: BTreeMap::new(),
            created_at: at,
            updated_at: at,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["createdAt"], "2024-05-06T07:08:09Z");
        assert_eq!(value["updatedAt"], "2024-05-06T07:08:09Z");
        assert_eq!(value["type"], 4);

        let saved = serde_json::to_value(SaveDataResponse {
            success: true,
            message: "ok".into(),
            item_id: "id-9".into(),
        })
        .unwrap();
        assert_eq!(saved["itemId"], "id-9");
    }

    #[test]
    fn test_request_rejects_response_types() {
        for message_type in MessageType::ALL.into_iter().filter(|t| !t.is_request()) {
            assert!(matches!(
                Request::decode(message_type, b"{}"),
                Err(ProtocolError::UnexpectedMessage)
            ));
        }
    }

    #[test]
    fn test_response_rejects_request_types() {
        for message_type in MessageType::ALL.into_iter().filter(|t| t.is_request()) {
            assert!(matches!(
                Response::decode(message_type, b"{}"),
                Err(ProtocolError::UnexpectedMessage)
            ));
        }
    }

    #[test]
    fn test_encode_reports_matching_type() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let item = DataItem {
            id: "id-1".into(),
            data_type: DataType::Text,
            name: "note".into(),
            data: vec![0xde, 0xad],
            metadata: BTreeMap::new(),
            created_at: at,
            updated_at: at,
        };
        let response = Response::Data(DataResponse { item });
        let (message_type, payload) = response.encode().unwrap();

        assert_eq!(message_type, MessageType::DataResponse);
        assert_eq!(Response::decode(message_type, &payload).unwrap(), response);
    }

    #[test]
    fn test_error_response_into_result() {
        let err = Response::error(404, "Data not found").into_result().unwrap_err();
        match err {
            ProtocolError::Server { code, message } => {
                assert_eq!(code, 404);
                assert_eq!(message, "Data not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let request = AuthRequest {
            username: "alice".into(),
            password: "s3cret".into(),
        };
        let rendered = format!("{request:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cret"));
    }
}
