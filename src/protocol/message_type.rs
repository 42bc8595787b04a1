//! Message type registry.
//!
//! The set of type codes is closed: every frame's first byte must map to one
//! of these variants or the frame is answered with an error.

use std::fmt;

use crate::error::ProtocolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    AuthRequest = 0x01,
    AuthResponse = 0x02,
    RegisterRequest = 0x03,
    RegisterResponse = 0x04,
    SyncRequest = 0x05,
    SyncResponse = 0x06,
    DataRequest = 0x07,
    DataResponse = 0x08,
    SaveDataRequest = 0x09,
    SaveDataResponse = 0x0A,
    DeleteDataRequest = 0x0B,
    DeleteDataResponse = 0x0C,
    UpdateDataRequest = 0x0D,
    UpdateDataResponse = 0x0E,
    DownloadRequest = 0x0F,
    DownloadResponse = 0x10,
    Error = 0xFF,
}

impl MessageType {
    pub const ALL: [MessageType; 17] = [
        MessageType::AuthRequest,
        MessageType::AuthResponse,
        MessageType::RegisterRequest,
        MessageType::RegisterResponse,
        MessageType::SyncRequest,
        MessageType::SyncResponse,
        MessageType::DataRequest,
        MessageType::DataResponse,
        MessageType::SaveDataRequest,
        MessageType::SaveDataResponse,
        MessageType::DeleteDataRequest,
        MessageType::DeleteDataResponse,
        MessageType::UpdateDataRequest,
        MessageType::UpdateDataResponse,
        MessageType::DownloadRequest,
        MessageType::DownloadResponse,
        MessageType::Error,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageType::AuthRequest => "AuthRequest",
            MessageType::AuthResponse => "AuthResponse",
            MessageType::RegisterRequest => "RegisterRequest",
            MessageType::RegisterResponse => "RegisterResponse",
            MessageType::SyncRequest => "SyncRequest",
            MessageType::SyncResponse => "SyncResponse",
            MessageType::DataRequest => "DataRequest",
            MessageType::DataResponse => "DataResponse",
            MessageType::SaveDataRequest => "SaveDataRequest",
            MessageType::SaveDataResponse => "SaveDataResponse",
            MessageType::DeleteDataRequest => "DeleteDataRequest",
            MessageType::DeleteDataResponse => "DeleteDataResponse",
            MessageType::UpdateDataRequest => "UpdateDataRequest",
            MessageType::UpdateDataResponse => "UpdateDataResponse",
            MessageType::DownloadRequest => "DownloadRequest",
            MessageType::DownloadResponse => "DownloadResponse",
            MessageType::Error => "Error",
        }
    }

    /// Lowercase phrase used in "Invalid ... format" error messages.
    pub fn label(self) -> &'static str {
        match self {
            MessageType::AuthRequest => "auth request",
            MessageType::AuthResponse => "auth response",
            MessageType::RegisterRequest => "register request",
            MessageType::RegisterResponse => "register response",
            MessageType::SyncRequest => "sync request",
            MessageType::SyncResponse => "sync response",
            MessageType::DataRequest => "data request",
            MessageType::DataResponse => "data response",
            MessageType::SaveDataRequest => "save data request",
            MessageType::SaveDataResponse => "save data response",
            MessageType::DeleteDataRequest => "delete data request",
            MessageType::DeleteDataResponse => "delete data response",
            MessageType::UpdateDataRequest => "update data request",
            MessageType::UpdateDataResponse => "update data response",
            MessageType::DownloadRequest => "download request",
            MessageType::DownloadResponse => "download response",
            MessageType::Error => "error response",
        }
    }

    /// Requests are the client-to-server half of the registry.
    pub fn is_request(self) -> bool {
        matches!(
            self,
            MessageType::AuthRequest
                | MessageType::RegisterRequest
                | MessageType::SyncRequest
                | MessageType::DataRequest
                | MessageType::SaveDataRequest
                | MessageType::DeleteDataRequest
                | MessageType::UpdateDataRequest
                | MessageType::DownloadRequest
        )
    }

    /// Only login and registration may arrive before authentication.
    pub fn requires_auth(self) -> bool {
        !matches!(self, MessageType::AuthRequest | MessageType::RegisterRequest)
    }

    /// The success response paired with a request, `None` for response types.
    pub fn response_type(self) -> Option<MessageType> {
        match self {
            MessageType::AuthRequest => Some(MessageType::AuthResponse),
            MessageType::RegisterRequest => Some(MessageType::RegisterResponse),
            MessageType::SyncRequest => Some(MessageType::SyncResponse),
            MessageType::DataRequest => Some(MessageType::DataResponse),
            MessageType::SaveDataRequest => Some(MessageType::SaveDataResponse),
            MessageType::DeleteDataRequest => Some(MessageType::DeleteDataResponse),
            MessageType::UpdateDataRequest => Some(MessageType::UpdateDataResponse),
            MessageType::DownloadRequest => Some(MessageType::DownloadResponse),
            _ => None,
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, ProtocolError> {
        Ok(match code {
            0x01 => MessageType::AuthRequest,
            0x02 => MessageType::AuthResponse,
            0x03 => MessageType::RegisterRequest,
            0x04 => MessageType::RegisterResponse,
            0x05 => MessageType::SyncRequest,
            0x06 => MessageType::SyncResponse,
            0x07 => MessageType::DataRequest,
            0x08 => MessageType::DataResponse,
            0x09 => MessageType::SaveDataRequest,
            0x0A => MessageType::SaveDataResponse,
            0x0B => MessageType::DeleteDataRequest,
            0x0C => MessageType::DeleteDataResponse,
            0x0D => MessageType::UpdateDataRequest,
            0x0E => MessageType::UpdateDataResponse,
            0x0F => MessageType::DownloadRequest,
            0x10 => MessageType::DownloadResponse,
            0xFF => MessageType::Error,
            other => return Err(ProtocolError::UnknownMessageType(other)),
        })
    }
}

impl From<MessageType> for u8 {
    fn from(message_type: MessageType) -> Self {
        message_type.code()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.code())
    }
}
