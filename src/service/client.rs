//! Client library for the vault service.
//!
//! Mirrors every request type and adds `*_secret` helpers that seal item
//! contents with a key derived from the login credentials, so the server
//! only ever stores ciphertext.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

use crate::config::{ClientConfig, PROTOCOL_VERSION};
use crate::core::codec::FrameCodec;
use crate::core::frame::Frame;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::*;
use crate::protocol::message_type::MessageType;
use crate::utils::crypto::ItemKey;
use crate::utils::timeout::{with_timeout_error, DEFAULT_TIMEOUT};

pub struct Client<S = TcpStream> {
    /// `None` once an exchange failed mid-flight; the stream can no longer
    /// be trusted to line up requests with replies.
    framed: Option<Framed<S, FrameCodec>>,
    next_message_id: u32,
    response_timeout: Duration,
    username: Option<String>,
    token: Option<String>,
    item_key: Option<ItemKey>,
}

impl Client<TcpStream> {
    /// Connect to `config.address` within `config.connection_timeout`.
    #[instrument(skip(config), fields(address = %config.address))]
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let stream = with_timeout_error(
            async { Ok(TcpStream::connect(&config.address).await?) },
            config.connection_timeout,
        )
        .await?;
        stream.set_nodelay(true)?;
        info!("Connected");

        Ok(Self::from_stream(stream).with_response_timeout(config.response_timeout))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn from_stream(stream: S) -> Self {
        Self {
            framed: Some(Framed::new(stream, FrameCodec::new())),
            next_message_id: 0,
            response_timeout: DEFAULT_TIMEOUT,
            username: None,
            token: None,
            item_key: None,
        }
    }

    pub fn with_response_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// False after a timeout or transport failure; every later call returns
    /// `ConnectionClosed`.
    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Token returned by the last successful login.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Send one request and wait for its response.
    ///
    /// Server `ErrorResponse`s surface as `ProtocolError::Server`. A timeout,
    /// transport error or mismatched reply closes the client.
    async fn call(&mut self, request: Request) -> Result<Response> {
        let (message_type, payload) = request.encode()?;
        let Some(framed) = self.framed.as_mut() else {
            return Err(ProtocolError::ConnectionClosed);
        };
        let message_id = self.next_message_id;
        self.next_message_id = self.next_message_id.wrapping_add(1);

        debug!(%message_type, message_id, "Sending request");
        let request_frame = Frame::new(message_type.code(), message_id, payload);
        let result = exchange(framed, request_frame, message_type, self.response_timeout).await;
        let (response_type, frame) = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(%message_type, message_id, error = %e, "Closing client connection");
                self.framed = None;
                return Err(e);
            }
        };

        Response::decode(response_type, &frame.payload)?.into_result()
    }

    pub async fn register(&mut self, username: &str, password: &str) -> Result<RegisterResponse> {
        let request = Request::Register(RegisterRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        });
        match self.call(request).await? {
            Response::Register(resp) => Ok(resp),
            _ => Err(ProtocolError::UnexpectedMessage),
        }
    }

    /// Log in and derive the item key for this account. Returns the session token.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, username: &str, password: &str) -> Result<String> {
        let request = Request::Auth(AuthRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        });
        let token = match self.call(request).await? {
            Response::Auth(resp) if resp.success => resp.token,
            Response::Auth(_) => {
                return Err(ProtocolError::Custom("Authentication failed".to_string()))
            }
            _ => return Err(ProtocolError::UnexpectedMessage),
        };

        let (user, pass) = (username.to_owned(), Zeroizing::new(password.to_owned()));
        let key = tokio::task::spawn_blocking(move || ItemKey::from_credentials(&user, &pass))
            .await
            .map_err(|e| ProtocolError::KeyDerivation(e.to_string()))?;

        self.username = Some(username.to_owned());
        self.token = Some(token.clone());
        self.item_key = Some(key);
        info!("Logged in");
        Ok(token)
    }

    /// Items changed after `last_sync`; `None` fetches everything.
    pub async fn sync(&mut self, last_sync: Option<DateTime<Utc>>) -> Result<Vec<DataItem>> {
        let request = Request::Sync(SyncRequest {
            last_sync: last_sync.unwrap_or(DateTime::UNIX_EPOCH),
        });
        match self.call(request).await? {
            Response::Sync(resp) => Ok(resp.items),
            _ => Err(ProtocolError::UnexpectedMessage),
        }
    }

    pub async fn get_item(&mut self, item_id: &str) -> Result<DataItem> {
        let request = Request::Data(DataRequest {
            item_id: item_id.to_owned(),
        });
        match self.call(request).await? {
            Response::Data(resp) => Ok(resp.item),
            _ => Err(ProtocolError::UnexpectedMessage),
        }
    }

    /// Store an item as-is and return its server-assigned id.
    pub async fn save_item(&mut self, item: NewDataItem) -> Result<String> {
        match self.call(Request::SaveData(SaveDataRequest { item })).await? {
            Response::SaveData(resp) => Ok(resp.item_id),
            _ => Err(ProtocolError::UnexpectedMessage),
        }
    }

    pub async fn update_item(&mut self, item_id: &str, item: NewDataItem) -> Result<()> {
        let request = Request::UpdateData(UpdateDataRequest {
            item_id: item_id.to_owned(),
            item,
        });
        match self.call(request).await? {
            Response::UpdateData(_) => Ok(()),
            _ => Err(ProtocolError::UnexpectedMessage),
        }
    }

    pub async fn delete_item(&mut self, item_id: &str) -> Result<()> {
        let request = Request::DeleteData(DeleteDataRequest {
            item_id: item_id.to_owned(),
        });
        match self.call(request).await? {
            Response::DeleteData(_) => Ok(()),
            _ => Err(ProtocolError::UnexpectedMessage),
        }
    }

    /// Raw stored bytes of an item (ciphertext for items saved by this client).
    pub async fn download(&mut self, item_id: &str) -> Result<Vec<u8>> {
        let request = Request::Download(DownloadRequest {
            item_id: item_id.to_owned(),
        });
        match self.call(request).await? {
            Response::Download(resp) => Ok(resp.data),
            _ => Err(ProtocolError::UnexpectedMessage),
        }
    }

    /// Encrypt `plaintext` with the item key and store it.
    pub async fn save_secret(
        &mut self,
        data_type: DataType,
        name: &str,
        plaintext: &[u8],
        metadata: BTreeMap<String, String>,
    ) -> Result<String> {
        let data = self.key()?.seal(plaintext)?;
        self.save_item(NewDataItem {
            data_type,
            name: name.to_owned(),
            data,
            metadata,
        })
        .await
    }

    /// Re-encrypt and replace an existing item.
    pub async fn update_secret(
        &mut self,
        item_id: &str,
        data_type: DataType,
        name: &str,
        plaintext: &[u8],
        metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        let data = self.key()?.seal(plaintext)?;
        self.update_item(
            item_id,
            NewDataItem {
                data_type,
                name: name.to_owned(),
                data,
                metadata,
            },
        )
        .await
    }

    /// Store a file's contents as an encrypted binary item.
    pub async fn save_file(&mut self, name: &str, file_name: &str, contents: &[u8]) -> Result<String> {
        let mut metadata = BTreeMap::new();
        metadata.insert(META_ORIGINAL_FILE_NAME.to_string(), file_name.to_string());
        metadata.insert(META_FILE_SIZE.to_string(), contents.len().to_string());
        if let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) {
            metadata.insert(META_FILE_EXTENSION.to_string(), format!(".{ext}"));
        }
        self.save_secret(DataType::Binary, name, contents, metadata)
            .await
    }

    /// Decrypt an item fetched by `sync` or `get_item`.
    pub fn open_item(&self, item: &DataItem) -> Result<Zeroizing<Vec<u8>>> {
        self.key()?.open(&item.data)
    }

    pub async fn download_secret(&mut self, item_id: &str) -> Result<Zeroizing<Vec<u8>>> {
        let data = self.download(item_id).await?;
        self.key()?.open(&data)
    }

    fn key(&self) -> Result<&ItemKey> {
        self.item_key.as_ref().ok_or(ProtocolError::NotAuthenticated)
    }
}

/// Write one request frame and read the frame that answers it.
async fn exchange<S>(
    framed: &mut Framed<S, FrameCodec>,
    request: Frame,
    request_type: MessageType,
    response_timeout: Duration,
) -> Result<(MessageType, Frame)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    framed.send(request).await?;

    let frame = with_timeout_error(
        async {
            framed
                .next()
                .await
                .ok_or(ProtocolError::ConnectionClosed)?
        },
        response_timeout,
    )
    .await?;

    if frame.version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(frame.version));
    }

    let response_type = MessageType::try_from(frame.message_type)?;
    if response_type != MessageType::Error && request_type.response_type() != Some(response_type) {
        return Err(ProtocolError::UnexpectedMessage);
    }
    Ok((response_type, frame))
}
