//! Per-connection read, dispatch and write loop.
//!
//! One handler owns one stream, so requests are processed strictly one at a
//! time and responses go out in request order.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, info, instrument, warn};

use crate::config::PROTOCOL_VERSION;
use crate::core::codec::FrameCodec;
use crate::core::frame::{Frame, HEADER_LEN};
use crate::error::{codes, constants, ProtocolError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::message::{Request, Response};
use crate::protocol::message_type::MessageType;
use crate::protocol::session::Session;
use crate::storage::StorageGateway;
use crate::utils::metrics::global_metrics;
use crate::utils::timeout::{with_timeout_error, DEFAULT_TIMEOUT, IDLE_TIMEOUT};

pub struct ConnectionHandler<S, G> {
    framed: Framed<S, FrameCodec>,
    dispatcher: Dispatcher<G>,
    session: Session,
    peer: String,
    idle_timeout: Duration,
    write_timeout: Duration,
}

impl<S, G> ConnectionHandler<S, G>
where
    S: AsyncRead + AsyncWrite + Unpin,
    G: StorageGateway,
{
    pub fn new(stream: S, dispatcher: Dispatcher<G>, peer: impl Into<String>) -> Self {
        Self {
            framed: Framed::new(stream, FrameCodec::new()),
            dispatcher,
            session: Session::new(),
            peer: peer.into(),
            idle_timeout: IDLE_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the read idle deadline and the per-frame write deadline
    pub fn with_timeouts(mut self, idle_timeout: Duration, write_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self.write_timeout = write_timeout;
        self
    }

    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        *self.framed.codec_mut() = FrameCodec::with_max_payload_size(max_payload_size);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Serve until the peer disconnects or the connection becomes unusable.
    ///
    /// A clean close between frames returns `Ok(())`. Deadlines, I/O errors,
    /// truncated frames and oversized frames end the session with an error;
    /// malformed requests are answered and the loop continues.
    #[instrument(skip(self), fields(peer = %self.peer))]
    pub async fn run(mut self) -> Result<()> {
        debug!("Session started");

        loop {
            let frame = match tokio::time::timeout(self.idle_timeout, self.framed.next()).await {
                Err(_) => {
                    info!(idle_ms = self.idle_timeout.as_millis() as u64, "Idle timeout, closing");
                    global_metrics().connection_error();
                    return Err(ProtocolError::ConnectionTimeout);
                }
                Ok(None) => {
                    debug!(username = ?self.session.username(), "Peer closed connection");
                    return Ok(());
                }
                Ok(Some(Err(ProtocolError::OversizedPacket(size)))) => {
                    warn!(size, "Oversized frame, closing");
                    global_metrics().protocol_error();
                    // The stream cannot be resynchronised, so this reply is best effort
                    let _ = self
                        .send(Response::error(
                            codes::PAYLOAD_TOO_LARGE,
                            constants::ERR_OVERSIZED_PACKET,
                        ))
                        .await;
                    return Err(ProtocolError::OversizedPacket(size));
                }
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "Read failed, closing");
                    global_metrics().connection_error();
                    return Err(e);
                }
                Ok(Some(Ok(frame))) => frame,
            };

            let response = self.handle_frame(frame).await;
            if let Err(e) = self.send(response).await {
                warn!(error = %e, "Write failed, closing");
                global_metrics().connection_error();
                return Err(e);
            }
        }
    }

    async fn handle_frame(&mut self, frame: Frame) -> Response {
        global_metrics().message_received((HEADER_LEN + frame.payload.len()) as u64);

        if frame.version != PROTOCOL_VERSION {
            global_metrics().protocol_error();
            debug!(version = frame.version, "Unsupported protocol version");
            return Response::error(
                codes::BAD_REQUEST,
                format!("Unsupported protocol version: {}", frame.version),
            );
        }

        let message_type = match MessageType::try_from(frame.message_type) {
            Ok(message_type) => message_type,
            Err(_) => {
                global_metrics().protocol_error();
                debug!(code = frame.message_type, "Unknown message type");
                return Response::error(codes::BAD_REQUEST, constants::ERR_UNKNOWN_MESSAGE_TYPE);
            }
        };

        debug!(%message_type, message_id = frame.message_id, len = frame.payload.len(), "Frame received");

        if !message_type.is_request() {
            global_metrics().protocol_error();
            return Response::error(codes::BAD_REQUEST, constants::ERR_UNEXPECTED_MESSAGE);
        }

        match Request::decode(message_type, &frame.payload) {
            Ok(request) => self.dispatcher.dispatch(&mut self.session, request).await,
            Err(e) => {
                global_metrics().protocol_error();
                debug!(%message_type, error = %e, "Malformed request body");
                Response::error(
                    codes::BAD_REQUEST,
                    format!("Invalid {} format", message_type.label()),
                )
            }
        }
    }

    async fn send(&mut self, response: Response) -> Result<()> {
        let max_payload_size = self.framed.codec().max_payload_size();

        let (message_type, payload) = match response.encode() {
            Ok((_, payload)) if payload.len() > max_payload_size => {
                warn!(size = payload.len(), "Response exceeds frame limit");
                Response::error(codes::PAYLOAD_TOO_LARGE, "Response exceeds maximum size")
                    .encode()?
            }
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Failed to encode response");
                Response::error(codes::INTERNAL, "Failed to serialize response").encode()?
            }
        };

        let frame = Frame::new(message_type.code(), self.session.next_message_id(), payload);
        let size = (HEADER_LEN + frame.payload.len()) as u64;
        debug!(%message_type, message_id = frame.message_id, "Sending response");

        let framed = &mut self.framed;
        with_timeout_error(async { framed.send(frame).await }, self.write_timeout).await?;

        global_metrics().message_sent(size);
        Ok(())
    }
}
