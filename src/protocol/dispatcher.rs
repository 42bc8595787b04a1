//! Request routing.
//!
//! Turns one typed [`Request`] into one [`Response`] for a given session.
//! Authentication gating happens before any handler runs, so the gateway
//! is never touched on behalf of an unauthenticated session except to log in
//! or register.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::error::{codes, constants};
use crate::protocol::message::{
    AuthRequest, AuthResponse, DataRequest, DataResponse, DeleteDataRequest, DeleteDataResponse,
    DownloadRequest, DownloadResponse, RegisterRequest, RegisterResponse, Request, Response,
    SaveDataRequest, SaveDataResponse, SyncRequest, SyncResponse, UpdateDataRequest,
    UpdateDataResponse,
};
use crate::protocol::session::Session;
use crate::storage::{StorageError, StorageGateway, UserId};
use crate::utils::crypto;
use crate::utils::metrics::{global_metrics, Timer};

pub struct Dispatcher<G> {
    gateway: Arc<G>,
}

impl<G> Clone for Dispatcher<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G: StorageGateway> Dispatcher<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Handle one request. Never fails: every outcome is a response frame.
    #[instrument(skip_all, fields(message_type = %request.message_type()))]
    pub async fn dispatch(&self, session: &mut Session, request: Request) -> Response {
        let message_type = request.message_type();
        let _timer = Timer::start(message_type.name());

        if message_type.requires_auth() && !session.is_authenticated() {
            global_metrics().unauthenticated_request();
            debug!(%message_type, "Rejected unauthenticated request");
            return Response::error(codes::UNAUTHORIZED, constants::ERR_NOT_AUTHENTICATED);
        }

        match (request, session.user_id()) {
            (Request::Auth(body), _) => self.login(session, body).await,
            (Request::Register(body), _) => self.register(body).await,
            (Request::Sync(body), Some(user_id)) => self.sync(user_id, body).await,
            (Request::Data(body), Some(user_id)) => self.get_item(user_id, body).await,
            (Request::SaveData(body), Some(user_id)) => self.save_item(user_id, body).await,
            (Request::DeleteData(body), Some(user_id)) => self.delete_item(user_id, body).await,
            (Request::UpdateData(body), Some(user_id)) => self.update_item(user_id, body).await,
            (Request::Download(body), Some(user_id)) => self.download(user_id, body).await,
            // authenticated sessions always carry a user id
            (_, None) => Response::error(codes::UNAUTHORIZED, constants::ERR_NOT_AUTHENTICATED),
        }
    }

    async fn login(&self, session: &mut Session, body: AuthRequest) -> Response {
        if session.is_authenticated() {
            return Response::error(codes::CONFLICT, constants::ERR_ALREADY_AUTHENTICATED);
        }

        let username = body.username;
        match self
            .gateway
            .verify_credentials(&username, &body.password)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                global_metrics().auth_failed();
                warn!(%username, "Authentication failed");
                return Response::error(codes::UNAUTHORIZED, constants::ERR_AUTH_FAILED);
            }
            Err(e) => return self.storage_failure(e, constants::ERR_AUTH_ERROR),
        }

        let user_id = match self.gateway.get_user_id(&username).await {
            Ok(id) => id,
            Err(e) => return self.storage_failure(e, constants::ERR_AUTH_ERROR),
        };

        let token = match crypto::session_token() {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Failed to generate session token");
                return Response::error(codes::INTERNAL, constants::ERR_AUTH_ERROR);
            }
        };

        session.authenticate(username.as_str(), user_id);
        global_metrics().auth_success();
        info!(%username, "User authenticated");

        Response::Auth(AuthResponse {
            success: true,
            token,
        })
    }

    async fn register(&self, body: RegisterRequest) -> Response {
        if body.username.trim().is_empty() || body.password.is_empty() {
            return Response::error(codes::BAD_REQUEST, constants::ERR_EMPTY_CREDENTIALS);
        }

        match self
            .gateway
            .create_user(&body.username, &body.password)
            .await
        {
            Ok(()) => {
                global_metrics().registration();
                info!(username = %body.username, "User registered");
                Response::Register(RegisterResponse {
                    success: true,
                    message: "User registered successfully".to_string(),
                })
            }
            Err(StorageError::Conflict(reason)) => {
                debug!(username = %body.username, %reason, "Registration rejected");
                Response::error(codes::CONFLICT, format!("Registration failed: {reason}"))
            }
            Err(e) => self.storage_failure(e, "Registration failed"),
        }
    }

    async fn sync(&self, user_id: UserId, body: SyncRequest) -> Response {
        match self
            .gateway
            .list_items_since(user_id, body.last_sync)
            .await
        {
            Ok(items) => {
                debug!(%user_id, count = items.len(), last_sync = %body.last_sync, "Sync");
                Response::Sync(SyncResponse { items })
            }
            Err(e) => self.storage_failure(e, constants::ERR_SYNC_FAILED),
        }
    }

    async fn get_item(&self, user_id: UserId, body: DataRequest) -> Response {
        match self.gateway.get_item(user_id, &body.item_id).await {
            Ok(item) => Response::Data(DataResponse { item }),
            Err(e) => self.storage_failure(e, "Failed to get data"),
        }
    }

    async fn save_item(&self, user_id: UserId, body: SaveDataRequest) -> Response {
        debug!(%user_id, data_type = %body.item.data_type, size = body.item.data.len(), "Saving item");
        match self.gateway.create_item(user_id, body.item).await {
            Ok(item_id) => Response::SaveData(SaveDataResponse {
                success: true,
                message: "Data saved successfully".to_string(),
                item_id,
            }),
            Err(e) => self.storage_failure(e, "Failed to store data"),
        }
    }

    async fn delete_item(&self, user_id: UserId, body: DeleteDataRequest) -> Response {
        match self.gateway.delete_item(user_id, &body.item_id).await {
            Ok(()) => Response::DeleteData(DeleteDataResponse {
                success: true,
                message: "Data deleted successfully".to_string(),
            }),
            Err(e) => self.storage_failure(e, "Failed to delete data"),
        }
    }

    async fn update_item(&self, user_id: UserId, body: UpdateDataRequest) -> Response {
        match self
            .gateway
            .update_item(user_id, &body.item_id, body.item)
            .await
        {
            Ok(()) => Response::UpdateData(UpdateDataResponse {
                success: true,
                message: "Data updated successfully".to_string(),
            }),
            Err(e) => self.storage_failure(e, "Failed to update data"),
        }
    }

    async fn download(&self, user_id: UserId, body: DownloadRequest) -> Response {
        match self.gateway.get_item(user_id, &body.item_id).await {
            Ok(item) => Response::Download(DownloadResponse {
                success: true,
                data: item.data,
                message: "Download successful".to_string(),
            }),
            Err(e) => self.storage_failure(e, "Failed to get data"),
        }
    }

    /// Map a gateway error to its response. Backend details stay in the log.
    fn storage_failure(&self, err: StorageError, context: &str) -> Response {
        match err {
            StorageError::NotFound => {
                Response::error(codes::NOT_FOUND, constants::ERR_DATA_NOT_FOUND)
            }
            StorageError::Conflict(reason) => {
                Response::error(codes::CONFLICT, format!("{context}: {reason}"))
            }
            StorageError::Backend(reason) => {
                global_metrics().storage_error();
                error!(%reason, context, "Storage gateway failure");
                Response::error(codes::INTERNAL, format!("{context}: {reason}"))
            }
        }
    }
}
