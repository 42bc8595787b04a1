//! TCP listener for the vault service.
//!
//! Each accepted connection runs its own [`ConnectionHandler`] task. Only the
//! storage gateway is shared between tasks.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, instrument, warn};

use crate::config::VaultConfig;
use crate::error::Result;
use crate::protocol::dispatcher::Dispatcher;
use crate::service::connection::ConnectionHandler;
use crate::storage::StorageGateway;
use crate::utils::metrics::global_metrics;

pub struct Server<G> {
    listener: TcpListener,
    dispatcher: Dispatcher<G>,
    idle_timeout: Duration,
    write_timeout: Duration,
    shutdown_timeout: Duration,
    max_payload_size: usize,
    connection_limit: Arc<Semaphore>,
    active_connections: Arc<AtomicUsize>,
}

impl<G: StorageGateway> Server<G> {
    /// Bind the listener described by `config.server.address`.
    #[instrument(skip(config, gateway), fields(address = %config.server.address))]
    pub async fn bind(config: &VaultConfig, gateway: Arc<G>) -> Result<Self> {
        let listener = TcpListener::bind(&config.server.address).await?;
        info!(address = %listener.local_addr()?, "Listening");

        Ok(Self {
            listener,
            dispatcher: Dispatcher::new(gateway),
            idle_timeout: config.server.idle_timeout,
            write_timeout: config.server.write_timeout,
            shutdown_timeout: config.server.shutdown_timeout,
            max_payload_size: config.transport.max_payload_size,
            connection_limit: Arc::new(Semaphore::new(config.server.max_connections.max(1))),
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.run_with_shutdown(shutdown_rx).await
    }

    /// Serve until a message arrives on `shutdown_rx` (or its sender drops),
    /// then wait up to the shutdown timeout for active sessions to finish.
    pub async fn run_with_shutdown(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server. Waiting for connections to close...");
                    self.drain().await;
                    global_metrics().log_metrics();
                    return Ok(());
                }

                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => error!(error = %e, "Error accepting connection"),
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, %peer, "Failed to set TCP_NODELAY");
        }

        let handler = ConnectionHandler::new(stream, self.dispatcher.clone(), peer.to_string())
            .with_timeouts(self.idle_timeout, self.write_timeout)
            .with_max_payload_size(self.max_payload_size);
        let limit = Arc::clone(&self.connection_limit);
        let active = Arc::clone(&self.active_connections);
        let queue_timeout = self.idle_timeout;

        active.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            // Excess connections wait at most one idle timeout for a slot
            match tokio::time::timeout(queue_timeout, limit.acquire_owned()).await {
                Ok(Ok(_permit)) => {
                    global_metrics().connection_established();
                    if let Err(e) = handler.run().await {
                        debug!(%peer, error = %e, "Session ended with error");
                    }
                    global_metrics().connection_closed();
                }
                Ok(Err(_)) => debug!(%peer, "Connection limit closed"),
                Err(_) => {
                    global_metrics().connection_error();
                    warn!(%peer, "No session slot within idle timeout, dropping connection");
                }
            }
            active.fetch_sub(1, Ordering::SeqCst);
        });
    }

    async fn drain(&self) {
        let deadline = tokio::time::sleep(self.shutdown_timeout);
        tokio::pin!(deadline);

        loop {
            let connections = self.active_connections();
            if connections == 0 {
                info!("All connections closed, shutting down");
                return;
            }

            tokio::select! {
                _ = &mut deadline => {
                    warn!(connections, "Shutdown timeout reached, forcing exit");
                    return;
                }
                _ = tokio::time::sleep(Duration::from_millis(100)) => {
                    debug!(connections, "Waiting for connections to close");
                }
            }
        }
    }
}
