// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! RFCOMM server orchestration.

use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::connection::ConnectionHandle;
use crate::error::{Error, Result};
use crate::resolver::AddressResolver;
use crate::socket::PlatformSocket;

/// RFCOMM server: binds and listens on construction, hands out one
/// accepted connection at a time.
pub struct RfcommServer {
    socket: Mutex<Box<dyn PlatformSocket>>,
    resolver: AddressResolver,
    config: ServerConfig,
    // Serializes accept_one; a second concurrent caller gets Busy.
    accept_gate: Mutex<()>,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
}

impl RfcommServer {
    /// Start a server on the default platform backend.
    ///
    /// Binds and listens immediately; nothing is deferred to the first
    /// accept.
    #[cfg(target_os = "linux")]
    pub async fn start(config: ServerConfig) -> Result<Self> {
        let socket = crate::backend::bluez::BluezSocket::create()?;
        Self::start_with(Box::new(socket), config).await
    }

    /// Start a server on an explicit backend.
    ///
    /// On bind or listen failure the socket is closed before the error is
    /// returned, so no resource outlives a failed start.
    pub async fn start_with(mut socket: Box<dyn PlatformSocket>, config: ServerConfig) -> Result<Self> {
        if let Err(err) = config.validate() {
            socket.close().await;
            return Err(err);
        }
        if let Err(err) = socket.bind(config.channel).await {
            socket.close().await;
            return Err(err);
        }
        if let Err(err) = socket.listen(config.backlog).await {
            socket.close().await;
            return Err(err);
        }
        info!(
            "RFCOMM server listening on channel {} (backlog {})",
            config.channel, config.backlog
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        Ok(Self {
            socket: Mutex::new(socket),
            resolver: AddressResolver::new(),
            config,
            accept_gate: Mutex::new(()),
            stop_tx,
            stop_rx,
        })
    }

    /// The configuration this server was started with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept the next incoming connection.
    ///
    /// Blocks until a peer connects, the timeout elapses, or
    /// [`RfcommServer::stop`] is called. An explicit `timeout` overrides
    /// [`ServerConfig::accept_timeout`]; `None` falls back to it.
    ///
    /// The peer's address is resolved before the handle is returned; a
    /// connection whose address cannot be resolved is closed immediately
    /// and the call fails with [`Error::ResolveFailed`]. Only one call may
    /// be in flight per server; concurrent callers fail with
    /// [`Error::Busy`].
    pub async fn accept_one(&self, timeout: Option<Duration>) -> Result<ConnectionHandle> {
        let _gate = self.accept_gate.try_lock().map_err(|_| Error::Busy)?;

        let mut stop_rx = self.stop_rx.clone();
        if *stop_rx.borrow() {
            return Err(Error::Stopped);
        }

        let timeout = timeout.or(self.config.accept_timeout);
        let peer = {
            let mut socket = self.socket.lock().await;
            tokio::select! {
                // wait_for checks the current value first, so a stop that
                // lands between the borrow above and this await still wins.
                _ = stop_rx.wait_for(|stopped| *stopped) => {
                    return Err(Error::Stopped);
                }
                res = socket.accept_timeout(timeout) => res?,
            }
        };

        match self.resolver.resolve(&peer) {
            Ok(address) => {
                info!("Accepted connection from {}", address);
                Ok(ConnectionHandle::new(peer.into_stream(), address))
            }
            Err(err) => {
                warn!("Rejecting peer with unresolvable address: {}", err);
                peer.discard().await;
                Err(err)
            }
        }
    }

    /// Stop the server.
    ///
    /// Unblocks any in-flight `accept_one` with [`Error::Stopped`], and all
    /// future calls fail the same way. Idempotent; the listening socket is
    /// closed exactly once.
    pub async fn stop(&self) {
        let was_stopped = self.stop_tx.send_replace(true);
        if was_stopped {
            return;
        }
        // The watch signal makes a blocked accept_one release the socket
        // lock before we take it here.
        self.socket.lock().await.close().await;
        info!("RFCOMM server stopped");
    }
}

impl std::fmt::Debug for RfcommServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RfcommServer")
            .field("config", &self.config)
            .field("stopped", &*self.stop_rx.borrow())
            .finish()
    }
}

/// Outbound RFCOMM dialing on the default platform backend.
#[cfg(target_os = "linux")]
#[derive(Debug, Clone, Copy)]
pub struct RfcommClient;

#[cfg(target_os = "linux")]
impl RfcommClient {
    /// Connect to a remote RFCOMM server.
    pub async fn connect(
        address: crate::address::BluetoothAddress,
        channel: u8,
    ) -> Result<ConnectionHandle> {
        crate::backend::bluez::connect(address, channel).await
    }
}
