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

//! Individual accepted peer connection.

use tracing::debug;

use crate::address::BluetoothAddress;
use crate::error::{Error, Result};
use crate::socket::PeerStream;

/// One accepted peer connection.
///
/// Owns the peer's socket and caches the address resolved at accept time.
/// The state machine is one-way: Open -> Closed. After
/// [`ConnectionHandle::close`] every I/O call fails with [`Error::Closed`];
/// close itself is idempotent.
pub struct ConnectionHandle {
    stream: Option<Box<dyn PeerStream>>,
    peer: BluetoothAddress,
}

impl ConnectionHandle {
    pub(crate) fn new(stream: Box<dyn PeerStream>, peer: BluetoothAddress) -> Self {
        Self {
            stream: Some(stream),
            peer,
        }
    }

    /// The peer's address, resolved when the connection was accepted.
    pub fn peer_address(&self) -> BluetoothAddress {
        self.peer
    }

    /// Whether the connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Write bytes to the peer.
    pub async fn send(&mut self, buf: &[u8]) -> Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.send(buf).await,
            None => Err(Error::Closed),
        }
    }

    /// Read bytes from the peer. Returns zero at end of stream.
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.recv(buf).await,
            None => Err(Error::Closed),
        }
    }

    /// Close the connection. Idempotent; the socket is released exactly
    /// once no matter how many times this is called.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close().await;
            debug!("Connection to {} closed", self.peer);
        }
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("peer", &self.peer)
            .field("closed", &self.is_closed())
            .finish()
    }
}
