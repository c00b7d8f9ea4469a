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

//! Platform socket abstraction.
//!
//! The server core is written once against these traits; each host
//! Bluetooth stack supplies its own implementations (see [`crate::backend`]).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, ResolveReason, Result};

/// One native RFCOMM listening socket.
///
/// The resource is exclusively owned by its `PlatformSocket`; it is never
/// duplicated or shared. Whichever step fails, the owner releases the
/// resource by calling [`close`](PlatformSocket::close) exactly once.
#[async_trait]
pub trait PlatformSocket: Send {
    /// Bind to an RFCOMM channel.
    async fn bind(&mut self, channel: u8) -> Result<()>;

    /// Start listening with the given backlog.
    async fn listen(&mut self, backlog: usize) -> Result<()>;

    /// Wait for an incoming connection.
    async fn accept(&mut self) -> Result<RawPeer>;

    /// Release the underlying resource. Idempotent; never fails observably.
    async fn close(&mut self);

    /// Wait for an incoming connection, giving up after `timeout`.
    ///
    /// `None` blocks indefinitely.
    async fn accept_timeout(&mut self, timeout: Option<Duration>) -> Result<RawPeer> {
        match timeout {
            None => self.accept().await,
            Some(duration) => match tokio::time::timeout(duration, self.accept()).await {
                Ok(res) => res,
                Err(_) => Err(Error::Timeout),
            },
        }
    }
}

/// Byte stream of one connected peer.
#[async_trait]
pub trait PeerStream: Send {
    /// Write bytes, returning how many were accepted.
    async fn send(&mut self, buf: &[u8]) -> Result<usize>;

    /// Read bytes, returning how many were read. Zero means end of stream.
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Release the stream's resource. Idempotent; never fails observably.
    async fn close(&mut self);
}

/// Handle to the remote device object behind an accepted connection.
///
/// This is the seam where platforms differ: a native stack reads the
/// address out of the accept-time socket address, while a managed runtime
/// walks a reflective lookup chain that can come up empty at each step.
pub trait RemoteDevice: Send {
    /// Look up the device's address in the platform's own string form.
    fn address_string(&self) -> std::result::Result<String, ResolveReason>;
}

/// An accepted connection whose peer address has not been resolved yet.
pub struct RawPeer {
    stream: Box<dyn PeerStream>,
    remote: Option<Box<dyn RemoteDevice>>,
}

impl RawPeer {
    /// Assemble a raw peer from backend parts.
    pub fn new(stream: Box<dyn PeerStream>, remote: Option<Box<dyn RemoteDevice>>) -> Self {
        Self { stream, remote }
    }

    /// The remote device handle, if the backend produced one.
    pub fn remote(&self) -> Option<&dyn RemoteDevice> {
        self.remote.as_deref()
    }

    /// Take ownership of the byte stream.
    pub(crate) fn into_stream(self) -> Box<dyn PeerStream> {
        self.stream
    }

    /// Close the peer's stream and drop it.
    pub(crate) async fn discard(mut self) {
        self.stream.close().await;
    }
}

impl std::fmt::Debug for RawPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawPeer")
            .field("has_remote", &self.remote.is_some())
            .finish()
    }
}
