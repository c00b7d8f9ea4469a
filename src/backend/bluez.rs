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

//! BlueZ RFCOMM backend (Linux).

use async_trait::async_trait;
use bluer::rfcomm::{Listener, SocketAddr, Stream};
use bluer::Address;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info};

use crate::address::BluetoothAddress;
use crate::connection::ConnectionHandle;
use crate::error::{Error, ResolveReason, Result};
use crate::socket::{PeerStream, PlatformSocket, RawPeer, RemoteDevice};

// bluer reports failures without a raw OS error code.
const UNKNOWN_OS_CODE: i32 = -1;

/// RFCOMM listening socket backed by BlueZ.
pub struct BluezSocket {
    channel: Option<u8>,
    listener: Option<Listener>,
}

impl BluezSocket {
    /// Create an unbound RFCOMM socket resource.
    pub fn create() -> Result<Self> {
        Ok(Self {
            channel: None,
            listener: None,
        })
    }
}

#[async_trait]
impl PlatformSocket for BluezSocket {
    async fn bind(&mut self, channel: u8) -> Result<()> {
        let local = SocketAddr::new(Address::any(), channel);
        match Listener::bind(local).await {
            Ok(listener) => {
                self.listener = Some(listener);
                self.channel = Some(channel);
                Ok(())
            }
            Err(err) => {
                error!("RFCOMM bind on channel {} failed: {}", channel, err);
                Err(Error::BindFailed {
                    os_code: UNKNOWN_OS_CODE,
                })
            }
        }
    }

    async fn listen(&mut self, _backlog: usize) -> Result<()> {
        // Listener::bind has already put the socket into listening state;
        // BlueZ manages the backlog itself.
        match &self.listener {
            Some(_) => {
                info!(
                    "RFCOMM listener ready on channel {}",
                    self.channel.unwrap_or_default()
                );
                Ok(())
            }
            None => Err(Error::ListenFailed {
                os_code: UNKNOWN_OS_CODE,
            }),
        }
    }

    async fn accept(&mut self) -> Result<RawPeer> {
        let listener = self.listener.as_mut().ok_or(Error::AcceptFailed {
            os_code: UNKNOWN_OS_CODE,
        })?;
        match listener.accept().await {
            Ok((stream, peer)) => Ok(RawPeer::new(
                Box::new(BluezStream::new(stream)),
                Some(Box::new(BluezRemote(peer.addr))),
            )),
            Err(err) => {
                error!("RFCOMM accept failed: {}", err);
                Err(Error::AcceptFailed {
                    os_code: UNKNOWN_OS_CODE,
                })
            }
        }
    }

    async fn close(&mut self) {
        // Dropping the listener releases the socket.
        self.listener = None;
    }
}

/// Connect to a remote RFCOMM server.
pub async fn connect(address: BluetoothAddress, channel: u8) -> Result<ConnectionHandle> {
    let peer = SocketAddr::new(Address::new(*address.as_bytes()), channel);
    match Stream::connect(peer).await {
        Ok(stream) => {
            info!("Connected to {} on channel {}", address, channel);
            Ok(ConnectionHandle::new(
                Box::new(BluezStream::new(stream)),
                address,
            ))
        }
        Err(err) => {
            error!("RFCOMM connect to {} failed: {}", address, err);
            Err(Error::Io {
                os_code: UNKNOWN_OS_CODE,
            })
        }
    }
}

/// Connected RFCOMM byte stream backed by BlueZ.
pub struct BluezStream {
    stream: Option<Stream>,
}

impl BluezStream {
    fn new(stream: Stream) -> Self {
        Self {
            stream: Some(stream),
        }
    }
}

#[async_trait]
impl PeerStream for BluezStream {
    async fn send(&mut self, buf: &[u8]) -> Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.write(buf).await.map_err(|err| Error::io(&err)),
            None => Err(Error::Closed),
        }
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.read(buf).await.map_err(|err| Error::io(&err)),
            None => Err(Error::Closed),
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}

/// Remote-device handle taken from the accept-time socket address.
struct BluezRemote(Address);

impl RemoteDevice for BluezRemote {
    fn address_string(&self) -> std::result::Result<String, ResolveReason> {
        Ok(self.0.to_string())
    }
}
