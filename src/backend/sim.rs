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

//! Simulated in-memory Bluetooth stack.
//!
//! Stands in for a real radio on hosts without one and in tests. Peers are
//! injected with [`SimStack::connect_peer`]; data flows over in-memory
//! duplex streams. The stack counts live socket resources so tests can
//! assert that nothing leaks, and scripted peers can fail each step of the
//! address lookup chain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use tracing::debug;

use crate::address::BluetoothAddress;
use crate::connection::ConnectionHandle;
use crate::error::{Error, ResolveReason, Result};
use crate::socket::{PeerStream, PlatformSocket, RawPeer, RemoteDevice};

const STREAM_CAPACITY: usize = 8192;

// OS error codes surfaced by the simulated stack.
const EINVAL: i32 = 22;
const ECONNABORTED: i32 = 103;

/// Address of the simulated local adapter (locally administered).
const LOCAL_ADDRESS: BluetoothAddress = BluetoothAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);

/// How a simulated peer answers the address lookup chain.
#[derive(Debug, Clone)]
pub enum PeerScript {
    /// Well-behaved peer with this address.
    Address(BluetoothAddress),
    /// The remote-device lookup yields nothing.
    NoRemote,
    /// The platform lookup API is unavailable.
    LookupUnavailable,
    /// The lookup yields this non-canonical address string.
    Malformed(String),
}

struct Incoming {
    stream: SimStream,
    remote: Option<SimRemote>,
}

/// Simulated Bluetooth stack.
///
/// Hands out at most one listening socket; remote peers are injected from
/// the test side and queued until accepted.
pub struct SimStack {
    peers_tx: mpsc::UnboundedSender<Incoming>,
    peers_rx: StdMutex<Option<mpsc::UnboundedReceiver<Incoming>>>,
    live: Arc<AtomicUsize>,
}

impl SimStack {
    pub fn new() -> Self {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        Self {
            peers_tx,
            peers_rx: StdMutex::new(Some(peers_rx)),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Address of the simulated local adapter.
    pub fn local_address(&self) -> BluetoothAddress {
        LOCAL_ADDRESS
    }

    /// Number of local socket resources currently open (listener plus
    /// accepted or pending server-side streams).
    pub fn live_resources(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Create the stack's listening socket resource.
    ///
    /// Fails with [`Error::CreateFailed`] on a second call; the simulated
    /// adapter backs exactly one server socket.
    pub fn socket(&self) -> Result<SimSocket> {
        let rx = self
            .peers_rx
            .lock()
            .expect("sim stack lock poisoned")
            .take()
            .ok_or(Error::CreateFailed)?;
        Ok(SimSocket::new(rx, self.live.clone()))
    }

    /// Simulate a remote device connecting with the given address.
    ///
    /// Returns the remote side of the connection as a handle whose peer is
    /// the simulated local adapter.
    pub fn connect_peer(&self, address: BluetoothAddress) -> ConnectionHandle {
        self.connect_peer_scripted(PeerScript::Address(address))
    }

    /// Simulate a remote device whose address lookup follows `script`.
    pub fn connect_peer_scripted(&self, script: PeerScript) -> ConnectionHandle {
        let (server_io, client_io) = duplex(STREAM_CAPACITY);
        let remote = match script {
            PeerScript::Address(address) => Some(SimRemote(Ok(address.to_string()))),
            PeerScript::NoRemote => None,
            PeerScript::LookupUnavailable => Some(SimRemote(Err(ResolveReason::LookupUnavailable))),
            PeerScript::Malformed(raw) => Some(SimRemote(Ok(raw))),
        };
        let incoming = Incoming {
            stream: SimStream::new(server_io, Some(self.live.clone())),
            remote,
        };
        // If the listener is gone the peer's stream simply reports EOF.
        let _ = self.peers_tx.send(incoming);
        ConnectionHandle::new(Box::new(SimStream::new(client_io, None)), LOCAL_ADDRESS)
    }
}

impl Default for SimStack {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimStack")
            .field("live_resources", &self.live_resources())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocketState {
    Created,
    Bound,
    Listening,
}

/// The simulated listening socket.
pub struct SimSocket {
    state: SocketState,
    rx: Option<mpsc::UnboundedReceiver<Incoming>>,
    live: Arc<AtomicUsize>,
    closed: bool,
}

impl SimSocket {
    fn new(rx: mpsc::UnboundedReceiver<Incoming>, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            state: SocketState::Created,
            rx: Some(rx),
            live,
            closed: false,
        }
    }
}

#[async_trait]
impl PlatformSocket for SimSocket {
    async fn bind(&mut self, channel: u8) -> Result<()> {
        if self.closed || self.state != SocketState::Created {
            return Err(Error::BindFailed { os_code: EINVAL });
        }
        debug!("Sim socket bound to channel {}", channel);
        self.state = SocketState::Bound;
        Ok(())
    }

    async fn listen(&mut self, backlog: usize) -> Result<()> {
        if self.closed || self.state != SocketState::Bound {
            return Err(Error::ListenFailed { os_code: EINVAL });
        }
        debug!("Sim socket listening (backlog {})", backlog);
        self.state = SocketState::Listening;
        Ok(())
    }

    async fn accept(&mut self) -> Result<RawPeer> {
        if self.closed || self.state != SocketState::Listening {
            return Err(Error::AcceptFailed { os_code: EINVAL });
        }
        let rx = self.rx.as_mut().ok_or(Error::AcceptFailed { os_code: EINVAL })?;
        match rx.recv().await {
            Some(incoming) => Ok(RawPeer::new(
                Box::new(incoming.stream),
                incoming
                    .remote
                    .map(|remote| Box::new(remote) as Box<dyn RemoteDevice>),
            )),
            // Stack dropped out from under the socket.
            None => Err(Error::AcceptFailed {
                os_code: ECONNABORTED,
            }),
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.rx = None;
            self.live.fetch_sub(1, Ordering::SeqCst);
            debug!("Sim socket closed");
        }
    }
}

impl Drop for SimSocket {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// One side of a simulated connection.
pub struct SimStream {
    io: DuplexStream,
    // Only server-side streams count against the stack's resource total.
    live: Option<Arc<AtomicUsize>>,
    released: bool,
}

impl SimStream {
    fn new(io: DuplexStream, live: Option<Arc<AtomicUsize>>) -> Self {
        if let Some(live) = &live {
            live.fetch_add(1, Ordering::SeqCst);
        }
        Self {
            io,
            live,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            if let Some(live) = &self.live {
                live.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }
}

#[async_trait]
impl PeerStream for SimStream {
    async fn send(&mut self, buf: &[u8]) -> Result<usize> {
        self.io.write(buf).await.map_err(|err| Error::io(&err))
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.io.read(buf).await.map_err(|err| Error::io(&err))
    }

    async fn close(&mut self) {
        let _ = self.io.shutdown().await;
        self.release();
    }
}

impl Drop for SimStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Scripted remote-device handle.
struct SimRemote(std::result::Result<String, ResolveReason>);

impl RemoteDevice for SimRemote {
    fn address_string(&self) -> std::result::Result<String, ResolveReason> {
        self.0.clone()
    }
}
