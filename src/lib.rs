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

//! Cross-platform Bluetooth RFCOMM server core.
//!
//! Accepts incoming RFCOMM connections, resolves each peer's Bluetooth
//! address into canonical form before the connection is handed out, and
//! manages socket lifecycle so that no resource leaks on any error path.
//!
//! The core logic (bind, listen, accept, resolve) is written once against
//! the traits in [`socket`]; platform Bluetooth stacks plug in as backends
//! ([`backend::bluez`] on Linux, [`backend::sim`] for tests and hosts
//! without a radio).
//!
//! ```no_run
//! use btlink::{RfcommServer, ServerConfig};
//!
//! # async fn run() -> btlink::Result<()> {
//! let server = RfcommServer::start(ServerConfig::new(3)).await?;
//! let mut conn = server.accept_one(None).await?;
//! println!("peer: {}", conn.peer_address());
//! conn.send(b"hello").await?;
//! conn.close().await;
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod backend;
pub mod config;
pub mod connection;
pub mod error;
pub mod resolver;
pub mod server;
pub mod socket;

pub use address::{AddressParseError, BluetoothAddress};
pub use config::ServerConfig;
pub use connection::ConnectionHandle;
pub use error::{Error, ResolveReason, Result};
pub use resolver::AddressResolver;
#[cfg(target_os = "linux")]
pub use server::RfcommClient;
pub use server::RfcommServer;
pub use socket::{PeerStream, PlatformSocket, RawPeer, RemoteDevice};
