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

//! Peer address resolution.

use tracing::{debug, warn};

use crate::address::BluetoothAddress;
use crate::error::{Error, ResolveReason, Result};
use crate::socket::RawPeer;

/// Resolves an accepted peer's Bluetooth address into canonical form.
///
/// Resolution is a pure read: it never mutates or closes the peer. The
/// lookup runs step by step and a missing result at any step maps to a
/// typed [`ResolveReason`], never a panic or an undefined value.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressResolver;

impl AddressResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the peer's address.
    pub fn resolve(&self, peer: &RawPeer) -> Result<BluetoothAddress> {
        let remote = match peer.remote() {
            Some(remote) => remote,
            None => return Err(self.fail(ResolveReason::NoPeerObject)),
        };
        let raw = match remote.address_string() {
            Ok(raw) => raw,
            Err(reason) => return Err(self.fail(reason)),
        };
        match raw.parse::<BluetoothAddress>() {
            Ok(address) => {
                debug!("Resolved peer address: {}", address);
                Ok(address)
            }
            Err(_) => {
                warn!("Peer returned malformed address string: {:?}", raw);
                Err(Error::ResolveFailed(ResolveReason::MalformedAddress))
            }
        }
    }

    fn fail(&self, reason: ResolveReason) -> Error {
        warn!("Address resolution failed: {}", reason);
        Error::ResolveFailed(reason)
    }
}
