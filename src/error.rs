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

//! Error types for the RFCOMM server core.
//!
//! Every fallible operation returns one of these variants; no error is
//! reported through sentinels or out-parameters. `close()` is the sole
//! infallible exception, since double-close must be safe.

use std::fmt;

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the RFCOMM server core.
#[derive(Debug, Error)]
pub enum Error {
    /// Creating the native socket resource failed.
    #[error("failed to create RFCOMM socket")]
    CreateFailed,

    /// Binding to the RFCOMM channel failed.
    #[error("failed to bind RFCOMM channel (os error {os_code})")]
    BindFailed { os_code: i32 },

    /// Putting the socket into listening state failed.
    #[error("failed to listen on RFCOMM socket (os error {os_code})")]
    ListenFailed { os_code: i32 },

    /// Accepting an incoming connection failed.
    #[error("failed to accept connection (os error {os_code})")]
    AcceptFailed { os_code: i32 },

    /// The operation did not complete within the configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// The server has been stopped.
    #[error("server is stopped")]
    Stopped,

    /// Another accept is already in flight on this server.
    #[error("another accept is already in progress")]
    Busy,

    /// The peer's Bluetooth address could not be resolved.
    #[error("failed to resolve peer address: {0}")]
    ResolveFailed(ResolveReason),

    /// An I/O operation on a connection failed.
    #[error("I/O error (os error {os_code})")]
    Io { os_code: i32 },

    /// The connection has been closed.
    #[error("connection is closed")]
    Closed,

    /// The server configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wrap an I/O error from a connection stream.
    pub(crate) fn io(err: &std::io::Error) -> Self {
        Error::Io {
            os_code: os_code(err),
        }
    }
}

/// Extract the OS error code, or -1 when the platform did not supply one.
pub(crate) fn os_code(err: &std::io::Error) -> i32 {
    err.raw_os_error().unwrap_or(-1)
}

/// Why peer address resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveReason {
    /// The accepted connection carries no remote-device handle.
    NoPeerObject,
    /// The platform cannot perform the address lookup.
    LookupUnavailable,
    /// The platform returned an address string that is not in canonical form.
    MalformedAddress,
}

impl fmt::Display for ResolveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveReason::NoPeerObject => write!(f, "no remote device object"),
            ResolveReason::LookupUnavailable => write!(f, "address lookup unavailable"),
            ResolveReason::MalformedAddress => write!(f, "malformed address string"),
        }
    }
}
