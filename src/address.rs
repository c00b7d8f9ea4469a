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

//! Canonical Bluetooth device addresses.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 6-byte Bluetooth device address.
///
/// Rendered as colon-separated uppercase hex, e.g. `"00:11:22:33:44:55"`.
/// Immutable once constructed; equality is byte-wise. Bytes are stored in
/// display order (most significant first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BluetoothAddress([u8; 6]);

impl BluetoothAddress {
    /// Create an address from raw bytes in display order.
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// The raw address bytes in display order.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for BluetoothAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Error returned when a string is not a canonical Bluetooth address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressParseError;

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid Bluetooth address")
    }
}

impl std::error::Error for AddressParseError {}

impl FromStr for BluetoothAddress {
    type Err = AddressParseError;

    /// Parse the canonical form: six two-digit hex groups separated by
    /// colons. Lowercase hex digits are accepted; anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or(AddressParseError)?;
            if part.len() != 2 {
                return Err(AddressParseError);
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| AddressParseError)?;
        }
        if parts.next().is_some() {
            return Err(AddressParseError);
        }
        Ok(Self(bytes))
    }
}

impl Serialize for BluetoothAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BluetoothAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uppercase_hex() {
        let addr = BluetoothAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(addr.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_parse_round_trip() {
        let addr: BluetoothAddress = "00:11:22:33:44:55".parse().unwrap();
        assert_eq!(addr.as_bytes(), &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(addr.to_string().parse::<BluetoothAddress>().unwrap(), addr);
    }

    #[test]
    fn test_parse_accepts_lowercase() {
        let addr: BluetoothAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(addr.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("".parse::<BluetoothAddress>().is_err());
        assert!("00:11:22:33:44".parse::<BluetoothAddress>().is_err());
        assert!("00:11:22:33:44:55:66".parse::<BluetoothAddress>().is_err());
        assert!("00:11:22:33:44:5".parse::<BluetoothAddress>().is_err());
        assert!("00:11:22:33:44:GG".parse::<BluetoothAddress>().is_err());
        assert!("001122334455".parse::<BluetoothAddress>().is_err());
    }

    #[test]
    fn test_equality_is_byte_wise() {
        let a = BluetoothAddress::new([1, 2, 3, 4, 5, 6]);
        let b = BluetoothAddress::new([1, 2, 3, 4, 5, 6]);
        let c = BluetoothAddress::new([6, 5, 4, 3, 2, 1]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
