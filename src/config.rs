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

//! Server configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{os_code, Error, Result};

/// Lowest valid RFCOMM channel number.
pub const MIN_CHANNEL: u8 = 1;

/// Highest valid RFCOMM channel number.
pub const MAX_CHANNEL: u8 = 30;

/// Default listen backlog.
pub const DEFAULT_BACKLOG: usize = 10;

/// Immutable configuration for an [`RfcommServer`](crate::RfcommServer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// RFCOMM channel to listen on (1-30).
    pub channel: u8,

    /// Maximum number of pending connections queued by the listener.
    #[serde(default = "default_backlog")]
    pub backlog: usize,

    /// Default timeout for accept operations. `None` blocks indefinitely.
    #[serde(default)]
    pub accept_timeout: Option<Duration>,
}

fn default_backlog() -> usize {
    DEFAULT_BACKLOG
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            channel: 1,
            backlog: DEFAULT_BACKLOG,
            accept_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Create a configuration for the given channel with default backlog
    /// and no accept timeout.
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            ..Self::default()
        }
    }

    /// Set the listen backlog.
    pub fn with_backlog(mut self, backlog: usize) -> Self {
        self.backlog = backlog;
        self
    }

    /// Set the default accept timeout.
    pub fn with_accept_timeout(mut self, timeout: Duration) -> Self {
        self.accept_timeout = Some(timeout);
        self
    }

    /// Check channel and backlog bounds.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&self.channel) {
            return Err(Error::InvalidConfig(format!(
                "channel {} out of range {}-{}",
                self.channel, MIN_CHANNEL, MAX_CHANNEL
            )));
        }
        if self.backlog == 0 {
            return Err(Error::InvalidConfig("backlog must be at least 1".into()));
        }
        Ok(())
    }

    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| Error::Io {
            os_code: os_code(&err),
        })?;
        let config: Self =
            toml::from_str(&content).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_channels() {
        for channel in MIN_CHANNEL..=MAX_CHANNEL {
            assert!(ServerConfig::new(channel).validate().is_ok());
        }
    }

    #[test]
    fn test_channel_out_of_range() {
        assert!(matches!(
            ServerConfig::new(0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ServerConfig::new(31).validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_backlog_rejected() {
        let config = ServerConfig::new(3).with_backlog(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_builder() {
        let config = ServerConfig::new(5)
            .with_backlog(2)
            .with_accept_timeout(Duration::from_millis(50));
        assert_eq!(config.channel, 5);
        assert_eq!(config.backlog, 2);
        assert_eq!(config.accept_timeout, Some(Duration::from_millis(50)));
    }
}
