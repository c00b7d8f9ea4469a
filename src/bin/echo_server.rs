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

//! Minimal RFCOMM echo server on the BlueZ backend.
//!
//! Usage: `echo_server [channel]` (default channel 1).

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> btlink::Result<()> {
    use btlink::{RfcommServer, ServerConfig};
    use tracing::{error, info};

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let channel = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1);

    let server = RfcommServer::start(ServerConfig::new(channel)).await?;
    info!("Echo server listening on channel {}", channel);

    loop {
        match server.accept_one(None).await {
            Ok(mut conn) => {
                info!("Connection from {}", conn.peer_address());
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    loop {
                        match conn.recv(&mut buf).await {
                            Ok(0) => break,
                            Ok(n) => {
                                if let Err(err) = conn.send(&buf[..n]).await {
                                    error!("Write failed: {}", err);
                                    break;
                                }
                            }
                            Err(err) => {
                                error!("Read failed: {}", err);
                                break;
                            }
                        }
                    }
                    conn.close().await;
                    info!("Connection closed");
                });
            }
            Err(err) => {
                error!("Accept failed: {}", err);
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("echo_server requires the BlueZ backend (Linux)");
    std::process::exit(1);
}
