//! Integration tests for the server core on the simulated backend.

use std::sync::Arc;
use std::time::Duration;

use btlink::backend::sim::{PeerScript, SimStack};
use btlink::{BluetoothAddress, Error, ResolveReason, RfcommServer, ServerConfig};

async fn start_server(stack: &SimStack, config: ServerConfig) -> RfcommServer {
    let socket = stack.socket().expect("sim socket");
    RfcommServer::start_with(Box::new(socket), config)
        .await
        .expect("server start")
}

#[tokio::test]
async fn test_start_stop_leaks_nothing_on_every_channel() {
    for channel in 1..=30 {
        let stack = SimStack::new();
        let server = start_server(&stack, ServerConfig::new(channel)).await;
        assert_eq!(stack.live_resources(), 1);
        server.stop().await;
        assert_eq!(stack.live_resources(), 0, "channel {} leaked", channel);
    }
}

#[tokio::test]
async fn test_failed_start_leaks_nothing() {
    let stack = SimStack::new();
    let socket = stack.socket().unwrap();
    let err = RfcommServer::start_with(Box::new(socket), ServerConfig::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    // The socket was created but the server never took ownership of a
    // validated config; nothing may stay open.
    assert_eq!(stack.live_resources(), 0);
}

#[tokio::test]
async fn test_accept_after_stop_fails_stopped() {
    let stack = SimStack::new();
    let server = start_server(&stack, ServerConfig::new(3)).await;
    server.stop().await;
    let err = server.accept_one(None).await.unwrap_err();
    assert!(matches!(err, Error::Stopped));
    // Idempotent: a second stop neither errors nor double-closes.
    server.stop().await;
    assert_eq!(stack.live_resources(), 0);
}

#[tokio::test]
async fn test_accept_resolves_peer_address() {
    let stack = SimStack::new();
    let config = ServerConfig::new(3).with_backlog(1);
    let server = start_server(&stack, config).await;

    let addr = BluetoothAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    let _client = stack.connect_peer(addr);

    let conn = server.accept_one(None).await.expect("accept");
    assert_eq!(conn.peer_address(), addr);
    assert_eq!(conn.peer_address().to_string(), "AA:BB:CC:DD:EE:FF");
    server.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_accept_times_out() {
    let stack = SimStack::new();
    let config = ServerConfig::new(3).with_accept_timeout(Duration::from_millis(50));
    let server = start_server(&stack, config).await;

    let started = tokio::time::Instant::now();
    let err = server.accept_one(None).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, Error::Timeout));
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(100));
    server.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_explicit_timeout_overrides_config() {
    let stack = SimStack::new();
    let config = ServerConfig::new(3).with_accept_timeout(Duration::from_secs(60));
    let server = start_server(&stack, config).await;

    let started = tokio::time::Instant::now();
    let err = server
        .accept_one(Some(Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout));
    assert!(started.elapsed() < Duration::from_secs(1));
    server.stop().await;
}

#[tokio::test]
async fn test_unresolvable_peer_is_closed_not_leaked() {
    let stack = SimStack::new();
    let server = start_server(&stack, ServerConfig::new(3)).await;

    let _client = stack.connect_peer_scripted(PeerScript::NoRemote);
    // Listener plus the pending peer socket.
    assert_eq!(stack.live_resources(), 2);

    let err = server.accept_one(None).await.unwrap_err();
    assert!(matches!(
        err,
        Error::ResolveFailed(ResolveReason::NoPeerObject)
    ));
    // The rejected peer's socket was closed, not leaked.
    assert_eq!(stack.live_resources(), 1);

    server.stop().await;
    assert_eq!(stack.live_resources(), 0);
}

#[tokio::test]
async fn test_malformed_peer_address_rejected() {
    let stack = SimStack::new();
    let server = start_server(&stack, ServerConfig::new(3)).await;

    let _client = stack.connect_peer_scripted(PeerScript::Malformed("garbage".into()));
    let err = server.accept_one(None).await.unwrap_err();
    assert!(matches!(
        err,
        Error::ResolveFailed(ResolveReason::MalformedAddress)
    ));

    server.stop().await;
    assert_eq!(stack.live_resources(), 0);
}

#[tokio::test]
async fn test_connection_close_is_idempotent() {
    let stack = SimStack::new();
    let server = start_server(&stack, ServerConfig::new(3)).await;

    let addr = "00:11:22:33:44:55".parse().unwrap();
    let _client = stack.connect_peer(addr);
    let mut conn = server.accept_one(None).await.unwrap();
    assert_eq!(stack.live_resources(), 2);

    conn.close().await;
    assert!(conn.is_closed());
    assert_eq!(stack.live_resources(), 1);

    // Second close releases nothing twice.
    conn.close().await;
    assert_eq!(stack.live_resources(), 1);

    let mut buf = [0u8; 8];
    assert!(matches!(conn.recv(&mut buf).await, Err(Error::Closed)));
    assert!(matches!(conn.send(b"x").await, Err(Error::Closed)));

    server.stop().await;
    assert_eq!(stack.live_resources(), 0);
}

#[tokio::test]
async fn test_dropping_connection_releases_socket() {
    let stack = SimStack::new();
    let server = start_server(&stack, ServerConfig::new(3)).await;

    let addr = "00:11:22:33:44:55".parse().unwrap();
    let _client = stack.connect_peer(addr);
    let conn = server.accept_one(None).await.unwrap();
    assert_eq!(stack.live_resources(), 2);

    drop(conn);
    assert_eq!(stack.live_resources(), 1);
    server.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_accept_fails_busy() {
    let stack = SimStack::new();
    let server = Arc::new(start_server(&stack, ServerConfig::new(3)).await);

    let background = {
        let server = server.clone();
        tokio::spawn(async move { server.accept_one(None).await })
    };
    // Let the background accept reach the socket.
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = server
        .accept_one(Some(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Busy));

    server.stop().await;
    let res = background.await.unwrap();
    assert!(matches!(res, Err(Error::Stopped)));
}

#[tokio::test]
async fn test_stop_unblocks_pending_accept() {
    let stack = SimStack::new();
    let server = Arc::new(start_server(&stack, ServerConfig::new(5)).await);

    let pending = {
        let server = server.clone();
        tokio::spawn(async move { server.accept_one(None).await })
    };
    tokio::task::yield_now().await;

    server.stop().await;
    let res = tokio::time::timeout(Duration::from_secs(1), pending)
        .await
        .expect("accept did not unblock")
        .unwrap();
    assert!(matches!(res, Err(Error::Stopped)));
    assert_eq!(stack.live_resources(), 0);
}

#[tokio::test]
async fn test_client_server_exchange() {
    let stack = SimStack::new();
    let server = start_server(&stack, ServerConfig::new(4)).await;

    let addr = "0A:1B:2C:3D:4E:5F".parse().unwrap();
    let mut client = stack.connect_peer(addr);
    let mut conn = server.accept_one(None).await.unwrap();
    assert_eq!(conn.peer_address(), addr);
    assert_eq!(client.peer_address(), stack.local_address());

    client.send(b"ping").await.unwrap();
    let mut buf = [0u8; 16];
    let n = conn.recv(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"ping");

    conn.send(b"pong").await.unwrap();
    let n = client.recv(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"pong");

    conn.close().await;
    client.close().await;
    server.stop().await;
    assert_eq!(stack.live_resources(), 0);
}

#[tokio::test]
async fn test_sequential_accepts_serve_multiple_peers() {
    let stack = SimStack::new();
    let server = start_server(&stack, ServerConfig::new(7).with_backlog(2)).await;

    let first_addr = "11:11:11:11:11:11".parse().unwrap();
    let second_addr = "22:22:22:22:22:22".parse().unwrap();
    let _c1 = stack.connect_peer(first_addr);
    let _c2 = stack.connect_peer(second_addr);

    let first = server.accept_one(None).await.unwrap();
    let second = server.accept_one(None).await.unwrap();
    assert_eq!(first.peer_address(), first_addr);
    assert_eq!(second.peer_address(), second_addr);

    drop(first);
    drop(second);
    server.stop().await;
    assert_eq!(stack.live_resources(), 0);
}
