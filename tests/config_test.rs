//! Tests for loading server configuration from TOML files.

use std::time::Duration;

use btlink::{Error, ServerConfig};

#[test]
fn test_load_full_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("btlink.toml");
    std::fs::write(
        &path,
        "channel = 3\nbacklog = 4\n\n[accept_timeout]\nsecs = 0\nnanos = 50000000\n",
    )
    .unwrap();

    let config = ServerConfig::load(&path).unwrap();
    assert_eq!(config.channel, 3);
    assert_eq!(config.backlog, 4);
    assert_eq!(config.accept_timeout, Some(Duration::from_millis(50)));
}

#[test]
fn test_load_applies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("btlink.toml");
    std::fs::write(&path, "channel = 7\n").unwrap();

    let config = ServerConfig::load(&path).unwrap();
    assert_eq!(config.channel, 7);
    assert_eq!(config.backlog, btlink::config::DEFAULT_BACKLOG);
    assert_eq!(config.accept_timeout, None);
}

#[test]
fn test_load_rejects_out_of_range_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("btlink.toml");
    std::fs::write(&path, "channel = 99\n").unwrap();

    let err = ServerConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServerConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_round_trip_through_toml() {
    let config = ServerConfig::new(5)
        .with_backlog(2)
        .with_accept_timeout(Duration::from_millis(250));
    let text = toml::to_string(&config).unwrap();
    let parsed: ServerConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed.channel, config.channel);
    assert_eq!(parsed.backlog, config.backlog);
    assert_eq!(parsed.accept_timeout, config.accept_timeout);
}
