//! Unit tests for config module
//!
//! Tests configuration defaults, TOML parsing and the resolution of the
//! daemon address, password and bus name.

#![allow(clippy::panic)]

use std::{fs, path::PathBuf, process, time::Duration};

use tempfile::TempDir;

use crate::{
    AppError,
    config::{Config, ConfigPaths, LogLevel, MpdConfig, MpdEnvironment, MprisConfig, Network},
    services::mpd::Address,
};

fn tcp(host: &str, port: u16) -> Address {
    Address::Tcp {
        host: host.to_string(),
        port,
    }
}

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert_eq!(config.mpd.network, Network::Tcp);
    assert!(config.mpd.host.is_empty());
    assert!(config.mpris.album_art);
    assert_eq!(config.sync.keepalive_secs, 25);
    assert_eq!(config.sync.seek_trigger_ms, 2000);
    assert!(config.sync.position_interpolation);
}

#[test]
fn config_empty_toml() {
    let config = Config::parse("", None).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        [general]
        log_level = "debug"

        [mpd]
        network = "unix"
        host = "/run/mpd/socket"

        [mpris]
        instance_name = "desk"
        album_art = false

        [sync]
        keepalive_secs = 10
        volume_dead_band = 0.01
    "#;

    let config = Config::parse(toml_str, None).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.mpd.network, Network::Unix);
    assert_eq!(config.mpd.host, "/run/mpd/socket");
    assert_eq!(config.mpris.instance_name, "desk");
    assert!(!config.mpris.album_art);
    assert_eq!(config.sync.keepalive(), Duration::from_secs(10));
    assert_eq!(config.sync.seek_trigger_ms, 2000);
    assert!((config.sync.thresholds().volume_dead_band - 0.01).abs() < f64::EPSILON);
}

#[test]
fn config_serialize_roundtrip() {
    let mut original = Config::default();
    original.mpd.port = Some(6601);
    original.mpris.no_instance = true;

    let toml_str = toml::to_string(&original).unwrap();
    assert!(toml_str.contains("[mpd]"));
    assert!(toml_str.contains("[sync]"));

    assert_eq!(Config::parse(&toml_str, None).unwrap(), original);
}

#[test]
fn config_invalid_toml() {
    let invalid_toml = r#"
        [general
        log_level = "info"
    "#;

    let result = Config::parse(invalid_toml, None);
    assert!(matches!(result, Err(AppError::TomlParseError { .. })));
}

#[test]
fn config_rejects_unknown_log_level() {
    let result = Config::parse("[general]\nlog_level = \"loud\"", None);
    assert!(result.is_err());
}

#[test]
fn config_unknown_fields() {
    let toml_with_unknown = r#"
        [general]
        log_level = "info"
        unknown_field = "should be ignored"

        [unknown_section]
        some_field = "ignored"
    "#;

    let config = Config::parse(toml_with_unknown, None).unwrap();
    assert_eq!(config.general.log_level, LogLevel::Info);
}

#[test]
fn config_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_or_default(&dir.path().join("config.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn config_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[mpd]\nhost = \"music.lan\"\nport = 6601\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.mpd.host, "music.lan");
    assert_eq!(config.mpd.port, Some(6601));
}

#[test]
fn config_paths_prefer_xdg() {
    let dir = ConfigPaths::config_dir_from(Some("/xdg"), Some("/home/u")).unwrap();
    assert_eq!(dir, PathBuf::from("/xdg/mpd-mpris"));

    let dir = ConfigPaths::config_dir_from(None, Some("/home/u")).unwrap();
    assert_eq!(dir, PathBuf::from("/home/u/.config/mpd-mpris"));

    assert!(ConfigPaths::config_dir_from(None, None).is_err());
}

#[test]
fn endpoint_defaults_to_localhost() {
    let endpoint = MpdConfig::default()
        .endpoint(&MpdEnvironment::default())
        .unwrap();

    assert_eq!(endpoint.address, tcp("localhost", 6600));
    assert_eq!(endpoint.password, None);
}

#[test]
fn endpoint_detects_local_socket() {
    let runtime = TempDir::new().unwrap();
    fs::create_dir(runtime.path().join("mpd")).unwrap();
    fs::write(runtime.path().join("mpd").join("socket"), b"").unwrap();

    let environment = MpdEnvironment {
        runtime_dir: Some(runtime.path().to_path_buf()),
        ..MpdEnvironment::default()
    };
    let endpoint = MpdConfig::default().endpoint(&environment).unwrap();

    assert_eq!(
        endpoint.address,
        Address::Unix(runtime.path().join("mpd").join("socket"))
    );
}

#[test]
fn endpoint_ignores_missing_local_socket() {
    let runtime = TempDir::new().unwrap();
    let environment = MpdEnvironment {
        runtime_dir: Some(runtime.path().to_path_buf()),
        ..MpdEnvironment::default()
    };

    let endpoint = MpdConfig::default().endpoint(&environment).unwrap();
    assert_eq!(endpoint.address, tcp("localhost", 6600));
}

#[test]
fn endpoint_parses_mpd_host() {
    let environment = MpdEnvironment {
        host: Some("secret@music.lan".to_string()),
        port: Some("6601".to_string()),
        runtime_dir: None,
    };

    let endpoint = MpdConfig::default().endpoint(&environment).unwrap();
    assert_eq!(endpoint.address, tcp("music.lan", 6601));
    assert_eq!(endpoint.password.as_deref(), Some("secret"));
}

#[test]
fn endpoint_configured_password_beats_mpd_host() {
    let config = MpdConfig {
        password: "mine".to_string(),
        ..MpdConfig::default()
    };
    let environment = MpdEnvironment {
        host: Some("theirs@music.lan".to_string()),
        ..MpdEnvironment::default()
    };

    let endpoint = config.endpoint(&environment).unwrap();
    assert_eq!(endpoint.address, tcp("music.lan", 6600));
    assert_eq!(endpoint.password.as_deref(), Some("mine"));
}

#[test]
fn endpoint_mpd_host_socket_paths() {
    let environment = MpdEnvironment {
        host: Some("/run/mpd/socket".to_string()),
        ..MpdEnvironment::default()
    };
    let endpoint = MpdConfig::default().endpoint(&environment).unwrap();
    assert_eq!(endpoint.address, Address::Unix(PathBuf::from("/run/mpd/socket")));

    let environment = MpdEnvironment {
        host: Some("@mpd".to_string()),
        ..MpdEnvironment::default()
    };
    let endpoint = MpdConfig::default().endpoint(&environment).unwrap();
    assert_eq!(endpoint.address, Address::Abstract("mpd".to_string()));
    assert_eq!(endpoint.password, None);

    let environment = MpdEnvironment {
        host: Some("pw@/run/mpd/socket".to_string()),
        ..MpdEnvironment::default()
    };
    let endpoint = MpdConfig::default().endpoint(&environment).unwrap();
    assert_eq!(endpoint.address, Address::Unix(PathBuf::from("/run/mpd/socket")));
    assert_eq!(endpoint.password.as_deref(), Some("pw"));
}

#[test]
fn endpoint_configured_host_wins() {
    let config = MpdConfig {
        host: "box".to_string(),
        port: Some(7000),
        ..MpdConfig::default()
    };
    let environment = MpdEnvironment {
        host: Some("music.lan".to_string()),
        port: Some("6601".to_string()),
        runtime_dir: None,
    };
    assert_eq!(config.endpoint(&environment).unwrap().address, tcp("box", 7000));

    let config = MpdConfig {
        network: Network::Unix,
        host: "/tmp/mpd.sock".to_string(),
        ..MpdConfig::default()
    };
    assert_eq!(
        config.endpoint(&environment).unwrap().address,
        Address::Unix(PathBuf::from("/tmp/mpd.sock"))
    );
}

#[test]
fn password_file_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pwd");
    fs::write(&path, "hunter2\r\n").unwrap();

    let config = MpdConfig {
        password_file: Some(path),
        ..MpdConfig::default()
    };
    assert_eq!(config.password().unwrap().as_deref(), Some("hunter2"));
}

#[test]
fn empty_password_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pwd");
    fs::write(&path, "\n").unwrap();

    let config = MpdConfig {
        password_file: Some(path),
        ..MpdConfig::default()
    };
    assert!(matches!(
        config.password(),
        Err(AppError::ConfigValidation { .. })
    ));
}

#[test]
fn missing_password_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let config = MpdConfig {
        password_file: Some(dir.path().join("absent")),
        ..MpdConfig::default()
    };
    assert!(matches!(config.password(), Err(AppError::IoError { .. })));
}

#[test]
fn password_sources_are_exclusive() {
    let config = MpdConfig {
        password: "a".to_string(),
        password_file: Some(PathBuf::from("/etc/mpd.pwd")),
        ..MpdConfig::default()
    };
    assert!(config.password().is_err());
}

#[test]
fn bus_name_options() {
    let config = MprisConfig {
        instance_name: "desk".to_string(),
        ..MprisConfig::default()
    };
    assert_eq!(config.bus_name().unwrap(), "org.mpris.MediaPlayer2.mpd.desk");

    let config = MprisConfig {
        no_instance: true,
        ..MprisConfig::default()
    };
    assert_eq!(config.bus_name().unwrap(), "org.mpris.MediaPlayer2.mpd");

    assert_eq!(
        MprisConfig::default().bus_name().unwrap(),
        format!("org.mpris.MediaPlayer2.mpd.instance{}", process::id())
    );

    let config = MprisConfig {
        instance_name: "desk".to_string(),
        no_instance: true,
        album_art: true,
    };
    assert!(config.bus_name().is_err());
}
