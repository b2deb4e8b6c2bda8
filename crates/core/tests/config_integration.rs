//! berth.toml 통합 설정 테스트
//!
//! - berth.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 파일 로딩 / 잘못된 형식 에러 테스트

use std::fs;

use berth_core::config::BerthConfig;
use berth_core::error::{BerthError, ConfigError};
use tempfile::TempDir;

// =============================================================================
// berth.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_and_validates() {
    let content = include_str!("../../../berth.toml.example");
    let config = BerthConfig::parse(content).expect("example config should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../berth.toml.example");
    let from_file = BerthConfig::parse(content).expect("should parse");
    let from_code = BerthConfig::default();

    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);

    let (f, c) = (&from_file.manager, &from_code.manager);
    assert_eq!(f.docker_socket, c.docker_socket);
    assert_eq!(f.docker_timeout_secs, c.docker_timeout_secs);
    assert_eq!(f.name_prefix, c.name_prefix);
    assert_eq!(f.base_path, c.base_path);
    assert_eq!(f.start_port, c.start_port);
    assert_eq!(f.max_port_scan, c.max_port_scan);
    assert_eq!(f.bind_host, c.bind_host);
    assert_eq!(f.image, c.image);
    assert_eq!(f.container_port, c.container_port);
    assert_eq!(f.data_mount, c.data_mount);
    assert_eq!(f.log_stream_timeout_secs, c.log_stream_timeout_secs);
    assert_eq!(f.reconcile_interval_secs, c.reconcile_interval_secs);
}

// =============================================================================
// 부분 설정 로딩 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let toml = r#"
[general]
log_level = "debug"
log_format = "json"
"#;
    let config = BerthConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "json");
    // 나머지 섹션은 기본값
    assert_eq!(config.manager.name_prefix, "gameserver");
}

#[test]
fn partial_config_manager_only() {
    let toml = r#"
[manager]
base_path = "/srv/servers"
image = "itzg/minecraft-server:java21"
"#;
    let config = BerthConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.manager.base_path, "/srv/servers");
    assert_eq!(config.manager.image, "itzg/minecraft-server:java21");
    assert_eq!(config.general.log_level, "info");
}

#[test]
fn invalid_value_reports_field() {
    let toml = r#"
[manager]
max_port_scan = 0
"#;
    let config = BerthConfig::parse(toml).expect("should parse");
    match config.validate() {
        Err(BerthError::Config(ConfigError::InvalidValue { field, .. })) => {
            assert_eq!(field, "manager.max_port_scan");
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_parse_error() {
    let toml = r#"
[manager]
start_port = "ten thousand"
"#;
    assert!(matches!(
        BerthConfig::parse(toml),
        Err(BerthError::Config(ConfigError::ParseFailed { .. }))
    ));
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn load_from_file_applies_values() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("berth.toml");
    fs::write(
        &path,
        "[manager]\nname_prefix = \"lobby\"\nstart_port = 25000\n",
    )
    .expect("should write config");

    let config = BerthConfig::load(&path).await.expect("should load");
    assert_eq!(config.manager.name_prefix, "lobby");
    assert_eq!(config.manager.start_port, 25000);
}

#[tokio::test]
async fn load_rejects_invalid_file() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("berth.toml");
    fs::write(&path, "[general]\nlog_level = \"loud\"\n").expect("should write config");

    assert!(BerthConfig::load(&path).await.is_err());
}
