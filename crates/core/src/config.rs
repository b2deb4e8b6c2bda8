//! 설정 관리 — berth.toml 파싱 및 런타임 설정
//!
//! [`BerthConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`BERTH_MANAGER_START_PORT=20000` 형식)
//! 3. 설정 파일 (`berth.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), berth_core::error::BerthError> {
//! use berth_core::config::BerthConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = BerthConfig::load("berth.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = BerthConfig::parse("[manager]\nstart_port = 20000")?;
//! # Ok(())
//! # }
//! ```

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BerthError, ConfigError};

/// Berth 통합 설정
///
/// `berth.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BerthConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 인스턴스 관리자 설정
    #[serde(default)]
    pub manager: ManagerSection,
}

impl BerthConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, BerthError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, BerthError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BerthError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                BerthError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, BerthError> {
        toml::from_str(toml_str).map_err(|e| {
            BerthError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `BERTH_{SECTION}_{FIELD}`
    /// 예: `BERTH_MANAGER_NAME_PREFIX=staging`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "BERTH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "BERTH_GENERAL_LOG_FORMAT");

        // Manager
        override_string(
            &mut self.manager.docker_socket,
            "BERTH_MANAGER_DOCKER_SOCKET",
        );
        override_u64(
            &mut self.manager.docker_timeout_secs,
            "BERTH_MANAGER_DOCKER_TIMEOUT_SECS",
        );
        override_string(&mut self.manager.name_prefix, "BERTH_MANAGER_NAME_PREFIX");
        override_string(&mut self.manager.base_path, "BERTH_MANAGER_BASE_PATH");
        override_u16(&mut self.manager.start_port, "BERTH_MANAGER_START_PORT");
        override_u32(
            &mut self.manager.max_port_scan,
            "BERTH_MANAGER_MAX_PORT_SCAN",
        );
        override_string(&mut self.manager.bind_host, "BERTH_MANAGER_BIND_HOST");
        override_string(&mut self.manager.image, "BERTH_MANAGER_IMAGE");
        override_u16(
            &mut self.manager.container_port,
            "BERTH_MANAGER_CONTAINER_PORT",
        );
        override_string(&mut self.manager.data_mount, "BERTH_MANAGER_DATA_MOUNT");
        override_u64(
            &mut self.manager.log_stream_timeout_secs,
            "BERTH_MANAGER_LOG_STREAM_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.manager.reconcile_interval_secs,
            "BERTH_MANAGER_RECONCILE_INTERVAL_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), BerthError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        let m = &self.manager;

        if m.name_prefix.is_empty() {
            return Err(invalid("manager.name_prefix", "must not be empty".to_owned()));
        }
        // 컨테이너 이름으로 쓰이므로 런타임이 허용하는 문자만 사용
        if !m
            .name_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            return Err(invalid(
                "manager.name_prefix",
                "may only contain [a-zA-Z0-9_.-]".to_owned(),
            ));
        }

        if m.base_path.is_empty() {
            return Err(invalid("manager.base_path", "must not be empty".to_owned()));
        }

        if m.start_port == 0 {
            return Err(invalid("manager.start_port", "must be 1-65535".to_owned()));
        }

        if m.max_port_scan == 0 || m.max_port_scan > MAX_PORT_SCAN {
            return Err(invalid(
                "manager.max_port_scan",
                format!("must be 1-{MAX_PORT_SCAN}"),
            ));
        }

        if m.bind_host.parse::<IpAddr>().is_err() {
            return Err(invalid(
                "manager.bind_host",
                format!("'{}' is not an IP address", m.bind_host),
            ));
        }

        if m.image.is_empty() {
            return Err(invalid("manager.image", "must not be empty".to_owned()));
        }

        if m.container_port == 0 {
            return Err(invalid(
                "manager.container_port",
                "must be 1-65535".to_owned(),
            ));
        }

        if !m.data_mount.starts_with('/') {
            return Err(invalid(
                "manager.data_mount",
                "must be an absolute container path".to_owned(),
            ));
        }

        if m.docker_timeout_secs == 0 || m.docker_timeout_secs > MAX_DOCKER_TIMEOUT_SECS {
            return Err(invalid(
                "manager.docker_timeout_secs",
                format!("must be 1-{MAX_DOCKER_TIMEOUT_SECS}"),
            ));
        }

        if m.log_stream_timeout_secs > MAX_LOG_STREAM_TIMEOUT_SECS {
            return Err(invalid(
                "manager.log_stream_timeout_secs",
                format!("must be 0-{MAX_LOG_STREAM_TIMEOUT_SECS}"),
            ));
        }

        Ok(())
    }
}

/// 설정 상한값 상수
const MAX_PORT_SCAN: u32 = 65_535;
const MAX_DOCKER_TIMEOUT_SECS: u64 = 600;
const MAX_LOG_STREAM_TIMEOUT_SECS: u64 = 3600;

fn invalid(field: &str, reason: String) -> BerthError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 인스턴스 관리자 설정 (`[manager]` 섹션)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSection {
    /// Docker 소켓 경로 (비어 있으면 플랫폼 기본값)
    pub docker_socket: String,
    /// Docker API 요청 타임아웃 (초)
    pub docker_timeout_secs: u64,
    /// 관리 대상 컨테이너 이름 접두어
    pub name_prefix: String,
    /// 인스턴스 데이터 디렉토리 루트
    pub base_path: String,
    /// 포트 할당 시작 번호
    pub start_port: u16,
    /// 포트 탐색 최대 후보 수
    pub max_port_scan: u32,
    /// 포트 바인드 검사에 사용할 호스트 주소
    pub bind_host: String,
    /// 서버 컨테이너 이미지
    pub image: String,
    /// 컨테이너 내부 서비스 포트
    pub container_port: u16,
    /// 컨테이너 내부 데이터 마운트 경로
    pub data_mount: String,
    /// 시작 로그 스트리밍 타임아웃 (초, 0이면 스트리밍 안 함)
    pub log_stream_timeout_secs: u64,
    /// 주기적 재조정 간격 (초, 0이면 비활성)
    pub reconcile_interval_secs: u64,
}

impl Default for ManagerSection {
    fn default() -> Self {
        Self {
            docker_socket: String::new(),
            docker_timeout_secs: 45,
            name_prefix: "gameserver".to_owned(),
            base_path: "/var/lib/berth/instances".to_owned(),
            start_port: 10000,
            max_port_scan: 1000,
            bind_host: "0.0.0.0".to_owned(),
            image: "itzg/minecraft-server".to_owned(),
            container_port: 25565,
            data_mount: "/data".to_owned(),
            log_stream_timeout_secs: 30,
            reconcile_interval_secs: 0,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
