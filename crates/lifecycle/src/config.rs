//! 라이프사이클 관리자 설정
//!
//! [`ManagerConfig`]는 core의 [`ManagerSection`](berth_core::config::ManagerSection)을
//! 기반으로 관리자가 직접 사용하는 형태(경로, 시간 단위 등)로 변환한 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use berth_core::config::BerthConfig;
//! use berth_lifecycle::config::ManagerConfig;
//!
//! let core_config = BerthConfig::default();
//! let config = ManagerConfig::from_core(&core_config.manager);
//! ```

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LifecycleError;

/// 메타데이터 파일 이름 (데이터 디렉토리 안에 위치)
pub const METADATA_FILE_NAME: &str = "server-info.json";

/// 인스턴스 디렉토리 아래 서버 데이터 하위 디렉토리 이름
const SERVER_DIR_NAME: &str = "server";

/// 라이프사이클 관리자 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Docker 소켓 경로 (비어 있으면 플랫폼 기본값)
    pub docker_socket: String,
    /// Docker API 요청 타임아웃 (초)
    pub docker_timeout_secs: u64,
    /// 관리 대상 컨테이너 이름 접두어
    pub name_prefix: String,
    /// 인스턴스 데이터 디렉토리 루트
    pub base_path: PathBuf,
    /// 포트 할당 시작 번호
    pub start_port: u16,
    /// 포트 탐색 최대 후보 수
    pub max_port_scan: u32,
    /// 포트 바인드 검사 호스트
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

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::from_core(&berth_core::config::ManagerSection::default())
    }
}

impl ManagerConfig {
    /// core의 `ManagerSection`에서 관리자 설정을 생성합니다.
    pub fn from_core(core: &berth_core::config::ManagerSection) -> Self {
        Self {
            docker_socket: core.docker_socket.clone(),
            docker_timeout_secs: core.docker_timeout_secs,
            name_prefix: core.name_prefix.clone(),
            base_path: PathBuf::from(&core.base_path),
            start_port: core.start_port,
            max_port_scan: core.max_port_scan,
            bind_host: core.bind_host.clone(),
            image: core.image.clone(),
            container_port: core.container_port,
            data_mount: core.data_mount.clone(),
            log_stream_timeout_secs: core.log_stream_timeout_secs,
            reconcile_interval_secs: core.reconcile_interval_secs,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LifecycleError> {
        if self.name_prefix.is_empty() {
            return Err(config_err("name_prefix", "must not be empty"));
        }
        if self.base_path.as_os_str().is_empty() {
            return Err(config_err("base_path", "must not be empty"));
        }
        if self.start_port == 0 {
            return Err(config_err("start_port", "must be 1-65535"));
        }
        if self.max_port_scan == 0 {
            return Err(config_err("max_port_scan", "must be greater than 0"));
        }
        if self.bind_host.parse::<IpAddr>().is_err() {
            return Err(config_err("bind_host", "must be an IP address"));
        }
        if self.image.is_empty() {
            return Err(config_err("image", "must not be empty"));
        }
        if self.container_port == 0 {
            return Err(config_err("container_port", "must be 1-65535"));
        }
        if !self.data_mount.starts_with('/') {
            return Err(config_err("data_mount", "must be an absolute path"));
        }
        Ok(())
    }

    /// 포트 바인드 검사 호스트를 반환합니다.
    ///
    /// `validate()`를 통과한 설정이라면 항상 파싱에 성공합니다.
    pub fn bind_addr(&self) -> Result<IpAddr, LifecycleError> {
        self.bind_host
            .parse()
            .map_err(|_| config_err("bind_host", "must be an IP address"))
    }

    /// 시작 로그 스트리밍 타임아웃. 0이면 `None`.
    pub fn log_stream_timeout(&self) -> Option<Duration> {
        (self.log_stream_timeout_secs > 0).then(|| Duration::from_secs(self.log_stream_timeout_secs))
    }

    /// 주기적 재조정 간격. 0이면 `None`.
    pub fn reconcile_interval(&self) -> Option<Duration> {
        (self.reconcile_interval_secs > 0).then(|| Duration::from_secs(self.reconcile_interval_secs))
    }

    /// 인스턴스의 컨테이너 이름: `<prefix>-<instance_id>`
    pub fn container_name(&self, instance_id: &Uuid) -> String {
        format!("{}-{}", self.name_prefix, instance_id)
    }

    /// 컨테이너 이름에서 인스턴스 ID를 추출합니다.
    ///
    /// 선행 `/`는 무시합니다. 접두어가 다르거나 접미어가 UUID가 아니면 `None`.
    pub fn instance_id_from_name(&self, name: &str) -> Option<Uuid> {
        let name = name.trim_start_matches('/');
        let suffix = name.strip_prefix(&self.name_prefix)?.strip_prefix('-')?;
        Uuid::parse_str(suffix).ok()
    }

    /// 이름이 이 관리자의 네임스페이스(`<prefix>-`)에 속하는지 확인합니다.
    pub fn owns_name(&self, name: &str) -> bool {
        name.trim_start_matches('/')
            .strip_prefix(&self.name_prefix)
            .is_some_and(|rest| rest.starts_with('-'))
    }

    /// 인스턴스 루트 디렉토리: `<base_path>/<instance_id>`
    pub fn instance_root(&self, instance_id: &Uuid) -> PathBuf {
        self.base_path.join(instance_id.to_string())
    }

    /// 인스턴스 데이터 경로: `<base_path>/<instance_id>/server`
    pub fn data_path(&self, instance_id: &Uuid) -> PathBuf {
        self.instance_root(instance_id).join(SERVER_DIR_NAME)
    }

    /// 데이터 경로 안의 메타데이터 파일 경로
    pub fn metadata_path(data_path: &Path) -> PathBuf {
        data_path.join(METADATA_FILE_NAME)
    }
}

fn config_err(field: &str, reason: &str) -> LifecycleError {
    LifecycleError::Config {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

/// 관리자 설정 빌더
#[derive(Default)]
pub struct ManagerConfigBuilder {
    config: ManagerConfig,
}

impl ManagerConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 컨테이너 이름 접두어를 설정합니다.
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.name_prefix = prefix.into();
        self
    }

    /// 인스턴스 데이터 루트를 설정합니다.
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_path = path.into();
        self
    }

    /// 포트 할당 시작 번호를 설정합니다.
    pub fn start_port(mut self, port: u16) -> Self {
        self.config.start_port = port;
        self
    }

    /// 포트 탐색 최대 후보 수를 설정합니다.
    pub fn max_port_scan(mut self, max: u32) -> Self {
        self.config.max_port_scan = max;
        self
    }

    /// 포트 바인드 검사 호스트를 설정합니다.
    pub fn bind_host(mut self, host: impl Into<String>) -> Self {
        self.config.bind_host = host.into();
        self
    }

    /// 서버 이미지를 설정합니다.
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.config.image = image.into();
        self
    }

    /// 컨테이너 서비스 포트를 설정합니다.
    pub fn container_port(mut self, port: u16) -> Self {
        self.config.container_port = port;
        self
    }

    /// 로그 스트리밍 타임아웃(초)을 설정합니다.
    pub fn log_stream_timeout_secs(mut self, secs: u64) -> Self {
        self.config.log_stream_timeout_secs = secs;
        self
    }

    /// 재조정 간격(초)을 설정합니다.
    pub fn reconcile_interval_secs(mut self, secs: u64) -> Self {
        self.config.reconcile_interval_secs = secs;
        self
    }

    /// 설정을 검증하고 `ManagerConfig`를 생성합니다.
    pub fn build(self) -> Result<ManagerConfig, LifecycleError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ManagerConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let core = berth_core::config::ManagerSection {
            name_prefix: "eu".to_owned(),
            base_path: "/srv/eu".to_owned(),
            start_port: 30000,
            ..Default::default()
        };
        let config = ManagerConfig::from_core(&core);
        assert_eq!(config.name_prefix, "eu");
        assert_eq!(config.base_path, PathBuf::from("/srv/eu"));
        assert_eq!(config.start_port, 30000);
    }

    #[test]
    fn container_name_and_back() {
        let config = ManagerConfig::default();
        let id = Uuid::new_v4();
        let name = config.container_name(&id);
        assert_eq!(name, format!("gameserver-{id}"));
        assert_eq!(config.instance_id_from_name(&name), Some(id));
        assert_eq!(config.instance_id_from_name(&format!("/{name}")), Some(id));
    }

    #[test]
    fn instance_id_from_foreign_name_is_none() {
        let config = ManagerConfig::default();
        let id = Uuid::new_v4();
        assert_eq!(config.instance_id_from_name(&format!("other-{id}")), None);
        assert_eq!(config.instance_id_from_name("gameserver-notauuid"), None);
        assert_eq!(config.instance_id_from_name(&format!("gameserverx-{id}")), None);
    }

    #[test]
    fn owns_name_requires_dash() {
        let config = ManagerConfig::default();
        assert!(config.owns_name("gameserver-abc"));
        assert!(config.owns_name("/gameserver-abc"));
        assert!(!config.owns_name("gameserverabc"));
        assert!(!config.owns_name("redis"));
    }

    #[test]
    fn data_path_layout() {
        let config = ManagerConfigBuilder::new()
            .base_path("/srv/berth")
            .build()
            .unwrap();
        let id = Uuid::new_v4();
        assert_eq!(
            config.data_path(&id),
            PathBuf::from(format!("/srv/berth/{id}/server"))
        );
        assert_eq!(
            ManagerConfig::metadata_path(&config.data_path(&id)),
            PathBuf::from(format!("/srv/berth/{id}/server/server-info.json"))
        );
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(ManagerConfigBuilder::new().start_port(0).build().is_err());
        assert!(ManagerConfigBuilder::new().max_port_scan(0).build().is_err());
        assert!(ManagerConfigBuilder::new().bind_host("localhost").build().is_err());
        assert!(ManagerConfigBuilder::new().name_prefix("").build().is_err());
        assert!(ManagerConfigBuilder::new().image("").build().is_err());
    }

    #[test]
    fn zero_durations_disable_features() {
        let config = ManagerConfigBuilder::new()
            .log_stream_timeout_secs(0)
            .reconcile_interval_secs(0)
            .build()
            .unwrap();
        assert!(config.log_stream_timeout().is_none());
        assert!(config.reconcile_interval().is_none());

        let config = ManagerConfigBuilder::new()
            .reconcile_interval_secs(5)
            .build()
            .unwrap();
        assert_eq!(config.reconcile_interval(), Some(Duration::from_secs(5)));
    }
}
