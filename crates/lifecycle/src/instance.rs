//! 서버 인스턴스 모델
//!
//! - [`InstanceSpec`]: 생성/재생성 요청 파라미터 (플랫폼, 버전, 메모리, 추가 환경변수)
//! - [`ServerInstance`]: 레지스트리가 보관하는 인스턴스 한 건
//! - [`LifecycleState`]: 런타임 상태에서 유도한 라이프사이클 단계

use std::fmt;
use std::path::PathBuf;

use berth_core::types::{ContainerSummary, ServerState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ManagerConfig;
use crate::error::LifecycleError;

/// 인스턴스 라이프사이클 단계
///
/// `Unmanaged -> Created -> Running <-> Stopped -> Removed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// 관리자에 알려지지 않음
    #[default]
    Unmanaged,
    /// 컨테이너 생성됨, 아직 시작 전
    Created,
    /// 실행 중
    Running,
    /// 정지됨 (exited, paused, dead)
    Stopped,
    /// 컨테이너 제거됨, 데이터 디렉토리는 보존
    Removed,
}

impl LifecycleState {
    /// 런타임 상태 문자열에서 라이프사이클 단계를 유도합니다.
    pub fn from_runtime_state(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "running" | "restarting" => Self::Running,
            "removing" => Self::Removed,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unmanaged => "unmanaged",
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Removed => "removed",
        };
        f.write_str(s)
    }
}

/// 생성/재생성 요청 파라미터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    /// 서버 소프트웨어 (paper, vanilla, forge 등)
    pub platform: String,
    /// 서버 버전
    pub version: String,
    /// 메모리 힌트 (MB)
    pub memory_mb: Option<u32>,
    /// 추가 `KEY=VALUE` 환경변수
    pub extra_env: Vec<String>,
}

impl InstanceSpec {
    /// 플랫폼과 버전으로 요청을 생성합니다.
    pub fn new(platform: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            version: version.into(),
            memory_mb: None,
            extra_env: Vec::new(),
        }
    }

    /// 메모리 힌트를 설정합니다.
    pub fn with_memory(mut self, memory_mb: u32) -> Self {
        self.memory_mb = Some(memory_mb);
        self
    }

    /// `;`로 구분된 `KEY=VALUE` 목록을 추가 환경변수로 설정합니다.
    ///
    /// 빈 항목은 무시합니다.
    ///
    /// # Errors
    ///
    /// `=`가 없거나 키가 비어 있으면 `LifecycleError::InvalidEnvEntry`.
    pub fn with_flags(mut self, flags: &str) -> Result<Self, LifecycleError> {
        self.extra_env = parse_flags(flags)?;
        Ok(self)
    }

    /// 컨테이너 환경변수 목록을 만듭니다.
    pub fn env(&self) -> Vec<String> {
        let mut env = vec![
            "EULA=TRUE".to_owned(),
            format!("TYPE={}", self.platform.to_uppercase()),
            format!("VERSION={}", self.version),
        ];
        if let Some(memory) = self.memory_mb {
            env.push(format!("MEMORY={memory}M"));
        }
        env.extend(self.extra_env.iter().cloned());
        env
    }
}

/// `;`로 구분된 `KEY=VALUE` 목록을 파싱합니다.
pub fn parse_flags(flags: &str) -> Result<Vec<String>, LifecycleError> {
    flags
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, _)) if !key.trim().is_empty() => Ok(entry.to_owned()),
            _ => Err(LifecycleError::InvalidEnvEntry(entry.to_owned())),
        })
        .collect()
}

/// 레지스트리가 보관하는 서버 인스턴스
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInstance {
    /// 인스턴스 ID (데이터 디렉토리와 컨테이너 이름의 일부)
    pub instance_id: Uuid,
    /// 컨테이너 이름 (`<prefix>-<instance_id>`)
    pub container_name: String,
    /// 호스트 데이터 경로
    pub data_path: PathBuf,
    /// 서버 소프트웨어 (런타임 목록에서 복구된 경우 알 수 없음)
    pub platform: Option<String>,
    /// 서버 버전 (런타임 목록에서 복구된 경우 알 수 없음)
    pub version: Option<String>,
    /// 메모리 힌트 (MB)
    pub memory_mb: Option<u32>,
    /// 공개 호스트 포트
    pub port: Option<u16>,
    /// 런타임 컨테이너 ID
    pub container_id: Option<String>,
    /// 마지막으로 관찰한 라이프사이클 단계
    pub state: LifecycleState,
}

impl ServerInstance {
    /// 생성 요청으로부터 인스턴스를 구성합니다.
    pub fn provisioned(
        config: &ManagerConfig,
        instance_id: Uuid,
        spec: &InstanceSpec,
        port: u16,
        container_id: String,
    ) -> Self {
        Self {
            instance_id,
            container_name: config.container_name(&instance_id),
            data_path: config.data_path(&instance_id),
            platform: Some(spec.platform.clone()),
            version: Some(spec.version.clone()),
            memory_mb: spec.memory_mb,
            port: Some(port),
            container_id: Some(container_id),
            state: LifecycleState::Created,
        }
    }

    /// 런타임 목록 한 건에서 인스턴스를 복구합니다.
    ///
    /// 이름이 관리 네임스페이스에 속하지 않거나 접미어가 UUID가 아니면 `None`.
    pub fn from_summary(config: &ManagerConfig, summary: &ContainerSummary) -> Option<Self> {
        let instance_id = config.instance_id_from_name(&summary.name)?;
        let port = summary
            .ports
            .iter()
            .find(|p| p.private_port == config.container_port)
            .and_then(|p| p.public_port);

        Some(Self {
            instance_id,
            container_name: config.container_name(&instance_id),
            data_path: config.data_path(&instance_id),
            platform: None,
            version: None,
            memory_mb: None,
            port,
            container_id: Some(summary.id.clone()),
            state: LifecycleState::from_runtime_state(&summary.state),
        })
    }

    /// 외부 노출용 서버 상태
    pub fn server_state(&self) -> ServerState {
        if self.state == LifecycleState::Running {
            ServerState::Online
        } else {
            ServerState::Offline
        }
    }
}

impl fmt::Display for ServerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.container_name, self.state)?;
        if let Some(port) = self.port {
            write!(f, " port={port}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use berth_core::types::PublishedPort;

    use super::*;

    #[test]
    fn env_contains_required_entries() {
        let spec = InstanceSpec::new("paper", "1.20.4").with_memory(2048);
        assert_eq!(
            spec.env(),
            vec!["EULA=TRUE", "TYPE=PAPER", "VERSION=1.20.4", "MEMORY=2048M"]
        );
    }

    #[test]
    fn env_without_memory() {
        let spec = InstanceSpec::new("vanilla", "latest");
        assert!(!spec.env().iter().any(|e| e.starts_with("MEMORY=")));
    }

    #[test]
    fn flags_are_appended_to_env() {
        let spec = InstanceSpec::new("paper", "1.20.4")
            .with_flags("DIFFICULTY=hard; MOTD=hello world;;")
            .unwrap();
        let env = spec.env();
        assert_eq!(env[env.len() - 2], "DIFFICULTY=hard");
        assert_eq!(env[env.len() - 1], "MOTD=hello world");
    }

    #[test]
    fn flag_value_may_contain_equals() {
        assert_eq!(parse_flags("JVM_OPTS=-Da=b").unwrap(), vec!["JVM_OPTS=-Da=b"]);
    }

    #[test]
    fn invalid_flags_rejected() {
        assert!(matches!(
            parse_flags("DIFFICULTY"),
            Err(LifecycleError::InvalidEnvEntry(e)) if e == "DIFFICULTY"
        ));
        assert!(parse_flags("=value").is_err());
        assert!(parse_flags("").unwrap().is_empty());
    }

    #[test]
    fn lifecycle_state_from_runtime() {
        assert_eq!(LifecycleState::from_runtime_state("created"), LifecycleState::Created);
        assert_eq!(LifecycleState::from_runtime_state("running"), LifecycleState::Running);
        assert_eq!(LifecycleState::from_runtime_state("exited"), LifecycleState::Stopped);
        assert_eq!(LifecycleState::from_runtime_state("paused"), LifecycleState::Stopped);
        assert_eq!(LifecycleState::from_runtime_state("removing"), LifecycleState::Removed);
    }

    #[test]
    fn from_summary_rederives_identity() {
        let config = ManagerConfig::default();
        let id = Uuid::new_v4();
        let summary = ContainerSummary {
            id: "c0ffee".to_owned(),
            name: config.container_name(&id),
            image: config.image.clone(),
            state: "running".to_owned(),
            ports: vec![PublishedPort {
                private_port: 25565,
                public_port: Some(10002),
                protocol: "tcp".to_owned(),
            }],
        };

        let instance = ServerInstance::from_summary(&config, &summary).unwrap();
        assert_eq!(instance.instance_id, id);
        assert_eq!(instance.data_path, config.data_path(&id));
        assert_eq!(instance.port, Some(10002));
        assert_eq!(instance.server_state(), ServerState::Online);
        assert!(instance.platform.is_none());
    }

    #[test]
    fn from_summary_rejects_foreign_names() {
        let config = ManagerConfig::default();
        let summary = ContainerSummary {
            id: "1".to_owned(),
            name: "gameserver-lobby".to_owned(),
            image: String::new(),
            state: "running".to_owned(),
            ports: Vec::new(),
        };
        assert!(ServerInstance::from_summary(&config, &summary).is_none());
    }

    #[test]
    fn display_includes_port() {
        let config = ManagerConfig::default();
        let id = Uuid::new_v4();
        let instance = ServerInstance::provisioned(
            &config,
            id,
            &InstanceSpec::new("paper", "1.20.4"),
            10000,
            "abc".to_owned(),
        );
        let shown = instance.to_string();
        assert!(shown.contains(&config.container_name(&id)));
        assert!(shown.contains("port=10000"));
    }
}
