//! 라이프사이클 관리자 에러 타입
//!
//! [`LifecycleError`]는 인스턴스 관리 중 발생하는 모든 에러를 표현합니다.
//! 런타임(Docker) 에러는 반드시 이 타입으로 변환된 뒤 전파되며,
//! `From<LifecycleError> for BerthError` 변환으로 상위 레이어에서
//! `?` 연산자를 그대로 사용할 수 있습니다.

use std::path::PathBuf;

use berth_core::error::{BerthError, ConfigError, RuntimeError};

/// 라이프사이클 관리자 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// 런타임 API 호출 실패
    #[error("runtime api error: {0}")]
    RuntimeApi(String),

    /// 런타임 연결 실패
    #[error("runtime connection error: {0}")]
    RuntimeConnection(String),

    /// 요청한 전이가 이미 만족됨 (HTTP 304)
    ///
    /// 관리자는 이 에러를 성공으로 취급합니다.
    #[error("container '{container_id}' not modified")]
    NotModified {
        /// 대상 컨테이너 ID
        container_id: String,
    },

    /// 런타임에 컨테이너가 없음 (HTTP 404)
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// 포트 탐색 한도 초과
    #[error("no free port found scanning {scanned} candidates from {start}")]
    PortsExhausted {
        /// 탐색 시작 포트
        start: u16,
        /// 검사한 후보 수
        scanned: u32,
    },

    /// 인스턴스 ID가 UUID 형식이 아님
    #[error("invalid instance id '{0}'")]
    InvalidInstanceId(String),

    /// 추가 환경변수 항목이 `KEY=VALUE` 형식이 아님
    #[error("invalid environment entry '{0}' (expected KEY=VALUE)")]
    InvalidEnvEntry(String),

    /// 재생성 대상 데이터 디렉토리가 없음
    #[error("data directory missing: {}", path.display())]
    DataDirectoryMissing {
        /// 기대한 데이터 경로
        path: PathBuf,
    },

    /// 데이터 디렉토리 생성 실패
    #[error("failed to prepare directory {}: {source}", path.display())]
    Directory {
        /// 대상 경로
        path: PathBuf,
        /// 원인
        source: std::io::Error,
    },

    /// 메타데이터 파일 읽기/쓰기/파싱 실패
    #[error("metadata error: {}: {reason}", path.display())]
    Metadata {
        /// 메타데이터 파일 경로
        path: PathBuf,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 관리자가 종료 중
    #[error("lifecycle manager is shutting down")]
    ShuttingDown,
}

impl LifecycleError {
    /// 런타임이 "이미 그 상태"라고 보고한 경우인지 확인합니다.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified { .. })
    }
}

impl From<LifecycleError> for BerthError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::RuntimeApi(msg) => BerthError::Runtime(RuntimeError::Api(msg)),
            LifecycleError::RuntimeConnection(msg) => {
                BerthError::Runtime(RuntimeError::Unreachable(msg))
            }
            LifecycleError::ContainerNotFound(id) => {
                BerthError::Runtime(RuntimeError::NotFound(id))
            }
            LifecycleError::NotModified { .. } | LifecycleError::ShuttingDown => {
                BerthError::Runtime(RuntimeError::Api(message))
            }
            LifecycleError::PortsExhausted { .. } => {
                BerthError::Runtime(RuntimeError::PortsExhausted(message))
            }
            LifecycleError::Directory { source, .. } => BerthError::Io(source),
            LifecycleError::InvalidInstanceId(_)
            | LifecycleError::InvalidEnvEntry(_)
            | LifecycleError::DataDirectoryMissing { .. }
            | LifecycleError::Metadata { .. } => {
                BerthError::Runtime(RuntimeError::InstanceData(message))
            }
            LifecycleError::Config { field, reason } => {
                BerthError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_api_error_display() {
        let err = LifecycleError::RuntimeApi("image not found".to_owned());
        assert!(err.to_string().contains("image not found"));
    }

    #[test]
    fn not_modified_is_detected() {
        let err = LifecycleError::NotModified {
            container_id: "abc".to_owned(),
        };
        assert!(err.is_not_modified());
        assert!(!LifecycleError::ShuttingDown.is_not_modified());
    }

    #[test]
    fn ports_exhausted_display() {
        let err = LifecycleError::PortsExhausted {
            start: 10000,
            scanned: 1000,
        };
        let msg = err.to_string();
        assert!(msg.contains("10000"));
        assert!(msg.contains("1000 candidates"));
    }

    #[test]
    fn directory_error_display_includes_path() {
        let err = LifecycleError::Directory {
            path: PathBuf::from("/srv/x/server"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/srv/x/server"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn converts_connection_to_unreachable() {
        let err: BerthError = LifecycleError::RuntimeConnection("socket".to_owned()).into();
        assert!(matches!(
            err,
            BerthError::Runtime(RuntimeError::Unreachable(_))
        ));
    }

    #[test]
    fn converts_not_found() {
        let err: BerthError = LifecycleError::ContainerNotFound("c1".to_owned()).into();
        assert!(matches!(err, BerthError::Runtime(RuntimeError::NotFound(_))));
    }

    #[test]
    fn converts_directory_to_io() {
        let err: BerthError = LifecycleError::Directory {
            path: PathBuf::from("/x"),
            source: std::io::Error::other("boom"),
        }
        .into();
        assert!(matches!(err, BerthError::Io(_)));
    }

    #[test]
    fn converts_config() {
        let err: BerthError = LifecycleError::Config {
            field: "start_port".to_owned(),
            reason: "zero".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            BerthError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn converts_ports_exhausted() {
        let err: BerthError = LifecycleError::PortsExhausted {
            start: 1,
            scanned: 2,
        }
        .into();
        assert!(matches!(
            err,
            BerthError::Runtime(RuntimeError::PortsExhausted(_))
        ));
    }
}
