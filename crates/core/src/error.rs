//! 에러 타입 — 도메인별 에러 정의

/// Berth 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum BerthError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 컨테이너 런타임 에러
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 컨테이너 런타임 및 인스턴스 관리 에러
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// 런타임 API 호출 실패
    #[error("runtime api error: {0}")]
    Api(String),

    /// 런타임 연결 실패
    #[error("runtime unreachable: {0}")]
    Unreachable(String),

    /// 컨테이너를 찾을 수 없음
    #[error("container not found: {0}")]
    NotFound(String),

    /// 할당 가능한 포트 없음
    #[error("no free port: {0}")]
    PortsExhausted(String),

    /// 인스턴스 데이터/메타데이터 문제
    #[error("instance data error: {0}")]
    InstanceData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_berth_error() {
        let err: BerthError = ConfigError::InvalidValue {
            field: "manager.start_port".to_owned(),
            reason: "must be > 0".to_owned(),
        }
        .into();
        assert!(matches!(err, BerthError::Config(_)));
        assert!(err.to_string().contains("manager.start_port"));
    }

    #[test]
    fn runtime_error_display() {
        let err = RuntimeError::Unreachable("connection refused".to_owned());
        assert!(err.to_string().contains("connection refused"));

        let err: BerthError = RuntimeError::NotFound("gameserver-1".to_owned()).into();
        assert!(err.to_string().contains("gameserver-1"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BerthError = io.into();
        assert!(matches!(err, BerthError::Io(_)));
    }
}
