//! Berth 공통 크레이트
//!
//! 게임 서버 컨테이너 관리자의 모든 크레이트가 공유하는
//! 도메인 타입, 최상위 에러, `berth.toml` 설정, 메트릭 이름을 정의합니다.

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{BerthError, ConfigError, RuntimeError};

// 설정
pub use config::{BerthConfig, GeneralConfig, ManagerSection};

// 도메인 타입
pub use types::{ContainerSummary, PublishedPort, ServerState};
