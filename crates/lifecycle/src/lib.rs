//! # berth-lifecycle
//!
//! 단일 호스트에서 게임 서버 컨테이너의 라이프사이클을 관리합니다.
//! 고정된 베이스 이미지로 컨테이너를 만들고, 겹치지 않는 호스트 포트를 할당하고,
//! 프로세스 재시작 후에도 복구할 수 있도록 인스턴스 메타데이터를 남깁니다.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`LifecycleError`)
//! - [`config`]: Manager configuration (`ManagerConfig`, builder)
//! - [`docker`]: Runtime abstraction (`RuntimeClient` trait, `BollardRuntimeClient`)
//! - [`sink`]: Line output targets (`OutputSink`, `TracingSink`, `ChannelSink`, `MemorySink`)
//! - [`metadata`]: Per-instance `server-info.json` codec and directory scan
//! - [`port`]: Host port allocation (`PortAllocator`, `ClaimTable`)
//! - [`instance`]: Instance model (`ServerInstance`, `InstanceSpec`, `LifecycleState`)
//! - [`registry`]: Rebuildable name -> instance cache (`Registry`)
//! - [`manager`]: Main orchestrator (`LifecycleManager`, `LifecycleManagerBuilder`)
//!
//! # Architecture
//!
//! ```text
//! create/recreate ──> LifecycleManager ──> PortAllocator (claims: metadata + live list)
//!                          |
//!                     RuntimeClient.create/start
//!                          |
//!                     server-info.json ──> Registry
//!                          |
//!                     startup logs ──> OutputSink
//! ```
//!
//! 이름 지정 동작(start/stop/restart/remove)은 레지스트리에서 이름을 찾고,
//! 비어 있거나 없으면 런타임 목록으로 다시 만든 뒤 런타임에 위임합니다.

pub mod config;
pub mod docker;
pub mod error;
pub mod instance;
pub mod manager;
pub mod metadata;
pub mod port;
pub mod registry;
pub mod sink;

// --- Public API Re-exports ---

// Manager (main orchestrator)
pub use manager::{
    Action, ActionOutcome, BroadcastFailure, LifecycleManager, LifecycleManagerBuilder, WILDCARD,
};

// Configuration
pub use config::{ManagerConfig, ManagerConfigBuilder};

// Error
pub use error::LifecycleError;

// Runtime API
pub use docker::{BollardRuntimeClient, ContainerSpec, RuntimeClient};

// Instance model
pub use instance::{InstanceSpec, LifecycleState, ServerInstance, parse_flags};

// Metadata / ports / registry
pub use metadata::InstanceMetadata;
pub use port::{ClaimTable, PortAllocator};
pub use registry::Registry;

// Output
pub use sink::{ChannelSink, MemorySink, OutputSink, TracingSink};
