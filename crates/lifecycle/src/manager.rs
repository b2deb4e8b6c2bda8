//! 라이프사이클 관리자 -- 인스턴스 생성/재생성/시작/정지/재시작/제거 전체 흐름 관리
//!
//! [`LifecycleManager`]는 레지스트리를 소유하고, 포트 할당과 메타데이터 기록을
//! 조율하며, 런타임 호출을 [`RuntimeClient`]에 위임합니다.
//!
//! # 내부 아키텍처
//! ```text
//! caller ──> LifecycleManager ──lock──> Registry
//!                 │        │
//!                 │        ├── PortAllocator + ClaimTable (metadata scan + live list)
//!                 │        └── InstanceMetadata (server-info.json)
//!                 ▼
//!           RuntimeClient ──> container runtime
//!                 │
//!                 └── startup logs ──> OutputSink (after the lock is released)
//! ```
//!
//! 레지스트리를 바꾸는 모든 동작은 관리자 전역 `tokio::sync::Mutex` 아래에서
//! 실행되므로, 포트 할당부터 컨테이너 생성과 메타데이터 기록까지가 하나의
//! 임계 구역입니다.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use berth_core::metrics as m;
use berth_core::types::{ContainerSummary, ServerState};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ManagerConfig;
use crate::docker::{ContainerSpec, RuntimeClient};
use crate::error::LifecycleError;
use crate::instance::{InstanceSpec, LifecycleState, ServerInstance};
use crate::metadata::{InstanceMetadata, scan_instances};
use crate::port::{ClaimTable, PortAllocator};
use crate::registry::{Registry, canonical_name};
use crate::sink::{OutputSink, TracingSink};

/// 등록된 모든 인스턴스를 가리키는 이름
pub const WILDCARD: &str = "*";

/// 이름으로 지정하는 라이프사이클 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// 시작
    Start,
    /// 정지
    Stop,
    /// 재시작
    Restart,
    /// 제거 (실행 중이면 먼저 정지)
    Remove,
}

impl Action {
    /// 메트릭 레이블 및 로그용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 와일드카드 동작 중 실패한 인스턴스
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastFailure {
    /// 컨테이너 이름
    pub name: String,
    /// 실패 사유
    pub error: String,
}

/// 이름 지정 동작의 결과
///
/// 알 수 없는 이름은 에러가 아니라 [`ActionOutcome::NotFound`]입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// 단일 인스턴스에 적용됨 (이미 그 상태였던 경우 포함)
    Applied {
        /// 컨테이너 이름
        name: String,
    },
    /// 해당 이름의 인스턴스가 없음
    NotFound {
        /// 요청한 이름
        name: String,
    },
    /// 와일드카드로 모든 인스턴스에 적용됨
    Broadcast {
        /// 성공한 인스턴스
        applied: Vec<String>,
        /// 실패한 인스턴스
        failed: Vec<BroadcastFailure>,
    },
}

impl ActionOutcome {
    /// 대상이 없었는지 확인합니다.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// 게임 서버 컨테이너 라이프사이클 관리자
///
/// # 사용 예시
/// ```ignore
/// use std::sync::Arc;
/// use berth_lifecycle::{BollardRuntimeClient, InstanceSpec, LifecycleManagerBuilder};
///
/// let client = Arc::new(BollardRuntimeClient::connect("", timeout)?);
/// let manager = LifecycleManagerBuilder::new()
///     .config(config)
///     .client(client)
///     .build()?;
///
/// manager.initialize().await?;
/// let instance = manager.create(&InstanceSpec::new("paper", "1.20.4")).await?;
/// manager.stop(&instance.container_name).await?;
/// ```
pub struct LifecycleManager<C: RuntimeClient> {
    /// 관리자 설정
    config: ManagerConfig,
    /// 런타임 클라이언트 (공유)
    client: Arc<C>,
    /// 포트 할당기
    allocator: PortAllocator,
    /// 인스턴스 레지스트리 (관리자 전역 락)
    registry: Mutex<Registry>,
    /// 로그 출력 대상
    sink: Arc<dyn OutputSink>,
    /// 종료 시 로그 스트림과 재조정 태스크를 취소하는 토큰
    cancel: CancellationToken,
    /// 종료 시작 여부
    shutting_down: AtomicBool,
}

impl<C: RuntimeClient> LifecycleManager<C> {
    /// 새 관리자를 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정 검증에 실패하면 `LifecycleError::Config`.
    pub fn new(
        config: ManagerConfig,
        client: Arc<C>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, LifecycleError> {
        config.validate()?;
        let allocator = PortAllocator::from_config(&config)?;
        Ok(Self {
            config,
            client,
            allocator,
            registry: Mutex::new(Registry::new()),
            sink,
            cancel: CancellationToken::new(),
            shutting_down: AtomicBool::new(false),
        })
    }

    /// 관리자 설정을 반환합니다.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// 종료가 시작되었는지 확인합니다.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// 관리자 종료 시 취소되는 토큰을 반환합니다.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// 현재 레지스트리의 스냅샷을 반환합니다.
    pub async fn instances(&self) -> Vec<ServerInstance> {
        self.registry.lock().await.instances().cloned().collect()
    }

    // --- 초기화 / 재조정 / 종료 ---

    /// 런타임 연결을 확인하고 레지스트리를 런타임 목록으로 채웁니다.
    ///
    /// 등록된 인스턴스 수를 반환합니다.
    pub async fn initialize(&self) -> Result<usize, LifecycleError> {
        self.runtime_call("ping", self.client.ping()).await?;
        let count = self.reconcile().await?;
        info!(
            instances = count,
            prefix = %self.config.name_prefix,
            base_path = %self.config.base_path.display(),
            "lifecycle manager initialized"
        );
        Ok(count)
    }

    /// 레지스트리를 런타임 목록으로 다시 만듭니다.
    pub async fn reconcile(&self) -> Result<usize, LifecycleError> {
        let mut registry = self.lock_registry().await?;
        self.rebuild_locked(&mut registry).await
    }

    /// 주기적으로 레지스트리를 재조정하는 태스크를 시작합니다.
    ///
    /// 관리자가 종료되면 태스크도 끝납니다.
    pub fn spawn_reconciler(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // 첫 tick은 즉시 완료됨
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("reconciler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        match manager.reconcile().await {
                            Ok(count) => debug!(instances = count, "registry reconciled"),
                            Err(LifecycleError::ShuttingDown) => break,
                            Err(e) => warn!(error = %e, "periodic reconciliation failed"),
                        }
                    }
                }
            }
        })
    }

    /// 관리자를 종료합니다.
    ///
    /// 로그 스트림과 재조정 태스크를 취소하고, 진행 중인 변경 작업이 끝날 때까지
    /// 기다립니다. 이후의 변경 요청은 `LifecycleError::ShuttingDown`으로 거부됩니다.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("lifecycle manager shutting down");
        self.cancel.cancel();
        let _registry = self.registry.lock().await;
        info!("lifecycle manager stopped");
    }

    // --- 생성 / 재생성 ---

    /// 새 인스턴스를 생성하고 시작합니다.
    ///
    /// 새 UUID를 발급하고, 포트를 할당한 뒤 데이터 디렉토리를 만들고
    /// 컨테이너를 생성/시작합니다. 시작 로그는 락을 놓은 뒤 스트리밍합니다.
    ///
    /// 컨테이너가 만들어지기 전에 실패하면 새로 만든 디렉토리를 지웁니다.
    pub async fn create(&self, spec: &InstanceSpec) -> Result<ServerInstance, LifecycleError> {
        let instance = {
            let mut registry = self.lock_registry().await?;

            let instance_id = Uuid::new_v4();
            let claims = self.claim_table().await?;
            let port = self.allocator.allocate(self.config.start_port, &claims)?;

            let instance_root = self.config.instance_root(&instance_id);
            let container_id = match self.create_fresh_container(instance_id, spec, port).await {
                Ok(id) => id,
                Err(e) => {
                    discard_directory(&instance_root).await;
                    return Err(e);
                }
            };

            self.provision(&mut registry, instance_id, spec, port, container_id)
                .await?
        };

        metrics::counter!(m::INSTANCES_CREATED_TOTAL, m::LABEL_OPERATION => "create").increment(1);
        info!(
            container = %instance.container_name,
            port = instance.port,
            platform = %spec.platform,
            version = %spec.version,
            "server instance created"
        );

        self.stream_startup_logs(&instance).await;
        Ok(instance)
    }

    /// 기존 데이터 디렉토리로 인스턴스를 다시 만듭니다.
    ///
    /// 이전 메타데이터의 포트가 여전히 바인드 가능하고 다른 인스턴스가
    /// 점유하지 않았다면 그 포트를 유지하고, 아니면 새로 할당합니다.
    ///
    /// # Errors
    ///
    /// - `InvalidInstanceId`: `instance_id`가 UUID가 아님
    /// - `DataDirectoryMissing`: 데이터 디렉토리가 없음
    pub async fn recreate_from_directory(
        &self,
        instance_id: &str,
        spec: &InstanceSpec,
    ) -> Result<ServerInstance, LifecycleError> {
        let instance_id = Uuid::parse_str(instance_id.trim())
            .map_err(|_| LifecycleError::InvalidInstanceId(instance_id.to_owned()))?;
        let data_path = self.config.data_path(&instance_id);
        ensure_directory_exists(&data_path).await?;

        let instance = {
            let mut registry = self.lock_registry().await?;
            let container_name = self.config.container_name(&instance_id);

            let prior_port = match InstanceMetadata::read(&data_path).await {
                Ok(metadata) => Some(metadata.port),
                Err(e) => {
                    debug!(container = %container_name, error = %e, "no usable prior metadata");
                    None
                }
            };

            let claims = self.claim_table().await?.without_owner(&container_name);
            let port = match prior_port {
                Some(port) if self.allocator.is_available(port, &claims) => {
                    debug!(container = %container_name, port, "keeping prior port");
                    port
                }
                Some(port) => {
                    info!(container = %container_name, port, "prior port unavailable, allocating a new one");
                    self.allocator.allocate(self.config.start_port, &claims)?
                }
                None => self.allocator.allocate(self.config.start_port, &claims)?,
            };

            let container_id = self.create_container(instance_id, spec, port).await?;
            self.provision(&mut registry, instance_id, spec, port, container_id)
                .await?
        };

        metrics::counter!(m::INSTANCES_CREATED_TOTAL, m::LABEL_OPERATION => "recreate")
            .increment(1);
        info!(
            container = %instance.container_name,
            port = instance.port,
            "server instance recreated from directory"
        );

        self.stream_startup_logs(&instance).await;
        Ok(instance)
    }

    // --- 이름 지정 동작 ---

    /// 인스턴스를 시작합니다. `*`이면 등록된 모든 인스턴스.
    pub async fn start(&self, name: &str) -> Result<ActionOutcome, LifecycleError> {
        self.apply(Action::Start, name).await
    }

    /// 인스턴스를 정지합니다. `*`이면 등록된 모든 인스턴스.
    pub async fn stop(&self, name: &str) -> Result<ActionOutcome, LifecycleError> {
        self.apply(Action::Stop, name).await
    }

    /// 인스턴스를 재시작합니다. `*`이면 등록된 모든 인스턴스.
    pub async fn restart(&self, name: &str) -> Result<ActionOutcome, LifecycleError> {
        self.apply(Action::Restart, name).await
    }

    /// 인스턴스의 컨테이너를 제거합니다. 데이터 디렉토리는 남습니다.
    pub async fn remove(&self, name: &str) -> Result<ActionOutcome, LifecycleError> {
        self.apply(Action::Remove, name).await
    }

    /// 이름(또는 `*`)으로 동작을 적용합니다.
    pub async fn apply(&self, action: Action, name: &str) -> Result<ActionOutcome, LifecycleError> {
        let mut registry = self.lock_registry().await?;

        if name.trim() == WILDCARD {
            return self.broadcast_locked(&mut registry, action).await;
        }

        let Some(instance) = self.resolve_locked(&mut registry, name).await? else {
            info!(name, action = %action, "no such server instance");
            return Ok(ActionOutcome::NotFound {
                name: name.to_owned(),
            });
        };

        if self.apply_one(&mut registry, action, &instance).await? {
            Ok(ActionOutcome::Applied {
                name: instance.container_name,
            })
        } else {
            Ok(ActionOutcome::NotFound {
                name: name.to_owned(),
            })
        }
    }

    // --- 조회 ---

    /// 관리 접두어가 붙은 런타임 컨테이너 목록 (정지된 것 포함)
    pub async fn list(&self) -> Result<Vec<ContainerSummary>, LifecycleError> {
        let containers = self
            .runtime_call("list", self.client.list_containers(true))
            .await?;
        Ok(containers
            .into_iter()
            .filter(|c| self.config.owns_name(&c.name))
            .collect())
    }

    /// 이름 또는 인스턴스 ID로 서버 상태를 조회합니다.
    ///
    /// 컨테이너가 없으면 `Offline`입니다.
    pub async fn state_of(&self, name: &str) -> Result<ServerState, LifecycleError> {
        let container_name = canonical_name(&self.config, name);
        let containers = self.list().await?;
        Ok(containers
            .iter()
            .find(|c| c.name == container_name)
            .map(ContainerSummary::server_state)
            .unwrap_or_default())
    }

    // --- 내부 구현 ---

    /// 종료 중이 아닐 때만 레지스트리 락을 잡습니다.
    async fn lock_registry(&self) -> Result<MutexGuard<'_, Registry>, LifecycleError> {
        self.ensure_accepting()?;
        let guard = self.registry.lock().await;
        // 락을 기다리는 동안 종료가 시작되었을 수 있음
        self.ensure_accepting()?;
        Ok(guard)
    }

    fn ensure_accepting(&self) -> Result<(), LifecycleError> {
        if self.is_shutting_down() {
            return Err(LifecycleError::ShuttingDown);
        }
        Ok(())
    }

    /// 런타임 호출을 감싸 실패를 메트릭에 기록합니다.
    async fn runtime_call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, LifecycleError>>,
    ) -> Result<T, LifecycleError> {
        let result = call.await;
        if let Err(e) = &result {
            if !e.is_not_modified() {
                metrics::counter!(m::RUNTIME_FAILURES_TOTAL, m::LABEL_OPERATION => operation)
                    .increment(1);
            }
        }
        result
    }

    async fn rebuild_locked(&self, registry: &mut Registry) -> Result<usize, LifecycleError> {
        let containers = self
            .runtime_call("list", self.client.list_containers(true))
            .await?;
        let mut fresh = Registry::rebuild(&self.config, &containers);
        fresh.carry_over(registry);
        *registry = fresh;
        set_managed_gauge(registry);
        Ok(registry.len())
    }

    /// 레지스트리에서 찾고, 비어 있거나 없으면 런타임 목록으로 다시 만든 뒤 찾습니다.
    async fn resolve_locked(
        &self,
        registry: &mut Registry,
        name: &str,
    ) -> Result<Option<ServerInstance>, LifecycleError> {
        if let Some(instance) = registry.resolve(&self.config, name) {
            return Ok(Some(instance.clone()));
        }
        debug!(name, "registry miss, rebuilding from runtime");
        self.rebuild_locked(registry).await?;
        Ok(registry.resolve(&self.config, name).cloned())
    }

    async fn broadcast_locked(
        &self,
        registry: &mut Registry,
        action: Action,
    ) -> Result<ActionOutcome, LifecycleError> {
        if registry.is_empty() {
            self.rebuild_locked(registry).await?;
        }
        let targets: Vec<ServerInstance> = registry.instances().cloned().collect();

        let mut applied = Vec::with_capacity(targets.len());
        let mut failed = Vec::new();
        for instance in &targets {
            match self.apply_one(registry, action, instance).await {
                Ok(true) => applied.push(instance.container_name.clone()),
                Ok(false) => {
                    debug!(container = %instance.container_name, "container vanished during broadcast");
                }
                Err(e) => {
                    warn!(
                        container = %instance.container_name,
                        action = %action,
                        error = %e,
                        "broadcast action failed"
                    );
                    failed.push(BroadcastFailure {
                        name: instance.container_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            action = %action,
            applied = applied.len(),
            failed = failed.len(),
            "broadcast action finished"
        );
        Ok(ActionOutcome::Broadcast { applied, failed })
    }

    /// 한 인스턴스에 동작을 적용합니다.
    ///
    /// 런타임에 컨테이너가 없으면 레지스트리에서 지우고 `Ok(false)`를 반환합니다.
    async fn apply_one(
        &self,
        registry: &mut Registry,
        action: Action,
        instance: &ServerInstance,
    ) -> Result<bool, LifecycleError> {
        let Some(container_id) = instance.container_id.as_deref() else {
            return Ok(false);
        };
        let name = instance.container_name.as_str();

        let result = match action {
            Action::Start => {
                self.runtime_call("start", self.client.start_container(container_id))
                    .await
            }
            Action::Stop => {
                self.runtime_call("stop", self.client.stop_container(container_id))
                    .await
            }
            Action::Restart => {
                self.runtime_call("restart", self.client.restart_container(container_id))
                    .await
            }
            Action::Remove => self.stop_and_remove(container_id).await,
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_not_modified() => {
                debug!(container = %name, action = %action, "runtime reports no change");
            }
            Err(LifecycleError::ContainerNotFound(_)) => {
                info!(container = %name, action = %action, "container no longer exists at runtime");
                registry.remove(name);
                set_managed_gauge(registry);
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        metrics::counter!(m::LIFECYCLE_OPERATIONS_TOTAL, m::LABEL_OPERATION => action.as_str())
            .increment(1);

        match action {
            Action::Remove => {
                registry.remove(name);
                set_managed_gauge(registry);
                metrics::counter!(m::INSTANCES_REMOVED_TOTAL).increment(1);
                info!(
                    container = %name,
                    data_path = %instance.data_path.display(),
                    "container removed, data directory kept"
                );
            }
            Action::Start | Action::Restart | Action::Stop => {
                let state = if action == Action::Stop {
                    LifecycleState::Stopped
                } else {
                    LifecycleState::Running
                };
                let mut updated = instance.clone();
                updated.state = state;
                registry.insert(updated);
                info!(container = %name, action = %action, "lifecycle action applied");
            }
        }
        Ok(true)
    }

    async fn stop_and_remove(&self, container_id: &str) -> Result<(), LifecycleError> {
        match self
            .runtime_call("stop", self.client.stop_container(container_id))
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_modified() => {}
            Err(e) => return Err(e),
        }
        self.runtime_call("remove", self.client.remove_container(container_id))
            .await
    }

    /// 이름 없는 인스턴스에 대해 현재 점유 테이블을 만듭니다.
    async fn claim_table(&self) -> Result<ClaimTable, LifecycleError> {
        let scanned = scan_instances(&self.config).await;
        let containers = self
            .runtime_call("list", self.client.list_containers(true))
            .await?;
        Ok(ClaimTable::collect(&self.config, &scanned, &containers))
    }

    /// 새 인스턴스의 데이터 디렉토리를 만들고 컨테이너를 생성합니다.
    async fn create_fresh_container(
        &self,
        instance_id: Uuid,
        spec: &InstanceSpec,
        port: u16,
    ) -> Result<String, LifecycleError> {
        prepare_directory(&self.config.data_path(&instance_id)).await?;
        self.create_container(instance_id, spec, port).await
    }

    /// 런타임에 컨테이너를 생성하고 ID를 반환합니다.
    async fn create_container(
        &self,
        instance_id: Uuid,
        spec: &InstanceSpec,
        port: u16,
    ) -> Result<String, LifecycleError> {
        let data_path = self.config.data_path(&instance_id);
        let container_spec = ContainerSpec {
            name: self.config.container_name(&instance_id),
            image: self.config.image.clone(),
            env: spec.env(),
            binds: vec![format!(
                "{}:{}",
                data_path.display(),
                self.config.data_mount
            )],
            host_ip: self.config.bind_host.clone(),
            host_port: port,
            container_port: self.config.container_port,
        };

        let container_id = self
            .runtime_call("create", self.client.create_container(&container_spec))
            .await?;
        debug!(container = %container_spec.name, container_id = %container_id, port, "container created");
        Ok(container_id)
    }

    /// 생성된 컨테이너의 메타데이터를 쓰고, 등록한 뒤 시작합니다.
    ///
    /// 시작에 실패해도 생성된 인스턴스는 `Created` 상태로 등록되어 남습니다.
    async fn provision(
        &self,
        registry: &mut Registry,
        instance_id: Uuid,
        spec: &InstanceSpec,
        port: u16,
        container_id: String,
    ) -> Result<ServerInstance, LifecycleError> {
        let data_path = self.config.data_path(&instance_id);
        let mut instance =
            ServerInstance::provisioned(&self.config, instance_id, spec, port, container_id.clone());

        InstanceMetadata {
            container_name: instance.container_name.clone(),
            container_id: container_id.clone(),
            path: data_path,
            port,
        }
        .write(&instance.data_path)
        .await?;

        registry.insert(instance.clone());
        set_managed_gauge(registry);

        match self
            .runtime_call("start", self.client.start_container(&container_id))
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_modified() => {}
            Err(e) => {
                warn!(container = %instance.container_name, error = %e, "container created but failed to start");
                return Err(e);
            }
        }

        instance.state = LifecycleState::Running;
        registry.insert(instance.clone());
        Ok(instance)
    }

    /// 시작 로그를 출력 싱크로 보냅니다.
    ///
    /// 타임아웃이나 관리자 종료로 끊기며, 실패해도 생성 결과에는 영향이 없습니다.
    async fn stream_startup_logs(&self, instance: &ServerInstance) {
        let Some(limit) = self.config.log_stream_timeout() else {
            return;
        };
        let Some(container_id) = instance.container_id.as_deref() else {
            return;
        };

        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(container = %instance.container_name, "log stream cancelled by shutdown");
            }
            result = tokio::time::timeout(limit, self.client.stream_logs(container_id, self.sink.as_ref())) => {
                match result {
                    Ok(Ok(())) => debug!(container = %instance.container_name, "log stream closed"),
                    Ok(Err(e)) => warn!(container = %instance.container_name, error = %e, "log stream failed"),
                    Err(_) => debug!(container = %instance.container_name, "log stream time limit reached"),
                }
            }
        }
    }
}

fn set_managed_gauge(registry: &Registry) {
    metrics::gauge!(m::MANAGED_INSTANCES).set(registry.len() as f64);
}

async fn prepare_directory(path: &Path) -> Result<(), LifecycleError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| LifecycleError::Directory {
            path: path.to_path_buf(),
            source,
        })
}

/// 실패한 생성이 남긴 디렉토리를 지웁니다. 실패는 경고만 남깁니다.
async fn discard_directory(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!(path = %path.display(), "discarded data directory of failed create"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to discard data directory"),
    }
}

async fn ensure_directory_exists(path: &Path) -> Result<(), LifecycleError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(LifecycleError::DataDirectoryMissing {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(LifecycleError::DataDirectoryMissing {
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(LifecycleError::Directory {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// 라이프사이클 관리자 빌더
pub struct LifecycleManagerBuilder<C: RuntimeClient> {
    config: ManagerConfig,
    client: Option<Arc<C>>,
    sink: Option<Arc<dyn OutputSink>>,
}

impl<C: RuntimeClient> LifecycleManagerBuilder<C> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: ManagerConfig::default(),
            client: None,
            sink: None,
        }
    }

    /// 관리자 설정을 지정합니다.
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// 런타임 클라이언트를 지정합니다.
    pub fn client(mut self, client: Arc<C>) -> Self {
        self.client = Some(client);
        self
    }

    /// 출력 싱크를 지정합니다. 지정하지 않으면 `TracingSink`.
    pub fn sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 관리자를 생성합니다.
    ///
    /// # Errors
    ///
    /// 클라이언트가 없거나 설정이 올바르지 않으면 `LifecycleError::Config`.
    pub fn build(self) -> Result<LifecycleManager<C>, LifecycleError> {
        let client = self.client.ok_or_else(|| LifecycleError::Config {
            field: "client".to_owned(),
            reason: "runtime client is required".to_owned(),
        })?;
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        LifecycleManager::new(self.config, client, sink)
    }
}

impl<C: RuntimeClient> Default for LifecycleManagerBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
