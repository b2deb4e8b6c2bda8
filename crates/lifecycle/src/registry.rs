//! 인스턴스 레지스트리
//!
//! 컨테이너 이름 -> [`ServerInstance`] 캐시입니다. 권위 있는 정보가 아니며
//! 런타임의 컨테이너 목록으로 언제든 처음부터 다시 만들 수 있습니다.

use std::collections::BTreeMap;

use berth_core::types::ContainerSummary;
use tracing::warn;
use uuid::Uuid;

use crate::config::ManagerConfig;
use crate::instance::ServerInstance;

/// 컨테이너 이름으로 정렬된 인스턴스 캐시
#[derive(Debug, Clone, Default)]
pub struct Registry {
    instances: BTreeMap<String, ServerInstance>,
}

impl Registry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 런타임 목록에서 레지스트리를 다시 만듭니다.
    ///
    /// 관리 접두어가 붙은 컨테이너만 포함하며, 접미어가 UUID가 아닌 이름은
    /// 경고 후 건너뜁니다. 결과는 목록 순서와 무관합니다.
    pub fn rebuild(config: &ManagerConfig, containers: &[ContainerSummary]) -> Self {
        let mut instances = BTreeMap::new();
        for summary in containers {
            if !config.owns_name(&summary.name) {
                continue;
            }
            match ServerInstance::from_summary(config, summary) {
                Some(instance) => {
                    instances.insert(instance.container_name.clone(), instance);
                }
                None => {
                    warn!(container = %summary.name, "prefixed container without instance id, skipping");
                }
            }
        }
        Self { instances }
    }

    /// 이전 레지스트리에만 있던 정보(플랫폼, 버전, 메모리, 정지 중인 포트)를 이어받습니다.
    ///
    /// 런타임 목록은 생성 파라미터를 알려주지 않으므로, 재조정 후에도
    /// 이 프로세스가 만든 인스턴스의 정보를 유지하기 위해 사용합니다.
    pub fn carry_over(&mut self, previous: &Registry) {
        for (name, instance) in &mut self.instances {
            let Some(old) = previous.instances.get(name) else {
                continue;
            };
            if old.instance_id != instance.instance_id {
                continue;
            }
            instance.platform = instance.platform.take().or_else(|| old.platform.clone());
            instance.version = instance.version.take().or_else(|| old.version.clone());
            instance.memory_mb = instance.memory_mb.or(old.memory_mb);
            instance.port = instance.port.or(old.port);
        }
    }

    /// 이름 또는 인스턴스 ID로 인스턴스를 찾습니다.
    ///
    /// `<prefix>-<uuid>`, `/<prefix>-<uuid>`, `<uuid>` 형식을 받습니다.
    pub fn resolve(&self, config: &ManagerConfig, name: &str) -> Option<&ServerInstance> {
        let key = canonical_name(config, name);
        self.instances.get(&key)
    }

    /// 인스턴스를 등록하거나 갱신합니다.
    pub fn insert(&mut self, instance: ServerInstance) {
        self.instances
            .insert(instance.container_name.clone(), instance);
    }

    /// 인스턴스를 제거합니다.
    pub fn remove(&mut self, container_name: &str) -> Option<ServerInstance> {
        self.instances.remove(container_name)
    }

    /// 등록된 컨테이너 이름 (정렬됨)
    pub fn names(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    /// 등록된 인스턴스 (이름 순)
    pub fn instances(&self) -> impl Iterator<Item = &ServerInstance> {
        self.instances.values()
    }

    /// 등록된 인스턴스 수
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// 사용자 입력을 컨테이너 이름으로 정규화합니다.
///
/// 선행 `/`를 제거하고, UUID만 주어지면 `<prefix>-<uuid>`로 바꿉니다.
pub fn canonical_name(config: &ManagerConfig, name: &str) -> String {
    let trimmed = name.trim().trim_start_matches('/');
    match Uuid::parse_str(trimmed) {
        Ok(id) => config.container_name(&id),
        Err(_) => trimmed.to_owned(),
    }
}
