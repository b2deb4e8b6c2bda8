//! 호스트 포트 할당
//!
//! [`PortAllocator`]는 시작 포트부터 위로 올라가며 다음 두 조건을 모두
//! 만족하는 가장 낮은 포트를 찾습니다.
//!
//! 1. 호스트에서 실제로 바인드할 수 있다 (주소 재사용 허용, 즉시 해제)
//! 2. 관리 중인 어떤 인스턴스도 점유하고 있지 않다 ([`ClaimTable`])
//!
//! 탐색은 `max_port_scan`과 65535에서 멈추며, 찾지 못하면
//! [`LifecycleError::PortsExhausted`]를 반환합니다.

use std::collections::{BTreeMap, HashSet};
use std::net::{IpAddr, SocketAddr, TcpListener};

use berth_core::metrics as m;
use berth_core::types::ContainerSummary;
use tracing::{debug, warn};

use crate::config::ManagerConfig;
use crate::error::LifecycleError;
use crate::metadata::ScannedInstance;

/// 관리 인스턴스가 점유한 포트 목록 (포트 -> 소유 컨테이너 이름)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimTable {
    claims: BTreeMap<u16, String>,
}

impl ClaimTable {
    /// 빈 테이블을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 메타데이터 스캔과 런타임 목록으로 점유 테이블을 만듭니다.
    ///
    /// 메타데이터가 우선입니다. 메타데이터를 읽을 수 없는 인스턴스에 한해
    /// 접두어가 붙은 컨테이너의 공개 포트를 보충합니다.
    pub fn collect(
        config: &ManagerConfig,
        scanned: &[ScannedInstance],
        containers: &[ContainerSummary],
    ) -> Self {
        let mut table = Self::new();
        let mut covered = HashSet::new();

        for instance in scanned {
            if let Some(metadata) = &instance.metadata {
                table.insert(metadata.port, &metadata.container_name);
                covered.insert(instance.instance_id);
            }
        }

        for container in containers {
            if !config.owns_name(&container.name) {
                continue;
            }
            let has_metadata = config
                .instance_id_from_name(&container.name)
                .is_some_and(|id| covered.contains(&id));
            if has_metadata {
                continue;
            }
            for port in container.public_ports() {
                debug!(container = %container.name, port, "claim from live container without metadata");
                table.insert(port, &container.name);
            }
        }

        table
    }

    /// 포트 점유를 기록합니다. 이미 있으면 기존 소유자를 유지합니다.
    pub fn insert(&mut self, port: u16, owner: &str) {
        if let Some(existing) = self.claims.get(&port) {
            if existing != owner {
                warn!(port, existing = %existing, other = %owner, "port claimed by two instances");
            }
            return;
        }
        self.claims.insert(port, owner.to_owned());
    }

    /// 포트가 점유되었는지 확인합니다.
    pub fn contains(&self, port: u16) -> bool {
        self.claims.contains_key(&port)
    }

    /// 포트의 소유자를 반환합니다.
    pub fn owner_of(&self, port: u16) -> Option<&str> {
        self.claims.get(&port).map(String::as_str)
    }

    /// 특정 소유자의 점유를 제외한 테이블을 반환합니다.
    pub fn without_owner(&self, owner: &str) -> Self {
        Self {
            claims: self
                .claims
                .iter()
                .filter(|(_, o)| o.as_str() != owner)
                .map(|(p, o)| (*p, o.clone()))
                .collect(),
        }
    }

    /// 점유된 포트 수
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// 점유된 포트가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// 호스트 포트 할당기
#[derive(Debug, Clone)]
pub struct PortAllocator {
    bind_addr: IpAddr,
    max_scan: u32,
}

impl PortAllocator {
    /// 새 할당기를 생성합니다.
    pub fn new(bind_addr: IpAddr, max_scan: u32) -> Self {
        Self {
            bind_addr,
            max_scan: max_scan.max(1),
        }
    }

    /// 설정에서 할당기를 생성합니다.
    pub fn from_config(config: &ManagerConfig) -> Result<Self, LifecycleError> {
        Ok(Self::new(config.bind_addr()?, config.max_port_scan))
    }

    /// `start`부터 사용 가능한 가장 낮은 포트를 찾습니다.
    ///
    /// # Errors
    ///
    /// 후보를 모두 검사해도 없으면 `LifecycleError::PortsExhausted`.
    pub fn allocate(&self, start: u16, claims: &ClaimTable) -> Result<u16, LifecycleError> {
        let end = u32::from(start)
            .saturating_add(self.max_scan - 1)
            .min(u32::from(u16::MAX));
        let mut scanned = 0u32;

        for candidate in u32::from(start)..=end {
            scanned += 1;
            // end <= u16::MAX
            let port = candidate as u16;
            if self.is_available(port, claims) {
                debug!(port, scanned, "port allocated");
                return Ok(port);
            }
            metrics::counter!(m::PORT_CANDIDATES_REJECTED_TOTAL).increment(1);
        }

        Err(LifecycleError::PortsExhausted { start, scanned })
    }

    /// 단일 포트에 대해 바인드 검사와 점유 검사를 수행합니다.
    ///
    /// 런타임 리액터를 쓰지 않으므로 어디서든 호출할 수 있습니다.
    pub fn is_available(&self, port: u16, claims: &ClaimTable) -> bool {
        if port == 0 || !self.is_bindable(port) {
            return false;
        }
        !claims.contains(port)
    }

    /// 임시 리스닝 소켓으로 포트를 바인드할 수 있는지 확인합니다.
    ///
    /// 표준 라이브러리 리스너는 Unix에서 `SO_REUSEADDR`을 켠 채로 바인드하며,
    /// 반환 즉시 닫힙니다.
    fn is_bindable(&self, port: u16) -> bool {
        TcpListener::bind(SocketAddr::new(self.bind_addr, port)).is_ok()
    }
}
