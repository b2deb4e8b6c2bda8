//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `berth_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 라이프사이클 동작 레이블 키 (create, recreate, start, stop, restart, remove)
pub const LABEL_OPERATION: &str = "operation";

// ─── 인스턴스 관리 메트릭 ───────────────────────────────────────────

/// 생성된 인스턴스 수 (counter, label: operation = create | recreate)
pub const INSTANCES_CREATED_TOTAL: &str = "berth_instances_created_total";

/// 제거된 인스턴스 수 (counter)
pub const INSTANCES_REMOVED_TOTAL: &str = "berth_instances_removed_total";

/// 라이프사이클 동작 수 (counter, label: operation)
pub const LIFECYCLE_OPERATIONS_TOTAL: &str = "berth_lifecycle_operations_total";

/// 런타임 호출 실패 수 (counter, label: operation)
pub const RUNTIME_FAILURES_TOTAL: &str = "berth_runtime_failures_total";

/// 레지스트리에 등록된 인스턴스 수 (gauge)
pub const MANAGED_INSTANCES: &str = "berth_managed_instances";

/// 포트 탐색 중 거부된 후보 수 (counter)
pub const PORT_CANDIDATES_REJECTED_TOTAL: &str = "berth_port_candidates_rejected_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        INSTANCES_CREATED_TOTAL,
        "Total number of server instances created or recreated"
    );
    describe_counter!(
        INSTANCES_REMOVED_TOTAL,
        "Total number of runtime containers removed"
    );
    describe_counter!(
        LIFECYCLE_OPERATIONS_TOTAL,
        "Total number of lifecycle operations dispatched to the runtime"
    );
    describe_counter!(
        RUNTIME_FAILURES_TOTAL,
        "Total number of runtime calls that failed"
    );
    describe_gauge!(
        MANAGED_INSTANCES,
        "Number of instances currently held in the registry"
    );
    describe_counter!(
        PORT_CANDIDATES_REJECTED_TOTAL,
        "Port candidates rejected because they were bound or claimed"
    );
}
