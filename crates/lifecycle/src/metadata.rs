//! 인스턴스 메타데이터 파일 (`server-info.json`)
//!
//! 각 인스턴스 데이터 디렉토리에 컨테이너 이름, 컨테이너 ID, 경로, 포트를
//! 기록합니다. 컨테이너가 없어진 인스턴스의 포트 소유권을 복구하는 데 사용됩니다.
//!
//! ```json
//! {"containerName":"gameserver-<uuid>","containerId":"<id>","path":"/srv/<uuid>/server","port":10000}
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{METADATA_FILE_NAME, ManagerConfig};
use crate::error::LifecycleError;

/// 인스턴스 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceMetadata {
    /// 컨테이너 이름
    pub container_name: String,
    /// 생성 시 런타임이 반환한 컨테이너 ID
    pub container_id: String,
    /// 호스트 데이터 경로
    pub path: PathBuf,
    /// 공개 호스트 포트
    pub port: u16,
}

impl InstanceMetadata {
    /// 데이터 경로의 메타데이터 파일을 읽습니다.
    ///
    /// # Errors
    ///
    /// 파일이 없거나 JSON이 올바르지 않으면 `LifecycleError::Metadata`.
    pub async fn read(data_path: &Path) -> Result<Self, LifecycleError> {
        let path = ManagerConfig::metadata_path(data_path);
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|e| metadata_err(&path, e.to_string()))?;
        serde_json::from_slice(&raw).map_err(|e| metadata_err(&path, e.to_string()))
    }

    /// 데이터 경로에 메타데이터 파일을 씁니다.
    ///
    /// 임시 파일에 쓴 뒤 이름을 바꾸므로, 읽는 쪽은 이전 파일 또는
    /// 완성된 새 파일 중 하나만 보게 됩니다.
    pub async fn write(&self, data_path: &Path) -> Result<(), LifecycleError> {
        let path = ManagerConfig::metadata_path(data_path);
        let tmp = data_path.join(format!(".{METADATA_FILE_NAME}.tmp"));
        let body = serde_json::to_vec_pretty(self).map_err(|e| metadata_err(&path, e.to_string()))?;

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| metadata_err(&tmp, e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| metadata_err(&path, e.to_string()))?;

        debug!(path = %path.display(), port = self.port, "instance metadata written");
        Ok(())
    }
}

fn metadata_err(path: &Path, reason: String) -> LifecycleError {
    LifecycleError::Metadata {
        path: path.to_path_buf(),
        reason,
    }
}

/// `base_path` 스캔 결과 한 건
#[derive(Debug, Clone)]
pub struct ScannedInstance {
    /// 디렉토리 이름에서 얻은 인스턴스 ID
    pub instance_id: Uuid,
    /// 메타데이터 (없거나 손상되었으면 `None`)
    pub metadata: Option<InstanceMetadata>,
}

/// `base_path` 아래의 모든 인스턴스 디렉토리를 스캔합니다.
///
/// UUID가 아닌 디렉토리는 건너뜁니다. 메타데이터가 없거나 손상된 인스턴스는
/// 경고를 남기고 `metadata: None`으로 포함합니다. `base_path`가 없으면 빈 목록.
pub async fn scan_instances(config: &ManagerConfig) -> Vec<ScannedInstance> {
    let mut entries = match tokio::fs::read_dir(&config.base_path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(
                base_path = %config.base_path.display(),
                error = %e,
                "cannot read instance directory root"
            );
            return Vec::new();
        }
    };

    let mut scanned = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "instance directory scan interrupted");
                break;
            }
        };

        let Some(instance_id) = entry
            .file_name()
            .to_str()
            .and_then(|name| Uuid::parse_str(name).ok())
        else {
            continue;
        };

        let data_path = config.data_path(&instance_id);
        let metadata = match InstanceMetadata::read(&data_path).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(instance = %instance_id, error = %e, "skipping unreadable instance metadata");
                None
            }
        };
        scanned.push(ScannedInstance {
            instance_id,
            metadata,
        });
    }

    scanned.sort_by_key(|s| s.instance_id);
    scanned
}
