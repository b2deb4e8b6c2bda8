//! 도메인 타입 — 크레이트 전역에서 사용되는 공통 타입
//!
//! 런타임이 보고하는 컨테이너 정보와 외부에 노출되는 서버 상태를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 외부에 노출되는 서버 상태
///
/// 런타임의 `running` 상태만 `Online`으로, 그 외(컨테이너 없음 포함)는
/// 모두 `Offline`으로 취급합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerState {
    /// 컨테이너 실행 중
    Online,
    /// 정지됨, 생성만 됨, 또는 컨테이너 없음
    #[default]
    Offline,
}

impl ServerState {
    /// 런타임 상태 문자열을 서버 상태로 변환합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_runtime_state(state: &str) -> Self {
        if state.eq_ignore_ascii_case("running") {
            Self::Online
        } else {
            Self::Offline
        }
    }

    /// 온라인 여부
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "ONLINE"),
            Self::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// 컨테이너가 공개한 포트 매핑
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPort {
    /// 컨테이너 내부 포트
    pub private_port: u16,
    /// 호스트에 공개된 포트 (정지된 컨테이너는 보통 없음)
    pub public_port: Option<u16>,
    /// 프로토콜 (tcp, udp)
    pub protocol: String,
}

/// 런타임 컨테이너 요약 정보
///
/// 런타임의 컨테이너 목록 조회 결과 한 건을 나타냅니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// 컨테이너 ID
    pub id: String,
    /// 컨테이너 이름 (선행 `/` 제거됨)
    pub name: String,
    /// 이미지명
    pub image: String,
    /// 런타임 상태 (created, running, exited 등)
    pub state: String,
    /// 공개 포트 목록
    pub ports: Vec<PublishedPort>,
}

impl ContainerSummary {
    /// 런타임 상태를 서버 상태로 변환합니다.
    pub fn server_state(&self) -> ServerState {
        ServerState::from_runtime_state(&self.state)
    }

    /// 호스트에 공개된 포트 목록을 반환합니다.
    pub fn public_ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().filter_map(|p| p.public_port)
    }
}

impl fmt::Display for ContainerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) state={}",
            self.name,
            &self.id[..12.min(self.id.len())],
            self.state,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(state: &str) -> ContainerSummary {
        ContainerSummary {
            id: "0123456789abcdef0123".to_owned(),
            name: "gameserver-a".to_owned(),
            image: "itzg/minecraft-server".to_owned(),
            state: state.to_owned(),
            ports: vec![
                PublishedPort {
                    private_port: 25565,
                    public_port: Some(10000),
                    protocol: "tcp".to_owned(),
                },
                PublishedPort {
                    private_port: 25575,
                    public_port: None,
                    protocol: "tcp".to_owned(),
                },
            ],
        }
    }

    #[test]
    fn running_maps_to_online() {
        assert_eq!(ServerState::from_runtime_state("running"), ServerState::Online);
        assert_eq!(ServerState::from_runtime_state("RUNNING"), ServerState::Online);
    }

    #[test]
    fn everything_else_maps_to_offline() {
        for state in ["exited", "created", "paused", "restarting", "dead", ""] {
            assert_eq!(ServerState::from_runtime_state(state), ServerState::Offline);
        }
    }

    #[test]
    fn server_state_display_and_serde() {
        assert_eq!(ServerState::Online.to_string(), "ONLINE");
        assert_eq!(ServerState::Offline.to_string(), "OFFLINE");
        assert_eq!(
            serde_json::to_string(&ServerState::Online).unwrap(),
            "\"ONLINE\""
        );
    }

    #[test]
    fn summary_public_ports_skip_unpublished() {
        let s = summary("running");
        assert_eq!(s.public_ports().collect::<Vec<_>>(), vec![10000]);
        assert!(s.server_state().is_online());
    }

    #[test]
    fn summary_display_truncates_id() {
        let display = summary("exited").to_string();
        assert!(display.contains("gameserver-a"));
        assert!(display.contains("(0123456789ab)"));
        assert!(display.contains("exited"));
    }
}
