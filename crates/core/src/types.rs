//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 모든 크레이트가 공유하는 데이터 구조를 정의합니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// 프록시 라우팅 규칙
///
/// nginx.conf의 location 블록에서 파생되는 논리 엔트리입니다.
/// 별도 저장소 없이 설정 파일을 다시 읽어 재구성합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRule {
    /// 경로 프리픽스 (항상 `/`로 시작하고 끝남)
    pub endpoint: String,
    /// 대상 베이스 URL
    pub target: String,
    /// 사용자 지정 이름 (자동 생성 주석이면 None)
    pub name: Option<String>,
}

impl fmt::Display for ProxyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.endpoint,
            self.target,
            self.name.as_deref().unwrap_or("unnamed"),
        )
    }
}

/// 컨테이너 정보
///
/// nginx 컨테이너의 메타데이터를 나타냅니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// 컨테이너 ID
    pub id: String,
    /// 컨테이너 이름
    pub name: String,
    /// 이미지명
    pub image: String,
    /// 상태 (running, exited 등)
    pub status: String,
    /// 생성 시각
    pub created_at: SystemTime,
}

impl ContainerInfo {
    /// 컨테이너가 실행 중인지 여부
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }
}

impl fmt::Display for ContainerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) image={} status={}",
            self.name,
            &self.id[..12.min(self.id.len())],
            self.image,
            self.status,
        )
    }
}
