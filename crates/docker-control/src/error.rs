//! 에러 타입 — 컨테이너 제어 도메인 에러

/// 컨테이너 제어 에러
#[derive(Debug, thiserror::Error)]
pub enum DockerControlError {
    /// Docker 데몬 연결 실패
    #[error("docker connection failed: {0}")]
    Connection(String),

    /// Docker API 호출 실패
    #[error("docker api error: {0}")]
    Api(String),

    /// 컨테이너를 찾을 수 없음
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// 컨테이너가 실행 중이 아님
    #[error("container not running: {0}")]
    ContainerNotRunning(String),

    /// 컨테이너 내부 명령 실행 실패
    #[error("exec failed in container '{container}': {reason}")]
    ExecFailed { container: String, reason: String },

    /// nginx 설정 문법 검증 실패 (`nginx -t`)
    #[error("nginx config test failed: {output}")]
    ConfigTest { output: String },
}
