//! 에러 타입 — nginx 설정 편집 도메인 에러

/// nginx 설정 편집 에러
///
/// 호출자(CLI)는 variant별로 구분된 메시지를 렌더링합니다.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// 설정 파일이 존재하지 않음
    #[error("nginx config not found: {path}")]
    ConfigNotFound { path: String },

    /// 문서가 기대한 스켈레톤 구조와 다름 (앵커 블록 누락 등)
    #[error("config structure mismatch: {reason}")]
    Structure { reason: String },

    /// 백업 또는 본문 쓰기 실패
    #[error("failed to write config {path}: {reason}")]
    Write { path: String, reason: String },

    /// 대상 URL이 유효하지 않음
    #[error("invalid target url '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    /// 그 외 I/O 에러 (읽기 실패 등)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_display() {
        let err = EditorError::ConfigNotFound {
            path: "nginx/nginx.conf".to_owned(),
        };
        assert_eq!(err.to_string(), "nginx config not found: nginx/nginx.conf");
    }

    #[test]
    fn structure_error_carries_reason() {
        let err = EditorError::Structure {
            reason: "anchor location '/openai/' not found".to_owned(),
        };
        assert!(err.to_string().contains("/openai/"));
    }

    #[test]
    fn invalid_target_names_the_url() {
        let err = EditorError::InvalidTarget {
            url: "not a url".to_owned(),
            reason: "relative URL without a base".to_owned(),
        };
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: EditorError = io.into();
        assert!(matches!(err, EditorError::Io(_)));
    }
}
