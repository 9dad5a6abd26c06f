//! 설정 관리 — routepost.toml 파싱 및 런타임 설정
//!
//! [`RoutepostConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`ROUTEPOST_NGINX_CONF_PATH=...` 형식)
//! 3. 설정 파일 (`routepost.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), routepost_core::error::RoutepostError> {
//! use routepost_core::config::RoutepostConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = RoutepostConfig::load("routepost.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = RoutepostConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RoutepostError};

/// Routepost 통합 설정
///
/// `routepost.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 크레이트는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutepostConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// nginx 설정 파일 / 컨테이너 설정
    #[serde(default)]
    pub nginx: NginxConfig,
    /// 라우트 스켈레톤 설정
    #[serde(default)]
    pub routes: RoutesConfig,
}

impl RoutepostConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RoutepostError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, RoutepostError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RoutepostError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                RoutepostError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, RoutepostError> {
        toml::from_str(toml_str).map_err(|e| {
            RoutepostError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `ROUTEPOST_{SECTION}_{FIELD}`
    /// 예: `ROUTEPOST_NGINX_CONTAINER_NAME=my_nginx`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "ROUTEPOST_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "ROUTEPOST_GENERAL_LOG_FORMAT");

        // Nginx
        override_string(&mut self.nginx.conf_path, "ROUTEPOST_NGINX_CONF_PATH");
        override_string(
            &mut self.nginx.container_name,
            "ROUTEPOST_NGINX_CONTAINER_NAME",
        );
        override_string(&mut self.nginx.docker_socket, "ROUTEPOST_NGINX_DOCKER_SOCKET");

        // Routes
        override_string(&mut self.routes.anchor_path, "ROUTEPOST_ROUTES_ANCHOR_PATH");
        override_string(
            &mut self.routes.server_marker,
            "ROUTEPOST_ROUTES_SERVER_MARKER",
        );
        override_csv(
            &mut self.routes.reserved_paths,
            "ROUTEPOST_ROUTES_RESERVED_PATHS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RoutepostError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.nginx.conf_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "nginx.conf_path".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.nginx.container_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "nginx.container_name".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        // 앵커 경로는 정규화된 형태(양끝 슬래시)여야 기존 블록과 매칭됨
        if !self.routes.anchor_path.starts_with('/') || !self.routes.anchor_path.ends_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "routes.anchor_path".to_owned(),
                reason: "must start and end with '/'".to_owned(),
            }
            .into());
        }

        if !self.routes.server_marker.starts_with('#') {
            return Err(ConfigError::InvalidValue {
                field: "routes.server_marker".to_owned(),
                reason: "must be a comment line starting with '#'".to_owned(),
            }
            .into());
        }

        if self.routes.reserved_paths.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "routes.reserved_paths".to_owned(),
                reason: "must name at least the built-in routes".to_owned(),
            }
            .into());
        }

        for path in &self.routes.reserved_paths {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidValue {
                    field: "routes.reserved_paths".to_owned(),
                    reason: format!("'{path}' must start with '/'"),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// nginx 설정 파일과 컨테이너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NginxConfig {
    /// nginx.conf 경로
    pub conf_path: String,
    /// nginx 컨테이너 이름
    pub container_name: String,
    /// Docker 소켓 경로 (빈 문자열이면 플랫폼 기본값)
    pub docker_socket: String,
}

impl Default for NginxConfig {
    fn default() -> Self {
        Self {
            conf_path: "nginx/nginx.conf".to_owned(),
            container_name: "routepost_nginx".to_owned(),
            docker_socket: String::new(),
        }
    }
}

/// 라우트 스켈레톤 설정
///
/// 편집기가 의존하는 수작성 스켈레톤의 고정 문자열들입니다.
/// 기본값은 저장소에 포함된 `nginx/nginx.conf` 스켈레톤과 일치합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// 신규 location 블록이 뒤에 삽입되는 기준 경로
    pub anchor_path: String,
    /// upstream 삽입 위치 폴백에 쓰이는 server 섹션 주석
    pub server_marker: String,
    /// 목록에서 제외되는 내장 경로
    pub reserved_paths: Vec<String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            anchor_path: "/openai/".to_owned(),
            server_marker: "# HTTP server".to_owned(),
            reserved_paths: vec!["/openai/".to_owned(), "/health".to_owned()],
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}
