//! routepost.toml 통합 설정 테스트
//!
//! - routepost.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 파일 로딩 / 잘못된 형식 에러 테스트

use routepost_core::config::RoutepostConfig;
use routepost_core::error::{ConfigError, RoutepostError};

// =============================================================================
// routepost.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../routepost.toml.example");
    let config = RoutepostConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(config.nginx.conf_path, "nginx/nginx.conf");
    assert_eq!(config.nginx.container_name, "routepost_nginx");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../routepost.toml.example");
    let config = RoutepostConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../routepost.toml.example");
    let from_file = RoutepostConfig::parse(content).expect("should parse");
    let from_code = RoutepostConfig::default();

    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);
    assert_eq!(from_file.nginx.conf_path, from_code.nginx.conf_path);
    assert_eq!(
        from_file.nginx.container_name,
        from_code.nginx.container_name
    );
    assert_eq!(from_file.routes.anchor_path, from_code.routes.anchor_path);
    assert_eq!(
        from_file.routes.server_marker,
        from_code.routes.server_marker
    );
    assert_eq!(
        from_file.routes.reserved_paths,
        from_code.routes.reserved_paths
    );
}

// =============================================================================
// 부분 설정 로딩 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let toml = r#"
[general]
log_level = "debug"
log_format = "json"
"#;
    let config = RoutepostConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "json");
    // 나머지 섹션은 기본값
    assert_eq!(config.nginx.container_name, "routepost_nginx");
    assert_eq!(config.routes.anchor_path, "/openai/");
}

#[test]
fn partial_config_routes_only() {
    let toml = r#"
[routes]
anchor_path = "/base/"
reserved_paths = ["/base/", "/status"]
"#;
    let config = RoutepostConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.routes.anchor_path, "/base/");
    assert_eq!(config.routes.reserved_paths, vec!["/base/", "/status"]);
    // server_marker는 기본값 유지
    assert_eq!(config.routes.server_marker, "# HTTP server");
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn load_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("routepost.toml");
    tokio::fs::write(&path, "[general]\nlog_level = \"warn\"\n")
        .await
        .expect("write config");

    let config = RoutepostConfig::from_file(&path).await.expect("load");
    assert_eq!(config.general.log_level, "warn");
}

#[tokio::test]
async fn load_missing_file_reports_not_found() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing.toml");

    let err = RoutepostConfig::from_file(&path).await.unwrap_err();
    match err {
        RoutepostError::Config(ConfigError::FileNotFound { path: p }) => {
            assert!(p.contains("missing.toml"));
        }
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn load_invalid_value_fails_validation() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("routepost.toml");
    tokio::fs::write(&path, "[general]\nlog_level = \"shout\"\n")
        .await
        .expect("write config");

    let err = RoutepostConfig::from_file(&path).await.unwrap_err();
    assert!(matches!(
        err,
        RoutepostError::Config(ConfigError::InvalidValue { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[nginx]
container_name = "from_file"
"#;
    let original = std::env::var("ROUTEPOST_NGINX_CONTAINER_NAME").ok();

    unsafe {
        std::env::set_var("ROUTEPOST_NGINX_CONTAINER_NAME", "from_env");
    }

    let mut config = RoutepostConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();

    assert_eq!(config.nginx.container_name, "from_env");

    unsafe {
        match original {
            Some(val) => std::env::set_var("ROUTEPOST_NGINX_CONTAINER_NAME", val),
            None => std::env::remove_var("ROUTEPOST_NGINX_CONTAINER_NAME"),
        }
    }
}

#[test]
#[serial_test::serial]
fn env_override_csv_for_reserved_paths() {
    let original = std::env::var("ROUTEPOST_ROUTES_RESERVED_PATHS").ok();

    unsafe {
        std::env::set_var("ROUTEPOST_ROUTES_RESERVED_PATHS", "/openai/, /health, /metrics");
    }

    let mut config = RoutepostConfig::default();
    config.apply_env_overrides();

    assert_eq!(
        config.routes.reserved_paths,
        vec!["/openai/", "/health", "/metrics"]
    );

    unsafe {
        match original {
            Some(val) => std::env::set_var("ROUTEPOST_ROUTES_RESERVED_PATHS", val),
            None => std::env::remove_var("ROUTEPOST_ROUTES_RESERVED_PATHS"),
        }
    }
}
