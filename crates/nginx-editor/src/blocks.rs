//! Block synthesis: endpoint normalization, upstream naming, and the
//! upstream/location text the editor writes into the document.
//!
//! The emitted shapes are the contract the parser in [`crate::document`]
//! recognises, including the `# Upstream for <url>` annotation that later
//! recovers the verbatim target URL (scheme and path are not recoverable
//! from the `server host:port;` line alone).

use url::Url;

use crate::document::{Block, DisabledBlock, LocationBlock, UpstreamBlock};
use crate::error::EditorError;

/// Annotation prefix for auto-generated display comments. A location whose
/// annotation starts with this prefix has no user-supplied name.
pub const GENERATED_NAME_PREFIX: &str = "Proxy for ";

/// Annotation prefix recording an upstream's original target URL.
pub const UPSTREAM_ANNOTATION_PREFIX: &str = "Upstream for ";

/// Fixed proxy timeout applied to connect/send/read, in seconds.
const PROXY_TIMEOUT_SECS: u32 = 60;

/// Keepalive connection count for generated upstream pools.
const UPSTREAM_KEEPALIVE: u32 = 32;

/// 경로 프리픽스를 정규화합니다: 슬래시 하나로 시작하고 끝나게 만듭니다.
///
/// `claude`, `/claude`, `claude/`, `/claude/` 모두 `/claude/`가 됩니다.
pub fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}/")
    }
}

/// Validated proxy target.
///
/// Keeps the verbatim input string alongside the parsed pieces; the
/// verbatim form is what gets written into the upstream annotation.
#[derive(Debug, Clone)]
pub struct TargetUrl {
    raw: String,
    host: String,
    port: u16,
    https: bool,
    path: String,
}

impl TargetUrl {
    /// Parses and validates a target base URL.
    ///
    /// # Errors
    ///
    /// `EditorError::InvalidTarget` when the URL does not parse, has no
    /// host, or uses a scheme other than http/https.
    pub fn parse(raw: &str) -> Result<Self, EditorError> {
        let url = Url::parse(raw).map_err(|e| EditorError::InvalidTarget {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;

        let https = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(EditorError::InvalidTarget {
                    url: raw.to_owned(),
                    reason: format!("unsupported scheme '{other}'"),
                });
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| EditorError::InvalidTarget {
                url: raw.to_owned(),
                reason: "missing host".to_owned(),
            })?
            .to_owned();

        // 명시 포트가 없으면 스킴 기본 포트 (https=443, http=80)
        let port = url.port().unwrap_or(if https { 443 } else { 80 });

        Ok(Self {
            raw: raw.to_owned(),
            host,
            port,
            https,
            path: url.path().to_owned(),
        })
    }

    /// Verbatim URL string as given by the caller.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_https(&self) -> bool {
        self.https
    }

    /// Backend address for the upstream `server` directive.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upstream pool name derived from the host: dots and hyphens become
    /// underscores, suffixed `_upstream`. The port is not part of the name,
    /// so endpoints sharing a host share a pool.
    pub fn upstream_name(&self) -> String {
        let clean: String = self
            .host
            .chars()
            .map(|c| if c == '.' || c == '-' { '_' } else { c })
            .collect();
        format!("{clean}_upstream")
    }

    /// Path component used as the rewrite target prefix, trailing slash
    /// trimmed. `None` when the URL has no meaningful path.
    pub fn base_path(&self) -> Option<&str> {
        let trimmed = self.path.trim_end_matches('/');
        if trimmed.is_empty() { None } else { Some(trimmed) }
    }
}

/// Builds the upstream pool block for a target, annotation included.
pub fn upstream_block(target: &TargetUrl, name: &str) -> Block {
    let lines = vec![
        String::new(),
        format!("    # {UPSTREAM_ANNOTATION_PREFIX}{}", target.as_str()),
        format!("    upstream {name} {{"),
        format!("        server {};", target.server_addr()),
        format!("        keepalive {UPSTREAM_KEEPALIVE};"),
        "    }".to_owned(),
    ];
    Block::Upstream(UpstreamBlock {
        name: name.to_owned(),
        server_addr: Some(target.server_addr()),
        origin_url: Some(target.as_str().to_owned()),
        lines,
    })
}

/// Builds the live location block routing `endpoint` to `upstream_name`.
///
/// The block strips the endpoint prefix via `rewrite`, carries the
/// forwarding headers, upgrade passthrough and streaming-friendly buffer
/// settings, and leads with the display annotation (`display_name` or the
/// generated `Proxy for <url>` text).
pub fn location_block(
    endpoint: &str,
    target: &TargetUrl,
    upstream_name: &str,
    display_name: Option<&str>,
) -> LocationBlock {
    let annotation = match display_name {
        Some(name) => name.to_owned(),
        None => format!("{GENERATED_NAME_PREFIX}{}", target.as_str()),
    };

    let prefix = regex::escape(endpoint.trim_end_matches('/'));
    let rewrite = match target.base_path() {
        Some(base) => format!("            rewrite ^{prefix}/(.*) {base}/$1 break;"),
        None => format!("            rewrite ^{prefix}/(.*) /$1 break;"),
    };

    let scheme = if target.is_https() { "https" } else { "http" };

    let mut lines = vec![
        String::new(),
        format!("        # {annotation}"),
        format!("        location {endpoint} {{"),
        rewrite,
        String::new(),
        format!("            proxy_pass {scheme}://{upstream_name};"),
    ];
    if target.is_https() {
        lines.push("            proxy_ssl_server_name on;".to_owned());
        lines.push(format!("            proxy_ssl_name {};", target.host()));
    }
    lines.extend([
        String::new(),
        format!("            proxy_set_header Host {};", target.host()),
        "            proxy_set_header X-Real-IP $remote_addr;".to_owned(),
        "            proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;".to_owned(),
        "            proxy_set_header X-Forwarded-Proto $scheme;".to_owned(),
        String::new(),
        "            proxy_http_version 1.1;".to_owned(),
        "            proxy_set_header Upgrade $http_upgrade;".to_owned(),
        "            proxy_set_header Connection $connection_upgrade;".to_owned(),
        String::new(),
        format!("            proxy_connect_timeout {PROXY_TIMEOUT_SECS}s;"),
        format!("            proxy_send_timeout {PROXY_TIMEOUT_SECS}s;"),
        format!("            proxy_read_timeout {PROXY_TIMEOUT_SECS}s;"),
        String::new(),
        "            proxy_buffering off;".to_owned(),
        "            proxy_cache_bypass $http_upgrade;".to_owned(),
        "        }".to_owned(),
    ]);

    LocationBlock {
        path: endpoint.to_owned(),
        annotation: Some(annotation),
        upstream_ref: Some(upstream_name.to_owned()),
        lines,
    }
}

/// Builds the inert mirror of a live block for the disabled section:
/// every line commented, content otherwise identical.
pub fn disabled_mirror(live: &LocationBlock) -> DisabledBlock {
    let lines = live.lines.iter().map(|l| format!("    #{l}")).collect();
    DisabledBlock {
        path: live.path.clone(),
        lines,
    }
}
