//! Rule-level operations over the configuration document.
//!
//! Every operation is a complete read-modify-write cycle: read the current
//! document through [`ConfigStore`], compute a new block sequence, write it
//! back. No state is kept between calls; the document is the source of
//! truth. There is no locking — concurrent invocations race on the cycle
//! and the last write wins.

use routepost_core::config::RoutesConfig;
use routepost_core::types::ProxyRule;
use tracing::{debug, info};

use crate::blocks::{
    GENERATED_NAME_PREFIX, TargetUrl, disabled_mirror, location_block, normalize_endpoint,
    upstream_block,
};
use crate::document::{Block, Document, UpstreamBlock};
use crate::error::EditorError;
use crate::store::ConfigStore;

/// Editor for proxy routing rules in the nginx document.
pub struct RuleEditor {
    store: ConfigStore,
    routes: RoutesConfig,
}

impl RuleEditor {
    pub fn new(store: ConfigStore, routes: RoutesConfig) -> Self {
        Self { store, routes }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Checks whether a live rule with exactly this endpoint exists.
    ///
    /// The endpoint is normalized first; matching is anchored on the block
    /// header path, so `/gpt/` never matches an existing `/gpt2/` block.
    pub async fn rule_exists(&self, endpoint: &str) -> Result<bool, EditorError> {
        let endpoint = normalize_endpoint(endpoint);
        let text = self.store.read().await?;
        let doc = Document::parse(&text);
        Ok(doc.find_location(&endpoint).is_some())
    }

    /// Adds a routing rule for `endpoint` forwarding to `target`.
    ///
    /// Synthesizes the upstream pool if no pool with the derived name
    /// exists yet, inserts the live location block after the anchor rule,
    /// and mirrors it into the disabled section when one is present.
    ///
    /// This operation does not guard against duplicate endpoints; callers
    /// are expected to check [`rule_exists`](Self::rule_exists) first.
    /// Calling it twice for the same endpoint produces two live blocks.
    ///
    /// # Errors
    ///
    /// - `InvalidTarget`: `target` is not a usable http(s) URL
    /// - `ConfigNotFound`: the document does not exist
    /// - `Structure`: the document lacks the expected anchors; nothing is
    ///   written and the on-disk state (including the backup) is untouched
    /// - `Write`: backup or write I/O failure
    pub async fn add_rule(
        &self,
        endpoint: &str,
        target: &str,
        display_name: Option<&str>,
    ) -> Result<ProxyRule, EditorError> {
        let endpoint = normalize_endpoint(endpoint);
        let target = TargetUrl::parse(target)?;

        let text = self.store.read().await?;
        let mut doc = Document::parse(&text);

        let upstream_name = target.upstream_name();
        if doc.find_upstream(&upstream_name).is_none() {
            let block = upstream_block(&target, &upstream_name);
            match doc.last_upstream_index() {
                Some(idx) => doc.insert_after(idx, block),
                None => {
                    if !doc.insert_before_marker(&self.routes.server_marker, block) {
                        return Err(EditorError::Structure {
                            reason: format!(
                                "no existing upstream block and no '{}' marker to insert before",
                                self.routes.server_marker
                            ),
                        });
                    }
                }
            }
        } else {
            debug!(upstream = %upstream_name, "reusing existing upstream pool");
        }

        let anchor_idx = doc.find_location(&self.routes.anchor_path).ok_or_else(|| {
            EditorError::Structure {
                reason: format!(
                    "anchor location '{}' not found in document",
                    self.routes.anchor_path
                ),
            }
        })?;

        let live = location_block(&endpoint, &target, &upstream_name, display_name);
        let mirror = disabled_mirror(&live);
        doc.insert_after(anchor_idx, Block::Location(live));

        // 비활성 섹션이 있으면 미러 삽입, 없으면 할 일 없음
        match doc.find_disabled(&self.routes.anchor_path) {
            Some(disabled_idx) => {
                doc.insert_after(disabled_idx, Block::DisabledLocation(mirror));
            }
            None => {
                debug!("no disabled section mirror of the anchor; skipping mirror insert");
            }
        }

        self.store.write(&doc.render()).await?;

        info!(
            endpoint = %endpoint,
            target = %target.as_str(),
            upstream = %upstream_name,
            "proxy rule added"
        );

        Ok(ProxyRule {
            endpoint,
            target: target.as_str().to_owned(),
            name: display_name.map(str::to_owned),
        })
    }

    /// Removes the rule for `endpoint`: the live block, its annotation and
    /// the mirrored disabled copy. Removing an endpoint that has no block
    /// is a successful no-op (the document is still rewritten, refreshing
    /// the backup). Upstream pools are never removed, even when orphaned.
    ///
    /// Returns the number of blocks removed.
    pub async fn remove_rule(&self, endpoint: &str) -> Result<usize, EditorError> {
        let endpoint = normalize_endpoint(endpoint);

        let text = self.store.read().await?;
        let mut doc = Document::parse(&text);

        let removed = doc.remove_path(&endpoint);
        self.store.write(&doc.render()).await?;

        info!(endpoint = %endpoint, removed, "proxy rule removed");
        Ok(removed)
    }

    /// Lists user-managed rules in document order.
    ///
    /// Reserved routes (the anchor proxy and the health check) are
    /// excluded. The target URL is recovered from the upstream pool's
    /// origin annotation; when the annotation is missing the URL is
    /// reconstructed from the backend address (443 ⇒ https, else http),
    /// which loses any path component of the original target.
    pub async fn list_rules(&self) -> Result<Vec<ProxyRule>, EditorError> {
        let text = self.store.read().await?;
        let doc = Document::parse(&text);

        let mut rules = Vec::new();
        for loc in doc.locations() {
            if self.routes.reserved_paths.iter().any(|r| r == &loc.path) {
                continue;
            }
            let Some(upstream_name) = loc.upstream_ref.as_deref() else {
                // proxy_pass 없는 블록은 이 시스템이 만든 규칙이 아님
                continue;
            };
            let target = match doc.find_upstream(upstream_name) {
                Some(up) => recover_target(up),
                None => format!("upstream://{upstream_name}"),
            };
            let name = loc
                .annotation
                .clone()
                .filter(|a| !a.starts_with(GENERATED_NAME_PREFIX));
            rules.push(ProxyRule {
                endpoint: loc.path.clone(),
                target,
                name,
            });
        }
        Ok(rules)
    }
}

/// Recovers the original target URL for an upstream pool.
///
/// Prefers the verbatim origin annotation; falls back to reconstructing
/// from the backend address (lossy: path and explicit default ports are
/// not recoverable), and finally to an `upstream://` sentinel.
fn recover_target(up: &UpstreamBlock) -> String {
    if let Some(url) = &up.origin_url {
        return url.clone();
    }
    match &up.server_addr {
        Some(addr) => match addr.strip_suffix(":443") {
            Some(host) => format!("https://{host}"),
            None => format!("http://{addr}"),
        },
        None => format!("upstream://{}", up.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recover_target_prefers_annotation() {
        let up = UpstreamBlock {
            name: "api_openai_com_upstream".to_owned(),
            server_addr: Some("api.openai.com:443".to_owned()),
            origin_url: Some("https://api.openai.com/v1".to_owned()),
            lines: vec![],
        };
        assert_eq!(recover_target(&up), "https://api.openai.com/v1");
    }

    #[test]
    fn recover_target_reconstructs_https_from_port_443() {
        let up = UpstreamBlock {
            name: "api_openai_com_upstream".to_owned(),
            server_addr: Some("api.openai.com:443".to_owned()),
            origin_url: None,
            lines: vec![],
        };
        assert_eq!(recover_target(&up), "https://api.openai.com");
    }

    #[test]
    fn recover_target_reconstructs_http_with_port() {
        let up = UpstreamBlock {
            name: "localhost_upstream".to_owned(),
            server_addr: Some("localhost:8080".to_owned()),
            origin_url: None,
            lines: vec![],
        };
        assert_eq!(recover_target(&up), "http://localhost:8080");
    }

    #[test]
    fn recover_target_sentinel_without_server_addr() {
        let up = UpstreamBlock {
            name: "mystery_upstream".to_owned(),
            server_addr: None,
            origin_url: None,
            lines: vec![],
        };
        assert_eq!(recover_target(&up), "upstream://mystery_upstream");
    }
}
