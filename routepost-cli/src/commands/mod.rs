//! Subcommand handlers.
//!
//! Each handler loads the effective configuration, wires up the editor
//! and/or container controller, performs the operation and renders a
//! report through [`crate::output::OutputWriter`].

use std::path::Path;
use std::sync::Arc;

use routepost_core::config::RoutepostConfig;
use routepost_core::error::{ConfigError, RoutepostError};
use routepost_docker_control::{BollardDockerClient, NginxController, ReloadOutcome};
use routepost_nginx_editor::{ConfigStore, RuleEditor};
use tracing::{debug, warn};

use crate::error::CliError;

pub mod add;
pub mod list;
pub mod logs;
pub mod reload;
pub mod remove;
pub mod status;

/// Loads `routepost.toml`, falling back to defaults (plus env overrides)
/// when the file does not exist. A malformed or invalid file is still an
/// error — only absence is tolerated.
pub(crate) async fn load_config(path: &Path) -> Result<RoutepostConfig, CliError> {
    match RoutepostConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(RoutepostError::Config(ConfigError::FileNotFound { .. })) => {
            debug!(path = %path.display(), "config file absent, using defaults");
            let mut config = RoutepostConfig::default();
            config.apply_env_overrides();
            config.validate().map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

/// Builds the rule editor for the configured nginx.conf.
pub(crate) fn rule_editor(config: &RoutepostConfig) -> RuleEditor {
    RuleEditor::new(
        ConfigStore::new(&config.nginx.conf_path),
        config.routes.clone(),
    )
}

/// Connects to Docker and wraps the configured container.
pub(crate) fn nginx_controller(
    config: &RoutepostConfig,
) -> Result<NginxController<BollardDockerClient>, CliError> {
    let client = if config.nginx.docker_socket.is_empty() {
        BollardDockerClient::connect_local()
    } else {
        BollardDockerClient::connect_with_socket(&config.nginx.docker_socket)
    }?;
    Ok(NginxController::new(
        Arc::new(client),
        config.nginx.container_name.clone(),
    ))
}

/// Reloads nginx after a successful edit.
///
/// Never fails: the edit is already on disk. Reload problems surface as
/// a warning log plus an outcome string telling the user what to do.
pub(crate) async fn reload_after_edit(config: &RoutepostConfig) -> String {
    let controller = match nginx_controller(config) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "docker unavailable, nginx not reloaded");
            return "skipped (docker unavailable, reload manually)".to_owned();
        }
    };
    match controller.reload_or_restart().await {
        Ok(outcome) => describe_outcome(outcome).to_owned(),
        Err(e) => {
            warn!(error = %e, "nginx reload failed");
            "failed (restart the container manually)".to_owned()
        }
    }
}

pub(crate) fn describe_outcome(outcome: ReloadOutcome) -> &'static str {
    match outcome {
        ReloadOutcome::Reloaded => "reloaded",
        ReloadOutcome::Started => "container started",
        ReloadOutcome::Restarted => "restarted (graceful reload failed)",
    }
}
