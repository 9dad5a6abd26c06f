//! `routepost reload` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use routepost_docker_control::DockerControlError;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

use super::{describe_outcome, load_config, nginx_controller};

/// Execute the `reload` command.
///
/// Validates the configuration inside the container first, then performs
/// a graceful reload with a full-restart fallback. A failed syntax check
/// aborts the reload so a broken config never reaches the running server.
pub async fn execute(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let controller = nginx_controller(&config)?;

    match controller.validate_config().await {
        Ok(()) => {}
        // 정지 상태면 reload()가 기동으로 대체하므로 검증은 건너뜀
        Err(DockerControlError::ContainerNotRunning(_)) => {}
        Err(e) => return Err(e.into()),
    }

    info!(container = %config.nginx.container_name, "reloading nginx");
    let outcome = controller.reload_or_restart().await?;

    writer.render(&ReloadReport {
        container: config.nginx.container_name.clone(),
        outcome: describe_outcome(outcome).to_owned(),
    })
}

#[derive(Serialize)]
pub struct ReloadReport {
    pub container: String,
    pub outcome: String,
}

impl Render for ReloadReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{} {}: {}", "✓".green(), self.container, self.outcome)?;
        Ok(())
    }
}
