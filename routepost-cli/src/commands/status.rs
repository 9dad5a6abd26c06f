//! `routepost status` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use routepost_docker_control::DockerControlError;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

use super::{load_config, nginx_controller, rule_editor};

/// Execute the `status` command.
///
/// Reports the container state, the number of active proxy rules, and
/// the result of an in-container `nginx -t` syntax check.
pub async fn execute(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let config = load_config(config_path).await?;

    let controller = nginx_controller(&config)?;
    let container = match controller.status().await? {
        Some(info) => info.status,
        None => "not found".to_owned(),
    };

    let editor = rule_editor(&config);
    let active_rules = editor.list_rules().await?.len();

    let config_check = match controller.validate_config().await {
        Ok(()) => "valid".to_owned(),
        Err(DockerControlError::ContainerNotRunning(_)) => {
            "skipped (container not running)".to_owned()
        }
        Err(DockerControlError::ConfigTest { output }) => format!("invalid: {}", output.trim()),
        Err(e) => return Err(e.into()),
    };

    writer.render(&StatusReport {
        container: config.nginx.container_name.clone(),
        state: container,
        active_rules,
        config_check,
    })
}

#[derive(Serialize)]
pub struct StatusReport {
    pub container: String,
    pub state: String,
    pub active_rules: usize,
    pub config_check: String,
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Container:     {} ({})", self.container, self.state)?;
        writeln!(w, "Active rules:  {}", self.active_rules)?;
        let check = if self.config_check == "valid" {
            format!("{}", "valid".green())
        } else if self.config_check.starts_with("invalid") {
            format!("{}", self.config_check.red())
        } else {
            self.config_check.clone()
        };
        writeln!(w, "Config check:  {check}")?;
        Ok(())
    }
}
