//! `routepost add` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use routepost_nginx_editor::normalize_endpoint;

use crate::cli::AddArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

use super::{load_config, reload_after_edit, rule_editor};

/// Execute the `add` command.
pub async fn execute(
    args: AddArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let editor = rule_editor(&config);

    let endpoint = normalize_endpoint(&args.endpoint);
    if !args.force && editor.rule_exists(&endpoint).await? {
        return Err(CliError::Command(format!(
            "proxy rule for '{endpoint}' already exists (use --force to add anyway)"
        )));
    }

    info!(endpoint = %endpoint, target = %args.target, "adding proxy rule");
    let rule = editor
        .add_rule(&args.endpoint, &args.target, args.name.as_deref())
        .await?;

    let reload = reload_after_edit(&config).await;

    writer.render(&AddReport {
        endpoint: rule.endpoint,
        target: rule.target,
        name: rule.name,
        reload,
    })
}

#[derive(Serialize)]
pub struct AddReport {
    pub endpoint: String,
    pub target: String,
    pub name: Option<String>,
    pub reload: String,
}

impl Render for AddReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{} proxy rule added", "✓".green())?;
        writeln!(w, "  Endpoint: {}*", self.endpoint)?;
        writeln!(w, "  Target:   {}/*", self.target)?;
        if let Some(name) = &self.name {
            writeln!(w, "  Name:     {name}")?;
        }
        writeln!(w, "  Nginx:    {}", self.reload)?;
        Ok(())
    }
}
