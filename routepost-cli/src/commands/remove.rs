//! `routepost remove` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use routepost_nginx_editor::normalize_endpoint;

use crate::cli::RemoveArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

use super::{load_config, reload_after_edit, rule_editor};

/// Execute the `remove` command.
///
/// Prompts for confirmation on a TTY unless `--force` was given.
pub async fn execute(
    args: RemoveArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let editor = rule_editor(&config);

    let endpoint = normalize_endpoint(&args.endpoint);
    if !editor.rule_exists(&endpoint).await? {
        return Err(CliError::Command(format!(
            "proxy rule for '{endpoint}' not found"
        )));
    }

    if !args.force && !confirm(&format!("Remove proxy rule for '{endpoint}'?"))? {
        writer.render(&RemoveReport {
            endpoint,
            removed: false,
            reload: "skipped".to_owned(),
        })?;
        return Ok(());
    }

    info!(endpoint = %endpoint, "removing proxy rule");
    editor.remove_rule(&endpoint).await?;

    let reload = reload_after_edit(&config).await;

    writer.render(&RemoveReport {
        endpoint,
        removed: true,
        reload,
    })
}

/// y/N 프롬프트. 기본값은 No.
fn confirm(question: &str) -> Result<bool, CliError> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{question} [y/N] ")?;
    stdout.flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[derive(Serialize)]
pub struct RemoveReport {
    pub endpoint: String,
    pub removed: bool,
    pub reload: String,
}

impl Render for RemoveReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.removed {
            writeln!(w, "{} proxy rule for '{}' removed", "✓".green(), self.endpoint)?;
            writeln!(w, "  Nginx: {}", self.reload)?;
        } else {
            writeln!(w, "{} operation cancelled", "-".yellow())?;
        }
        Ok(())
    }
}
