//! `routepost list` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use routepost_core::types::ProxyRule;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

use super::{load_config, rule_editor};

/// Execute the `list` command.
pub async fn execute(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let editor = rule_editor(&config);

    let rules = editor.list_rules().await?;

    writer.render(&ListReport {
        total: rules.len(),
        rules,
    })
}

#[derive(Serialize)]
pub struct ListReport {
    pub total: usize,
    pub rules: Vec<ProxyRule>,
}

impl Render for ListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.rules.is_empty() {
            writeln!(w, "No proxy rules configured.")?;
            return Ok(());
        }

        writeln!(w, "{:<16} {:<44} {:<20}", "Endpoint", "Target URL", "Name")?;
        writeln!(w, "{}", "-".repeat(80))?;
        for rule in &self.rules {
            writeln!(
                w,
                "{:<16} {:<44} {:<20}",
                rule.endpoint,
                rule.target,
                rule.name.as_deref().unwrap_or("-"),
            )?;
        }
        writeln!(w, "{} rule(s)", self.total)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_report_text_renders_table() {
        let report = ListReport {
            total: 2,
            rules: vec![
                ProxyRule {
                    endpoint: "/claude/".to_owned(),
                    target: "https://api.anthropic.com".to_owned(),
                    name: Some("Claude".to_owned()),
                },
                ProxyRule {
                    endpoint: "/local/".to_owned(),
                    target: "http://localhost:8080".to_owned(),
                    name: None,
                },
            ],
        };
        let mut buf = Vec::new();
        report.render_text(&mut buf).expect("render");
        let out = String::from_utf8(buf).expect("utf8");
        assert!(out.contains("Endpoint"));
        assert!(out.contains("/claude/"));
        assert!(out.contains("Claude"));
        assert!(out.contains("2 rule(s)"));
    }

    #[test]
    fn list_report_text_handles_empty_list() {
        let report = ListReport {
            total: 0,
            rules: vec![],
        };
        let mut buf = Vec::new();
        report.render_text(&mut buf).expect("render");
        let out = String::from_utf8(buf).expect("utf8");
        assert!(out.contains("No proxy rules"));
    }
}
