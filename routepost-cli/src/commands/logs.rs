//! `routepost logs` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::cli::LogsArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

use super::{load_config, nginx_controller};

/// Execute the `logs` command.
pub async fn execute(
    args: LogsArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let controller = nginx_controller(&config)?;

    let content = controller.logs(args.tail).await?;

    writer.render(&LogsReport {
        container: config.nginx.container_name.clone(),
        tail: args.tail,
        content,
    })
}

#[derive(Serialize)]
pub struct LogsReport {
    pub container: String,
    pub tail: u32,
    pub content: String,
}

impl Render for LogsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        // 로그 원문을 그대로 출력
        write!(w, "{}", self.content)?;
        if !self.content.ends_with('\n') {
            writeln!(w)?;
        }
        Ok(())
    }
}
