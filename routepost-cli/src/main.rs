//! Routepost CLI entry point: parse arguments, initialise tracing,
//! dispatch to the subcommand handler, map errors to exit codes.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};
use output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref());

    let writer = OutputWriter::new(cli.output);
    let config_path = cli.config.clone();

    let result = match cli.command {
        Commands::Add(args) => commands::add::execute(args, &config_path, &writer).await,
        Commands::Remove(args) => commands::remove::execute(args, &config_path, &writer).await,
        Commands::List => commands::list::execute(&config_path, &writer).await,
        Commands::Status => commands::status::execute(&config_path, &writer).await,
        Commands::Reload => commands::reload::execute(&config_path, &writer).await,
        Commands::Logs(args) => commands::logs::execute(args, &config_path, &writer).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// 전역 tracing 구독자 초기화.
///
/// 우선순위: `--log-level` 인자 > `RUST_LOG` 환경변수 > "warn".
/// 로그는 stderr로 내보내 명령 출력과 섞이지 않게 합니다.
fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
