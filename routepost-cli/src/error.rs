//! CLI-specific error types and exit code mapping

use routepost_core::error::RoutepostError;
use routepost_docker_control::DockerControlError;
use routepost_nginx_editor::EditorError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// nginx.conf editing failed.
    #[error("{0}")]
    Editor(#[from] EditorError),

    /// Docker / container control failed.
    #[error("{0}")]
    Docker(#[from] DockerControlError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdin read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                     |
    /// |------|-----------------------------|
    /// | 0    | Success                     |
    /// | 1    | General / command error     |
    /// | 2    | Configuration error         |
    /// | 3    | Docker daemon unreachable   |
    /// | 10   | IO error                    |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Docker(DockerControlError::Connection(_)) => 3,
            Self::Io(_) => 10,
            Self::Editor(EditorError::Io(_)) => 10,
            Self::Command(_)
            | Self::Editor(_)
            | Self::Docker(_)
            | Self::JsonSerialize(_) => 1,
        }
    }
}

impl From<RoutepostError> for CliError {
    fn from(e: RoutepostError) -> Self {
        Self::Config(e.to_string())
    }
}
