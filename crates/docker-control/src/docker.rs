//! Docker API abstraction for testability.
//!
//! The [`DockerClient`] trait abstracts the bollard Docker API, allowing
//! production code to use [`BollardDockerClient`] while tests use
//! `MockDockerClient`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  NginxController │
//! └────────┬─────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │DockerClient │ (trait)
//!   └─────────────┘
//!        │     │
//!        ▼     ▼
//!   ┌───────┐ ┌────┐
//!   │Bollard│ │Mock│
//!   └───┬───┘ └────┘
//!       │
//!       ▼
//!   Docker Daemon
//! ```
//!
//! # Container Name Validation
//!
//! All methods that accept a container name validate it first: 1-255
//! characters, starting with an alphanumeric, containing only
//! `[A-Za-z0-9_.-]`. This matches Docker's own naming rules and rejects
//! anything that could smuggle filter syntax into API calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

use futures_util::StreamExt;

use routepost_core::types::ContainerInfo;

use crate::error::DockerControlError;

/// Result of running a command inside a container.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Process exit code (-1 when Docker did not report one).
    pub exit_code: i64,
    /// Combined stdout/stderr.
    pub output: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Validates a container name before it reaches the Docker API.
fn validate_container_name(name: &str) -> Result<(), DockerControlError> {
    if name.is_empty() || name.len() > 255 {
        return Err(DockerControlError::Api(format!(
            "invalid container name: length {} (must be 1-255)",
            name.len()
        )));
    }
    if !name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
    {
        return Err(DockerControlError::Api(
            "invalid container name: must start with an alphanumeric".to_owned(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
    {
        return Err(DockerControlError::Api(
            "invalid container name: contains forbidden characters".to_owned(),
        ));
    }
    Ok(())
}

/// Trait abstracting Docker API operations.
///
/// All Docker API calls go through this trait, enabling testability via
/// mocking. The trait is `Send + Sync + 'static`, allowing safe sharing
/// across async contexts.
///
/// # Implementations
///
/// - [`BollardDockerClient`]: production implementation using `bollard`
/// - `MockDockerClient`: test implementation with configurable responses
///   (available in tests only)
pub trait DockerClient: Send + Sync + 'static {
    /// Looks up a container by exact name.
    ///
    /// With `include_stopped` the lookup also covers exited/created
    /// containers; otherwise only running ones are considered. Returns
    /// `None` when no container has this name.
    ///
    /// # Errors
    ///
    /// Returns `DockerControlError::Api` if the Docker API call fails.
    fn find_container(
        &self,
        name: &str,
        include_stopped: bool,
    ) -> impl Future<Output = Result<Option<ContainerInfo>, DockerControlError>> + Send;

    /// Starts a stopped container.
    fn start_container(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<(), DockerControlError>> + Send;

    /// Stops a container with a 10-second grace period.
    fn stop_container(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<(), DockerControlError>> + Send;

    /// Restarts a container with a 10-second grace period.
    fn restart_container(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<(), DockerControlError>> + Send;

    /// Runs a command inside a running container and collects its output.
    ///
    /// # Errors
    ///
    /// - `DockerControlError::ExecFailed`: the exec could not be created
    ///   or attached
    /// - `DockerControlError::Api`: invalid name or other API errors
    fn exec(
        &self,
        name: &str,
        cmd: &[&str],
    ) -> impl Future<Output = Result<ExecOutput, DockerControlError>> + Send;

    /// Fetches the last `tail` lines of the container's log.
    fn container_logs(
        &self,
        name: &str,
        tail: u32,
    ) -> impl Future<Output = Result<String, DockerControlError>> + Send;

    /// Checks Docker daemon connectivity.
    fn ping(&self) -> impl Future<Output = Result<(), DockerControlError>> + Send;
}

/// Production Docker client implementation using `bollard`.
///
/// Communicates with the Docker daemon via a Unix socket or TCP
/// connection. Internally uses `Arc<bollard::Docker>` for safe sharing
/// across async tasks.
pub struct BollardDockerClient {
    docker: Arc<bollard::Docker>,
}

impl BollardDockerClient {
    /// Connects to Docker using the default local socket.
    ///
    /// # Errors
    ///
    /// Returns `DockerControlError::Connection` if the connection fails
    /// (socket not found, permission denied, daemon not running).
    pub fn connect_local() -> Result<Self, DockerControlError> {
        let docker = bollard::Docker::connect_with_local_defaults().map_err(|e| {
            DockerControlError::Connection(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// Connects to Docker using a specific socket path.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, DockerControlError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    DockerControlError::Connection(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }
}

impl DockerClient for BollardDockerClient {
    async fn find_container(
        &self,
        name: &str,
        include_stopped: bool,
    ) -> Result<Option<ContainerInfo>, DockerControlError> {
        validate_container_name(name)?;

        use bollard::container::ListContainersOptions;

        let mut filters = HashMap::new();
        filters.insert("name".to_owned(), vec![name.to_owned()]);
        let options = ListContainersOptions::<String> {
            all: include_stopped,
            filters,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| DockerControlError::Api(format!("list containers failed: {e}")))?;

        // name 필터는 부분 일치이므로 정확히 같은 이름만 채택
        for container in containers {
            let names = container.names.unwrap_or_default();
            let matched = names
                .iter()
                .any(|n| n.trim_start_matches('/') == name);
            if !matched {
                continue;
            }

            let id = container.id.unwrap_or_default();
            let image = container.image.unwrap_or_default();
            let status = container.state.unwrap_or_default();
            let created = container.created.unwrap_or_default();
            let created_at = SystemTime::UNIX_EPOCH
                + std::time::Duration::from_secs(u64::try_from(created).unwrap_or(0));

            return Ok(Some(ContainerInfo {
                id,
                name: name.to_owned(),
                image,
                status,
                created_at,
            }));
        }

        Ok(None)
    }

    async fn start_container(&self, name: &str) -> Result<(), DockerControlError> {
        validate_container_name(name)?;

        use bollard::container::StartContainerOptions;

        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| {
                if e.to_string().contains("404") {
                    DockerControlError::ContainerNotFound(name.to_owned())
                } else {
                    DockerControlError::Api(format!("start failed: {e}"))
                }
            })
    }

    async fn stop_container(&self, name: &str) -> Result<(), DockerControlError> {
        validate_container_name(name)?;

        use bollard::container::StopContainerOptions;

        self.docker
            .stop_container(name, Some(StopContainerOptions { t: 10 }))
            .await
            .map_err(|e| {
                if e.to_string().contains("404") {
                    DockerControlError::ContainerNotFound(name.to_owned())
                } else {
                    DockerControlError::Api(format!("stop failed: {e}"))
                }
            })
    }

    async fn restart_container(&self, name: &str) -> Result<(), DockerControlError> {
        validate_container_name(name)?;

        use bollard::container::RestartContainerOptions;

        self.docker
            .restart_container(name, Some(RestartContainerOptions { t: 10 }))
            .await
            .map_err(|e| {
                if e.to_string().contains("404") {
                    DockerControlError::ContainerNotFound(name.to_owned())
                } else {
                    DockerControlError::Api(format!("restart failed: {e}"))
                }
            })
    }

    async fn exec(&self, name: &str, cmd: &[&str]) -> Result<ExecOutput, DockerControlError> {
        validate_container_name(name)?;

        use bollard::exec::{CreateExecOptions, StartExecResults};

        let exec = self
            .docker
            .create_exec(
                name,
                CreateExecOptions::<String> {
                    cmd: Some(cmd.iter().map(|s| (*s).to_owned()).collect()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| DockerControlError::ExecFailed {
                container: name.to_owned(),
                reason: format!("create exec failed: {e}"),
            })?;

        let mut collected = String::new();
        let start = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| DockerControlError::ExecFailed {
                container: name.to_owned(),
                reason: format!("start exec failed: {e}"),
            })?;

        if let StartExecResults::Attached { mut output, .. } = start {
            while let Some(chunk) = output.next().await {
                match chunk {
                    Ok(log) => collected.push_str(&log.to_string()),
                    Err(e) => {
                        return Err(DockerControlError::ExecFailed {
                            container: name.to_owned(),
                            reason: format!("reading exec output failed: {e}"),
                        });
                    }
                }
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| DockerControlError::Api(format!("inspect exec failed: {e}")))?;

        Ok(ExecOutput {
            exit_code: inspect.exit_code.unwrap_or(-1),
            output: collected,
        })
    }

    async fn container_logs(
        &self,
        name: &str,
        tail: u32,
    ) -> Result<String, DockerControlError> {
        validate_container_name(name)?;

        use bollard::container::LogsOptions;

        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.logs(name, Some(options));
        let mut collected = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(log) => collected.push_str(&log.to_string()),
                Err(e) => {
                    return Err(DockerControlError::Api(format!(
                        "reading container logs failed: {e}"
                    )));
                }
            }
        }
        Ok(collected)
    }

    async fn ping(&self) -> Result<(), DockerControlError> {
        self.docker
            .ping()
            .await
            .map_err(|e| DockerControlError::Connection(format!("ping failed: {e}")))?;
        Ok(())
    }
}

/// 테스트용 Mock Docker 클라이언트
///
/// 설정 가능한 응답을 반환하여 Docker 없이도 테스트할 수 있습니다.
/// 수행된 액션은 `actions`에 순서대로 기록됩니다.
#[cfg(test)]
pub struct MockDockerClient {
    /// find_container 조회 대상 컨테이너 목록
    pub containers: Vec<ContainerInfo>,
    /// 액션 호출 시 실패를 시뮬레이션할지 여부
    pub fail_actions: bool,
    /// exec 호출이 반환할 종료 코드
    pub exec_exit_code: i64,
    /// exec 호출이 반환할 출력
    pub exec_output: String,
    /// 기록된 액션 ("start", "exec nginx -t" 등)
    pub actions: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl Default for MockDockerClient {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            fail_actions: false,
            exec_exit_code: 0,
            exec_output: String::new(),
            actions: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl MockDockerClient {
    /// 빈 컨테이너 목록으로 mock 클라이언트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 테스트용 컨테이너를 추가합니다.
    pub fn with_containers(mut self, containers: Vec<ContainerInfo>) -> Self {
        self.containers = containers;
        self
    }

    /// 액션 호출 시 실패하도록 설정합니다.
    pub fn with_failing_actions(mut self) -> Self {
        self.fail_actions = true;
        self
    }

    /// exec 결과를 설정합니다.
    pub fn with_exec_result(mut self, exit_code: i64, output: &str) -> Self {
        self.exec_exit_code = exit_code;
        self.exec_output = output.to_owned();
        self
    }

    fn record(&self, action: String) {
        self.actions.lock().expect("actions lock").push(action);
    }

    pub fn recorded_actions(&self) -> Vec<String> {
        self.actions.lock().expect("actions lock").clone()
    }

    fn fail(&self, name: &str, what: &str) -> DockerControlError {
        DockerControlError::ExecFailed {
            container: name.to_owned(),
            reason: format!("mock {what} failure"),
        }
    }
}

#[cfg(test)]
impl DockerClient for MockDockerClient {
    async fn find_container(
        &self,
        name: &str,
        include_stopped: bool,
    ) -> Result<Option<ContainerInfo>, DockerControlError> {
        validate_container_name(name)?;
        Ok(self
            .containers
            .iter()
            .find(|c| c.name == name && (include_stopped || c.is_running()))
            .cloned())
    }

    async fn start_container(&self, name: &str) -> Result<(), DockerControlError> {
        self.record("start".to_owned());
        if self.fail_actions {
            return Err(self.fail(name, "start"));
        }
        Ok(())
    }

    async fn stop_container(&self, name: &str) -> Result<(), DockerControlError> {
        self.record("stop".to_owned());
        if self.fail_actions {
            return Err(self.fail(name, "stop"));
        }
        Ok(())
    }

    async fn restart_container(&self, name: &str) -> Result<(), DockerControlError> {
        self.record("restart".to_owned());
        if self.fail_actions {
            return Err(self.fail(name, "restart"));
        }
        Ok(())
    }

    async fn exec(&self, name: &str, cmd: &[&str]) -> Result<ExecOutput, DockerControlError> {
        self.record(format!("exec {}", cmd.join(" ")));
        if self.fail_actions {
            return Err(self.fail(name, "exec"));
        }
        Ok(ExecOutput {
            exit_code: self.exec_exit_code,
            output: self.exec_output.clone(),
        })
    }

    async fn container_logs(
        &self,
        name: &str,
        tail: u32,
    ) -> Result<String, DockerControlError> {
        self.record(format!("logs tail={tail}"));
        if self.fail_actions {
            return Err(DockerControlError::Api(format!(
                "mock logs failure for {name}"
            )));
        }
        Ok(self.exec_output.clone())
    }

    async fn ping(&self) -> Result<(), DockerControlError> {
        Ok(())
    }
}
