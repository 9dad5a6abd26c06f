//! nginx 컨테이너 제어 로직
//!
//! [`NginxController`]는 [`DockerClient`] 위에서 상태 조회, 기동/정지,
//! graceful reload(실패 시 재시작 폴백), 설정 문법 검증을 제공합니다.
//! 설정 파일 편집과는 완전히 분리되어 있으며, 호출자(CLI)가
//! "편집 후 리로드" 순서를 결정합니다.

use std::sync::Arc;

use tracing::{info, warn};

use routepost_core::types::ContainerInfo;

use crate::docker::DockerClient;
use crate::error::DockerControlError;

/// reload 경로가 실제로 수행한 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// 실행 중인 컨테이너에 graceful reload 수행
    Reloaded,
    /// 정지 상태였으므로 컨테이너 기동
    Started,
    /// reload 실패로 전체 재시작 수행
    Restarted,
}

/// nginx 컨테이너에 대한 고수준 제어를 제공합니다.
pub struct NginxController<D: DockerClient> {
    docker: Arc<D>,
    container_name: String,
}

impl<D: DockerClient> NginxController<D> {
    pub fn new(docker: Arc<D>, container_name: impl Into<String>) -> Self {
        Self {
            docker,
            container_name: container_name.into(),
        }
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// 컨테이너 상태를 조회합니다 (정지된 컨테이너 포함).
    ///
    /// 컨테이너가 아예 존재하지 않으면 `Ok(None)`.
    pub async fn status(&self) -> Result<Option<ContainerInfo>, DockerControlError> {
        self.docker.find_container(&self.container_name, true).await
    }

    /// 컨테이너가 현재 실행 중인지 확인합니다.
    pub async fn is_running(&self) -> Result<bool, DockerControlError> {
        Ok(self
            .docker
            .find_container(&self.container_name, false)
            .await?
            .is_some())
    }

    /// 컨테이너가 존재하는지 확인합니다 (정지 상태 포함).
    pub async fn exists(&self) -> Result<bool, DockerControlError> {
        Ok(self.status().await?.is_some())
    }

    pub async fn start(&self) -> Result<(), DockerControlError> {
        info!(container = %self.container_name, "starting nginx container");
        self.docker.start_container(&self.container_name).await
    }

    pub async fn stop(&self) -> Result<(), DockerControlError> {
        info!(container = %self.container_name, "stopping nginx container");
        self.docker.stop_container(&self.container_name).await
    }

    pub async fn restart(&self) -> Result<(), DockerControlError> {
        info!(container = %self.container_name, "restarting nginx container");
        self.docker.restart_container(&self.container_name).await
    }

    /// 설정을 graceful하게 다시 읽게 합니다.
    ///
    /// 컨테이너가 정지 상태면 기동으로 대신하고, 실행 중이면
    /// `nginx -s reload`를 수행합니다.
    pub async fn reload(&self) -> Result<ReloadOutcome, DockerControlError> {
        if !self.is_running().await? {
            info!(container = %self.container_name, "container not running, starting instead");
            self.start().await?;
            return Ok(ReloadOutcome::Started);
        }

        let out = self
            .docker
            .exec(&self.container_name, &["nginx", "-s", "reload"])
            .await?;
        if !out.success() {
            return Err(DockerControlError::ExecFailed {
                container: self.container_name.clone(),
                reason: format!("nginx -s reload exited {}: {}", out.exit_code, out.output),
            });
        }

        info!(container = %self.container_name, "nginx configuration reloaded");
        Ok(ReloadOutcome::Reloaded)
    }

    /// graceful reload를 시도하고, 실패하면 전체 재시작으로 폴백합니다.
    pub async fn reload_or_restart(&self) -> Result<ReloadOutcome, DockerControlError> {
        match self.reload().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(
                    container = %self.container_name,
                    error = %e,
                    "reload failed, falling back to restart"
                );
                self.restart().await?;
                Ok(ReloadOutcome::Restarted)
            }
        }
    }

    /// 실행 중인 컨테이너 안에서 `nginx -t`로 설정 문법을 검증합니다.
    ///
    /// # Errors
    ///
    /// - `ContainerNotRunning`: 컨테이너가 실행 중이 아니면 검증 불가
    /// - `ConfigTest`: 문법 오류 (nginx 출력 포함)
    pub async fn validate_config(&self) -> Result<(), DockerControlError> {
        if !self.is_running().await? {
            return Err(DockerControlError::ContainerNotRunning(
                self.container_name.clone(),
            ));
        }

        let out = self
            .docker
            .exec(&self.container_name, &["nginx", "-t"])
            .await?;
        if !out.success() {
            return Err(DockerControlError::ConfigTest { output: out.output });
        }
        Ok(())
    }

    /// 컨테이너 로그 마지막 `tail` 줄을 가져옵니다.
    pub async fn logs(&self, tail: u32) -> Result<String, DockerControlError> {
        if !self.is_running().await? {
            return Err(DockerControlError::ContainerNotRunning(
                self.container_name.clone(),
            ));
        }
        self.docker.container_logs(&self.container_name, tail).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::docker::MockDockerClient;

    fn running() -> ContainerInfo {
        ContainerInfo {
            id: "abc123def456".to_owned(),
            name: "routepost_nginx".to_owned(),
            image: "nginx:alpine".to_owned(),
            status: "running".to_owned(),
            created_at: SystemTime::now(),
        }
    }

    fn stopped() -> ContainerInfo {
        ContainerInfo {
            status: "exited".to_owned(),
            ..running()
        }
    }

    fn controller(mock: MockDockerClient) -> NginxController<MockDockerClient> {
        NginxController::new(Arc::new(mock), "routepost_nginx")
    }

    #[tokio::test]
    async fn status_reports_stopped_container() {
        let ctl = controller(MockDockerClient::new().with_containers(vec![stopped()]));
        let status = ctl.status().await.unwrap().expect("container exists");
        assert_eq!(status.status, "exited");
        assert!(!ctl.is_running().await.unwrap());
    }

    #[tokio::test]
    async fn status_none_when_container_absent() {
        let ctl = controller(MockDockerClient::new());
        assert!(ctl.status().await.unwrap().is_none());
        assert!(!ctl.exists().await.unwrap());
    }

    #[tokio::test]
    async fn exists_includes_stopped_container() {
        let ctl = controller(MockDockerClient::new().with_containers(vec![stopped()]));
        assert!(ctl.exists().await.unwrap());
        assert!(!ctl.is_running().await.unwrap());
    }

    #[tokio::test]
    async fn reload_execs_when_running() {
        let mock = MockDockerClient::new().with_containers(vec![running()]);
        let ctl = controller(mock);

        let outcome = ctl.reload().await.unwrap();
        assert_eq!(outcome, ReloadOutcome::Reloaded);
        assert_eq!(
            ctl.docker.recorded_actions(),
            vec!["exec nginx -s reload"]
        );
    }

    #[tokio::test]
    async fn reload_starts_when_stopped() {
        let mock = MockDockerClient::new().with_containers(vec![stopped()]);
        let ctl = controller(mock);

        let outcome = ctl.reload().await.unwrap();
        assert_eq!(outcome, ReloadOutcome::Started);
        assert_eq!(ctl.docker.recorded_actions(), vec!["start"]);
    }

    #[tokio::test]
    async fn reload_fails_on_nonzero_exit() {
        let mock = MockDockerClient::new()
            .with_containers(vec![running()])
            .with_exec_result(1, "signal process started");
        let ctl = controller(mock);

        let err = ctl.reload().await.unwrap_err();
        assert!(matches!(err, DockerControlError::ExecFailed { .. }));
    }

    #[tokio::test]
    async fn reload_or_restart_falls_back_to_restart() {
        let mock = MockDockerClient::new()
            .with_containers(vec![running()])
            .with_exec_result(1, "reload refused");
        let ctl = controller(mock);

        let outcome = ctl.reload_or_restart().await.unwrap();
        assert_eq!(outcome, ReloadOutcome::Restarted);
        assert_eq!(
            ctl.docker.recorded_actions(),
            vec!["exec nginx -s reload", "restart"]
        );
    }

    #[tokio::test]
    async fn validate_config_requires_running_container() {
        let ctl = controller(MockDockerClient::new().with_containers(vec![stopped()]));
        let err = ctl.validate_config().await.unwrap_err();
        assert!(matches!(err, DockerControlError::ContainerNotRunning(_)));
    }

    #[tokio::test]
    async fn validate_config_passes_on_zero_exit() {
        let mock = MockDockerClient::new()
            .with_containers(vec![running()])
            .with_exec_result(0, "nginx: configuration file test is successful");
        let ctl = controller(mock);

        ctl.validate_config().await.unwrap();
        assert_eq!(ctl.docker.recorded_actions(), vec!["exec nginx -t"]);
    }

    #[tokio::test]
    async fn validate_config_surfaces_nginx_output_on_failure() {
        let mock = MockDockerClient::new()
            .with_containers(vec![running()])
            .with_exec_result(1, "unexpected end of file");
        let ctl = controller(mock);

        let err = ctl.validate_config().await.unwrap_err();
        match err {
            DockerControlError::ConfigTest { output } => {
                assert!(output.contains("unexpected end of file"));
            }
            other => panic!("expected ConfigTest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn logs_require_running_container() {
        let ctl = controller(MockDockerClient::new());
        let err = ctl.logs(50).await.unwrap_err();
        assert!(matches!(err, DockerControlError::ContainerNotRunning(_)));
    }

    #[tokio::test]
    async fn logs_pass_tail_through() {
        let mock = MockDockerClient::new()
            .with_containers(vec![running()])
            .with_exec_result(0, "log line\n");
        let ctl = controller(mock);

        let logs = ctl.logs(25).await.unwrap();
        assert_eq!(logs, "log line\n");
        assert_eq!(ctl.docker.recorded_actions(), vec!["logs tail=25"]);
    }
}
