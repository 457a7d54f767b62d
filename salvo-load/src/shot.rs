//! Shot executors: one request, then a fixed cooldown

use crate::error::LoadResult;
use crate::source::Target;
use async_trait::async_trait;
use salvo_config::{LoadConfig, TransportConfig};
use salvo_process::{CommandSpec, OutputSink, ProcessSupervisor};
use std::time::Duration;
use tracing::debug;

/// Outcome of one shot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotResult {
    Completed,
    Failed(String),
}

impl ShotResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, ShotResult::Completed)
    }
}

/// Issues a single request against a target.
///
/// `fire` never fails: a dropped request is reported as
/// [`ShotResult::Failed`] and the caller carries on with the next shot.
#[async_trait]
pub trait ShotExecutor: Send {
    async fn fire(&mut self, target: &Target) -> ShotResult;
}

#[async_trait]
impl<T: ShotExecutor + ?Sized> ShotExecutor for Box<T> {
    async fn fire(&mut self, target: &Target) -> ShotResult {
        (**self).fire(target).await
    }
}

/// Fires each shot by running a command-line client (`curl` by default)
/// with the target appended as the last argument.
pub struct CommandShooter {
    supervisor: ProcessSupervisor,
    client: CommandSpec,
    cooldown: Duration,
}

impl CommandShooter {
    pub fn new(supervisor: ProcessSupervisor, client: CommandSpec, cooldown: Duration) -> Self {
        Self {
            supervisor,
            client,
            cooldown,
        }
    }
}

#[async_trait]
impl ShotExecutor for CommandShooter {
    async fn fire(&mut self, target: &Target) -> ShotResult {
        let spec = self.client.clone().arg(target.as_str());

        let mut handle = match self.supervisor.spawn("shot", &spec, OutputSink::Null) {
            Ok(handle) => handle,
            Err(e) => {
                // Keep pacing even when the client cannot start
                tokio::time::sleep(self.cooldown).await;
                return ShotResult::Failed(e.to_string());
            }
        };

        tokio::time::sleep(self.cooldown).await;

        match self.supervisor.wait(&mut handle).await {
            Ok(status) if status.success() => ShotResult::Completed,
            Ok(status) => ShotResult::Failed(format!("{} finished with {}", self.client.program(), status)),
            Err(e) => ShotResult::Failed(e.to_string()),
        }
    }
}

/// Fires each shot in-process with a GET request. The response body is
/// read and dropped; any HTTP status counts as completed.
pub struct HttpShooter {
    client: reqwest::Client,
    cooldown: Duration,
}

impl HttpShooter {
    pub fn new(timeout: Duration, cooldown: Duration) -> LoadResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, cooldown })
    }
}

#[async_trait]
impl ShotExecutor for HttpShooter {
    async fn fire(&mut self, target: &Target) -> ShotResult {
        let request = self.client.get(target.url()).send();
        let in_flight = tokio::spawn(async move {
            let response = request.await?;
            let status = response.status();
            response.bytes().await?;
            Ok::<_, reqwest::Error>(status)
        });

        tokio::time::sleep(self.cooldown).await;

        match in_flight.await {
            Ok(Ok(status)) => {
                debug!(%status, "Shot answered");
                ShotResult::Completed
            }
            Ok(Err(e)) => ShotResult::Failed(e.to_string()),
            Err(e) => ShotResult::Failed(format!("request task failed: {}", e)),
        }
    }
}

/// Build the executor selected by the load configuration
pub fn executor_from_config(
    config: &LoadConfig,
    supervisor: &ProcessSupervisor,
) -> LoadResult<Box<dyn ShotExecutor>> {
    match &config.transport {
        TransportConfig::Command { program, args } => Ok(Box::new(CommandShooter::new(
            supervisor.clone(),
            CommandSpec::new(program.clone()).args(args.iter().cloned()),
            config.cooldown,
        ))),
        TransportConfig::Http { timeout } => Ok(Box::new(HttpShooter::new(*timeout, config.cooldown)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn target() -> Target {
        Target::new("localhost:8080/api/v1/maps")
    }

    #[tokio::test]
    async fn test_command_shot_completes_after_cooldown() {
        let mut shooter = CommandShooter::new(
            ProcessSupervisor::new(),
            CommandSpec::new("true"),
            Duration::from_millis(50),
        );

        let started = Instant::now();
        assert_eq!(shooter.fire(&target()).await, ShotResult::Completed);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_command_shot_waits_for_client() {
        // The client outlives the cooldown; fire must still wait for it
        let mut shooter = CommandShooter::new(
            ProcessSupervisor::new(),
            CommandSpec::shell("sleep 0.3; true").arg("ignored"),
            Duration::from_millis(10),
        );

        let started = Instant::now();
        assert!(shooter.fire(&target()).await.is_completed());
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_command_shot_failures_are_swallowed() {
        let mut failing = CommandShooter::new(
            ProcessSupervisor::new(),
            CommandSpec::new("false"),
            Duration::from_millis(1),
        );
        assert!(matches!(failing.fire(&target()).await, ShotResult::Failed(_)));

        let mut missing = CommandShooter::new(
            ProcessSupervisor::new(),
            CommandSpec::new("/nonexistent/http-client"),
            Duration::from_millis(20),
        );
        let started = Instant::now();
        assert!(matches!(missing.fire(&target()).await, ShotResult::Failed(_)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_http_shot_against_live_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n[]")
                .await
                .unwrap();
        });

        let mut shooter = HttpShooter::new(Duration::from_secs(5), Duration::from_millis(10)).unwrap();
        let result = shooter.fire(&Target::new(format!("{}/api/v1/maps", address))).await;
        assert_eq!(result, ShotResult::Completed);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_shot_connection_refused_is_swallowed() {
        // Bind then drop to obtain a port with nothing listening
        let address = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let mut shooter = HttpShooter::new(Duration::from_secs(2), Duration::from_millis(1)).unwrap();
        let result = shooter.fire(&Target::new(format!("{}/api/v1/maps", address))).await;
        assert!(matches!(result, ShotResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_executor_from_config_selects_transport() {
        let supervisor = ProcessSupervisor::new();
        let config = LoadConfig {
            transport: TransportConfig::Command {
                program: "true".to_string(),
                args: vec!["-s".to_string()],
            },
            cooldown: Duration::from_millis(1),
            ..Default::default()
        };

        let mut executor = executor_from_config(&config, &supervisor).unwrap();
        assert!(executor.fire(&target()).await.is_completed());

        let config = LoadConfig {
            transport: TransportConfig::Http {
                timeout: Duration::from_secs(1),
            },
            ..Default::default()
        };
        assert!(executor_from_config(&config, &supervisor).is_ok());
    }
}
