//! Drives one profiling run from server start to rendered artifact

use crate::error::{OrchestratorError, OrchestratorResult, StageError};
use crate::stage::{RunState, Stage, Transition};
use chrono::{DateTime, Utc};
use salvo_config::SalvoConfig;
use salvo_load::{executor_from_config, LoadDriver, LoadSummary, RequestStream};
use salvo_process::{CommandSpec, OutputSink, ProcessSupervisor};
use salvo_profiling::{Artifact, ArtifactPipeline, CaptureFile, ProfilingSession};
use std::time::{Duration, Instant};
use tracing::{error, info};
use uuid::Uuid;

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub transitions: Vec<Transition>,
    pub load: LoadSummary,
    pub capture: CaptureFile,
    pub artifact: Artifact,
    pub elapsed: Duration,
}

/// Linear state machine over the run stages.
///
/// There are no retries: the first fatal error moves the run to
/// `Failed(stage)`, live processes are terminated and the error is returned.
/// Individual shot failures are never fatal.
pub struct Orchestrator {
    config: SalvoConfig,
    server: CommandSpec,
    supervisor: ProcessSupervisor,
    run_id: Uuid,
    state: RunState,
    transitions: Vec<Transition>,
}

impl Orchestrator {
    pub fn new(config: SalvoConfig, server: CommandSpec) -> Self {
        let supervisor = ProcessSupervisor::new().with_forward_stderr(config.server.forward_stderr);
        Self {
            config,
            server,
            supervisor,
            run_id: Uuid::new_v4(),
            state: RunState::At(Stage::Idle),
            transitions: Vec::new(),
        }
    }

    /// Build from configuration; the server command line comes from
    /// `server.command`.
    pub fn from_config(config: SalvoConfig) -> OrchestratorResult<Self> {
        let line = config.server.command.clone().ok_or_else(|| {
            OrchestratorError::new(Stage::Idle, StageError::Setup("no server command configured".to_string()))
        })?;
        let server = CommandSpec::from_line(&line, config.server.use_shell)
            .map_err(|e| OrchestratorError::new(Stage::Idle, e))?;
        Ok(Self::new(config, server))
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn server_command(&self) -> &CommandSpec {
        &self.server
    }

    /// Execute the run. Intended to be called once per orchestrator.
    pub async fn run(&mut self) -> OrchestratorResult<RunReport> {
        let started = Instant::now();
        let started_at = Utc::now();
        info!(run_id = %self.run_id, server = %self.server, "Starting profiling run");

        // Stream and executor are checked before anything is started
        let mut stream = RequestStream::from_config(&self.config.load).map_err(|e| self.fail(Stage::Idle, e))?;
        let executor =
            executor_from_config(&self.config.load, &self.supervisor).map_err(|e| self.fail(Stage::Idle, e))?;

        self.enter(Stage::ServerStarting);
        let server = self
            .supervisor
            .spawn("server", &self.server, OutputSink::Inherit)
            .map_err(|e| self.fail(Stage::ServerStarting, e))?;
        info!(pid = server.pid(), "Server started");

        self.enter(Stage::ProfilerAttaching);
        let mut session = ProfilingSession::begin(&self.supervisor, server, &self.config.profiler)
            .await
            .map_err(|e| self.fail(Stage::ProfilerAttaching, e))?;

        self.enter(Stage::LoadRunning);
        let mut driver = LoadDriver::new(executor);
        let load = driver.run(&mut stream, self.config.load.shot_count).await;
        if let Err(e) = session.ensure_alive() {
            session.abort();
            return Err(self.fail(Stage::LoadRunning, e));
        }

        self.enter(Stage::ServerStopping);
        if let Err(e) = session.stop_server().await {
            session.abort();
            return Err(self.fail(Stage::ServerStopping, e));
        }

        self.enter(Stage::ProfilerDraining);
        let capture = session
            .drain()
            .await
            .map_err(|e| self.fail(Stage::ProfilerDraining, e))?;

        self.enter(Stage::Rendering);
        let artifact = ArtifactPipeline::from_config(&self.config.render)
            .render(&self.supervisor, &capture)
            .await
            .map_err(|e| self.fail(Stage::Rendering, e))?;

        // Coarse wait for anything still flushing before declaring the run done
        tokio::time::sleep(self.config.orchestrator.settle_delay).await;
        self.enter(Stage::Done);

        let elapsed = started.elapsed();
        info!(
            run_id = %self.run_id,
            elapsed_ms = elapsed.as_millis() as u64,
            %load,
            artifact = %artifact.path.display(),
            "Profiling run finished"
        );

        Ok(RunReport {
            run_id: self.run_id,
            started_at,
            transitions: self.transitions.clone(),
            load,
            capture,
            artifact,
            elapsed,
        })
    }

    fn enter(&mut self, stage: Stage) {
        self.transition(RunState::At(stage));
        info!(run_id = %self.run_id, "Entering {}", stage);
    }

    fn fail(&mut self, stage: Stage, source: impl Into<StageError>) -> OrchestratorError {
        let err = OrchestratorError::new(stage, source);
        self.transition(RunState::Failed(stage));
        error!(run_id = %self.run_id, "{}", err);
        err
    }

    fn transition(&mut self, to: RunState) {
        self.transitions.push(Transition {
            from: self.state,
            to,
            at: Utc::now(),
        });
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvo_config::{StageConfig, TransportConfig};
    use salvo_profiling::ProfilingError;
    use std::path::Path;

    fn quick_config(dir: &Path) -> SalvoConfig {
        let mut config = SalvoConfig::default();
        config.server.command = Some("sleep 30".to_string());
        config.load.shot_count = 5;
        config.load.cooldown = Duration::from_millis(10);
        config.load.transport = TransportConfig::Command {
            program: "true".to_string(),
            args: Vec::new(),
        };
        config.profiler.program = "sh".to_string();
        config.profiler.args = vec![
            "-c".to_string(),
            r#"while kill -0 "$1" 2>/dev/null; do echo sample >> "$2"; sleep 0.02; done"#.to_string(),
            "fake-profiler".to_string(),
            "{pid}".to_string(),
            "{output}".to_string(),
        ];
        config.profiler.elevate = false;
        config.profiler.capture_path = dir.join("perf.data");
        config.profiler.attach_grace = Duration::from_millis(50);
        config.render.stages = vec![StageConfig::new("cat", &["{capture}"]), StageConfig::new("sort", &[])];
        config.render.artifact_path = dir.join("graph.svg");
        config.orchestrator.settle_delay = Duration::from_millis(10);
        config
    }

    fn visited(orchestrator: &Orchestrator) -> Vec<RunState> {
        orchestrator.transitions().iter().map(|t| t.to).collect()
    }

    #[tokio::test]
    async fn test_run_visits_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = Orchestrator::from_config(quick_config(dir.path())).unwrap();

        let report = orchestrator.run().await.unwrap();
        assert_eq!(orchestrator.state(), RunState::At(Stage::Done));
        assert_eq!(
            visited(&orchestrator),
            Stage::ALL[1..].iter().copied().map(RunState::At).collect::<Vec<_>>()
        );
        assert_eq!(report.transitions[0].from, RunState::At(Stage::Idle));
        assert_eq!(report.run_id, orchestrator.run_id());
        assert_eq!(report.load.fired, 5);
        assert!(report.capture.size > 0);
        assert!(report.artifact.size > 0);
    }

    #[tokio::test]
    async fn test_missing_server_fails_at_server_starting() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quick_config(dir.path());
        config.server.command = Some("/nonexistent/server --port 8080".to_string());

        let mut orchestrator = Orchestrator::from_config(config).unwrap();
        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.stage, Stage::ServerStarting);
        assert!(err.to_string().starts_with("Failed at ServerStarting: "));
        assert_eq!(orchestrator.state(), RunState::Failed(Stage::ServerStarting));
        assert!(!dir.path().join("perf.data").exists());
        assert!(!dir.path().join("graph.svg").exists());
    }

    #[tokio::test]
    async fn test_shot_failures_do_not_halt_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quick_config(dir.path());
        config.load.transport = TransportConfig::Command {
            program: "false".to_string(),
            args: Vec::new(),
        };

        let report = Orchestrator::from_config(config).unwrap().run().await.unwrap();
        assert_eq!(report.load.failed, 5);
        assert_eq!(report.load.completed, 0);
    }

    #[tokio::test]
    async fn test_profiler_that_cannot_attach() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quick_config(dir.path());
        config.profiler.args = vec!["-c".to_string(), "exit 1".to_string(), "x".to_string(), "{pid}".to_string()];

        let mut orchestrator = Orchestrator::from_config(config).unwrap();
        let err = orchestrator.run().await.unwrap_err();
        assert_eq!(err.stage, Stage::ProfilerAttaching);
        assert!(matches!(err.source, StageError::Profiling(_)));
    }

    #[tokio::test]
    async fn test_server_lost_during_load_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quick_config(dir.path());
        config.server.command = Some("sleep 0.2".to_string());
        config.load.shot_count = 10;
        config.load.cooldown = Duration::from_millis(100);

        let mut orchestrator = Orchestrator::from_config(config).unwrap();
        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.stage, Stage::LoadRunning);
        assert!(matches!(
            err.source,
            StageError::Profiling(ProfilingError::Detached { process: "server", .. })
        ));
        assert_eq!(orchestrator.state(), RunState::Failed(Stage::LoadRunning));
        assert!(!dir.path().join("graph.svg").exists());
    }

    #[tokio::test]
    async fn test_empty_capture_fails_at_profiler_draining() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quick_config(dir.path());
        config.profiler.args[1] = r#"while kill -0 "$1" 2>/dev/null; do sleep 0.02; done"#.to_string();

        let mut orchestrator = Orchestrator::from_config(config).unwrap();
        let err = orchestrator.run().await.unwrap_err();

        assert_eq!(err.stage, Stage::ProfilerDraining);
        assert!(matches!(
            err.source,
            StageError::Profiling(ProfilingError::CaptureMissing { .. })
        ));
        assert_eq!(
            visited(&orchestrator).last(),
            Some(&RunState::Failed(Stage::ProfilerDraining))
        );
        assert!(!dir.path().join("graph.svg").exists());
    }

    #[test]
    fn test_from_config_requires_server_command() {
        let err = Orchestrator::from_config(SalvoConfig::default()).err().unwrap();
        assert_eq!(err.stage, Stage::Idle);

        let mut config = SalvoConfig::default();
        config.server.command = Some("'unbalanced".to_string());
        assert!(Orchestrator::from_config(config).is_err());

        let mut config = SalvoConfig::default();
        config.server.command = Some("'unbalanced".to_string());
        config.server.use_shell = true;
        let orchestrator = Orchestrator::from_config(config).unwrap();
        assert_eq!(orchestrator.server_command().program(), "sh");
    }
}
