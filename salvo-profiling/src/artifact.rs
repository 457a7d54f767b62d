//! Capture → flamegraph rendering

use crate::error::{RenderError, RenderResult};
use crate::session::CaptureFile;
use salvo_config::domains::render::CAPTURE_PLACEHOLDER;
use salvo_config::{RenderConfig, StageConfig};
use salvo_process::{CommandSpec, OutputSink, Pipeline, ProcessSupervisor, StageStatus};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Rendered output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

/// Ordered filter stages whose last output becomes the artifact.
///
/// The default configuration is `perf script -i {capture}` (elevated),
/// `stackcollapse-perf.pl` and `flamegraph.pl`.
#[derive(Debug, Clone)]
pub struct ArtifactPipeline {
    stages: Vec<StageConfig>,
    artifact_path: PathBuf,
}

impl ArtifactPipeline {
    pub fn new(stages: Vec<StageConfig>, artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            stages,
            artifact_path: artifact_path.into(),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.stages.clone(), config.artifact_path.clone())
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Stage commands with the capture path substituted and elevation applied
    pub fn commands(&self, capture: &CaptureFile) -> RenderResult<Vec<CommandSpec>> {
        let capture_path = capture.path.to_string_lossy();

        self.stages
            .iter()
            .map(|stage| {
                let spec = CommandSpec::new(stage.program.clone())
                    .args(stage.args.iter().cloned())
                    .substitute(&[(CAPTURE_PLACEHOLDER, capture_path.as_ref())]);
                if stage.elevate {
                    spec.elevated(&stage.elevate_program).map_err(RenderError::Spawn)
                } else {
                    Ok(spec)
                }
            })
            .collect()
    }

    /// Run every stage and write the last stage's output to the artifact.
    ///
    /// Any stage exiting nonzero fails the render; a partial artifact is
    /// removed so a failed run never leaves a plausible-looking file behind.
    pub async fn render(&self, supervisor: &ProcessSupervisor, capture: &CaptureFile) -> RenderResult<Artifact> {
        let pipeline = self
            .commands(capture)?
            .into_iter()
            .enumerate()
            .fold(Pipeline::new(), |pipeline, (index, spec)| {
                pipeline.stage(format!("render-{}:{}", index, spec.program()), spec)
            });

        info!(
            stages = pipeline.len(),
            capture = %capture.path.display(),
            artifact = %self.artifact_path.display(),
            "Rendering artifact"
        );

        let handle = match pipeline.spawn(supervisor, OutputSink::File(self.artifact_path.clone())) {
            Ok(handle) => handle,
            Err(e) => {
                self.discard_partial().await;
                return Err(RenderError::Spawn(e));
            }
        };

        let statuses = match handle.wait_all(supervisor).await {
            Ok(statuses) => statuses,
            Err(e) => {
                self.discard_partial().await;
                return Err(RenderError::Wait(e));
            }
        };

        let failures: Vec<StageStatus> = statuses.into_iter().filter(|stage| !stage.status.success()).collect();
        if !failures.is_empty() {
            self.discard_partial().await;
            return Err(RenderError::StagesFailed { failures });
        }

        let size = tokio::fs::metadata(&self.artifact_path)
            .await
            .map(|metadata| metadata.len())
            .unwrap_or(0);
        if size == 0 {
            self.discard_partial().await;
            return Err(RenderError::EmptyArtifact {
                path: self.artifact_path.clone(),
            });
        }

        info!(artifact = %self.artifact_path.display(), size, "Artifact rendered");
        Ok(Artifact {
            path: self.artifact_path.clone(),
            size,
        })
    }

    async fn discard_partial(&self) {
        match tokio::fs::remove_file(&self.artifact_path).await {
            Ok(()) => debug!(artifact = %self.artifact_path.display(), "Removed partial artifact"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(artifact = %self.artifact_path.display(), "Failed to remove partial artifact: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvo_process::ExitStatus;

    fn capture_with(dir: &Path, contents: &str) -> CaptureFile {
        let path = dir.join("perf.data");
        std::fs::write(&path, contents).unwrap();
        CaptureFile {
            size: contents.len() as u64,
            path,
            profiler_status: ExitStatus::from_code(0),
        }
    }

    #[test]
    fn test_default_commands() {
        let pipeline = ArtifactPipeline::from_config(&RenderConfig::default());
        let capture = CaptureFile {
            path: PathBuf::from("perf.data"),
            size: 1,
            profiler_status: ExitStatus::from_code(0),
        };

        let commands = pipeline.commands(&capture).unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].program(), "sudo");
        assert_eq!(commands[0].arguments(), &["perf", "script", "-i", "perf.data"]);
        assert_eq!(commands[1].program(), "./FlameGraph/stackcollapse-perf.pl");
        assert_eq!(commands[2].program(), "./FlameGraph/flamegraph.pl");
        assert_eq!(pipeline.artifact_path(), Path::new("graph.svg"));
    }

    #[tokio::test]
    async fn test_render_chains_filters_into_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let capture = capture_with(dir.path(), "b\na\nb\n");
        let pipeline = ArtifactPipeline::new(
            vec![
                StageConfig::new("cat", &["{capture}"]),
                StageConfig::new("sort", &[]),
                StageConfig::new("uniq", &["-c"]),
            ],
            dir.path().join("graph.svg"),
        );

        let artifact = pipeline.render(&ProcessSupervisor::new(), &capture).await.unwrap();
        assert!(artifact.size > 0);

        let rendered = std::fs::read_to_string(&artifact.path).unwrap();
        let lines: Vec<&str> = rendered.lines().map(str::trim).collect();
        assert_eq!(lines, vec!["1 a", "2 b"]);
    }

    #[tokio::test]
    async fn test_failing_stage_removes_partial_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let capture = capture_with(dir.path(), "sample\n");
        let artifact_path = dir.path().join("graph.svg");
        let pipeline = ArtifactPipeline::new(
            vec![StageConfig::new("cat", &["{capture}"]), StageConfig::new("false", &[])],
            &artifact_path,
        );

        let err = pipeline.render(&ProcessSupervisor::new(), &capture).await.unwrap_err();
        match &err {
            RenderError::StagesFailed { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].label, "render-1:false");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("render-1:false"));
        assert!(!artifact_path.exists());

        // Capture is left untouched
        assert_eq!(std::fs::read_to_string(&capture.path).unwrap(), "sample\n");
    }

    #[tokio::test]
    async fn test_empty_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let capture = capture_with(dir.path(), "sample\n");
        let artifact_path = dir.path().join("graph.svg");
        let pipeline = ArtifactPipeline::new(
            vec![StageConfig::new("grep", &["-c", "nothing", "{capture}"]), StageConfig::new("true", &[])],
            &artifact_path,
        );

        let err = pipeline.render(&ProcessSupervisor::new(), &capture).await.unwrap_err();
        // grep finds nothing and exits 1
        assert!(matches!(err, RenderError::StagesFailed { .. }));

        let pipeline = ArtifactPipeline::new(vec![StageConfig::new("true", &["{capture}"])], &artifact_path);
        let err = pipeline.render(&ProcessSupervisor::new(), &capture).await.unwrap_err();
        assert!(matches!(err, RenderError::EmptyArtifact { .. }));
        assert!(!artifact_path.exists());
    }

    #[tokio::test]
    async fn test_missing_stage_program() {
        let dir = tempfile::tempdir().unwrap();
        let capture = capture_with(dir.path(), "sample\n");
        let pipeline = ArtifactPipeline::new(
            vec![StageConfig::new("/nonexistent/stackcollapse", &["{capture}"])],
            dir.path().join("graph.svg"),
        );

        let err = pipeline.render(&ProcessSupervisor::new(), &capture).await.unwrap_err();
        assert!(matches!(err, RenderError::Spawn(_)));
        assert!(!dir.path().join("graph.svg").exists());
    }
}
