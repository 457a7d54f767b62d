//! Profiling and rendering errors

use salvo_process::{ExitStatus, ProcessError, StageStatus};
use std::path::PathBuf;
use thiserror::Error;

pub type ProfilingResult<T> = Result<T, ProfilingError>;
pub type RenderResult<T> = Result<T, RenderError>;

/// Why the profiler could not be attached to the server
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("server (pid {pid}) exited with {status} before the profiler could attach")]
    TargetExited { pid: u32, status: ExitStatus },

    /// Usually missing privileges or a pid the profiler could not open
    #[error("profiler exited with {status} while attaching")]
    ProfilerExited { status: ExitStatus },
}

#[derive(Error, Debug)]
pub enum ProfilingError {
    #[error("Failed to start profiler: {0}")]
    Spawn(#[source] ProcessError),

    #[error("Failed to attach profiler: {0}")]
    Attach(#[from] AttachError),

    /// The server or profiler exited before load generation finished
    #[error("{process} exited with {status} before load generation finished")]
    Detached { process: &'static str, status: ExitStatus },

    /// Stopping or reaping the server or profiler failed at the OS level
    #[error("Failed to drain profiling session: {0}")]
    Wait(#[source] ProcessError),

    #[error("Capture file {path} is missing or empty")]
    CaptureMissing { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to start render stages: {0}")]
    Spawn(#[source] ProcessError),

    #[error("Failed to wait on render stages: {0}")]
    Wait(#[source] ProcessError),

    #[error("Render stages failed: {}", describe_failures(.failures))]
    StagesFailed { failures: Vec<StageStatus> },

    #[error("Render produced an empty artifact at {path}")]
    EmptyArtifact { path: PathBuf },
}

fn describe_failures(failures: &[StageStatus]) -> String {
    failures
        .iter()
        .map(|stage| format!("{} ({})", stage.label, stage.status))
        .collect::<Vec<_>>()
        .join(", ")
}
