//! Orchestration errors

use crate::stage::Stage;
use salvo_load::LoadError;
use salvo_process::ProcessError;
use salvo_profiling::{ProfilingError, RenderError};
use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// The failure that halted a stage
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Profiling(#[from] ProfilingError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{0}")]
    Setup(String),
}

#[derive(Error, Debug)]
#[error("Failed at {stage}: {source}")]
pub struct OrchestratorError {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl OrchestratorError {
    pub fn new(stage: Stage, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}
