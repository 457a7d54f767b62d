//! Multi-stage process pipelines
//!
//! Equivalent to `a | b | c > out` without a shell: each stage is an
//! explicit argument vector and stdout of one stage is handed directly to
//! stdin of the next.

use crate::command::CommandSpec;
use crate::error::{ProcessError, ProcessResult};
use crate::status::ExitStatus;
use crate::supervisor::{OutputSink, ProcessHandle, ProcessSupervisor};
use std::process::Stdio;
use tracing::debug;

/// Ordered list of stages
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<(String, CommandSpec)>,
}

/// Exit status of one finished stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStatus {
    pub label: String,
    pub status: ExitStatus,
}

/// Running pipeline
#[derive(Debug)]
pub struct PipelineHandle {
    stages: Vec<ProcessHandle>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, label: impl Into<String>, spec: CommandSpec) -> Self {
        self.stages.push((label.into(), spec));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Start every stage. The last stage writes to `sink`.
    ///
    /// If a stage fails to start, stages already running are terminated.
    pub fn spawn(&self, supervisor: &ProcessSupervisor, sink: OutputSink) -> ProcessResult<PipelineHandle> {
        if self.stages.is_empty() {
            return Err(ProcessError::InvalidCommand("<empty pipeline>".to_string()));
        }

        let last = self.stages.len() - 1;
        let mut handles: Vec<ProcessHandle> = Vec::with_capacity(self.stages.len());
        let mut stdin = Stdio::null();

        for (index, (label, spec)) in self.stages.iter().enumerate() {
            let out = if index == last {
                sink.clone()
            } else {
                OutputSink::Piped
            };

            let spawned = supervisor
                .spawn_with_stdin(label.clone(), spec, stdin, &out)
                .and_then(|mut handle| {
                    let next_stdin = if index == last {
                        Stdio::null()
                    } else {
                        Self::take_pipe(&mut handle)?
                    };
                    Ok((handle, next_stdin))
                });

            match spawned {
                Ok((handle, next_stdin)) => {
                    handles.push(handle);
                    stdin = next_stdin;
                }
                Err(e) => {
                    for handle in handles.iter_mut() {
                        supervisor.terminate_quietly(handle);
                    }
                    return Err(e);
                }
            }
        }

        debug!(stages = handles.len(), "Pipeline started");
        Ok(PipelineHandle { stages: handles })
    }

    fn take_pipe(handle: &mut ProcessHandle) -> ProcessResult<Stdio> {
        let stdout = handle.take_stdout().ok_or_else(|| ProcessError::Pipe {
            label: handle.label().to_string(),
            reason: "stdout was not captured".to_string(),
        })?;

        stdout.try_into().map_err(|e: std::io::Error| ProcessError::Pipe {
            label: handle.label().to_string(),
            reason: e.to_string(),
        })
    }
}

impl PipelineHandle {
    /// Wait for every stage, in order
    pub async fn wait_all(mut self, supervisor: &ProcessSupervisor) -> ProcessResult<Vec<StageStatus>> {
        let mut statuses = Vec::with_capacity(self.stages.len());
        for handle in self.stages.iter_mut() {
            let status = supervisor.wait(handle).await?;
            statuses.push(StageStatus {
                label: handle.label().to_string(),
                status,
            });
        }
        Ok(statuses)
    }

    pub fn pids(&self) -> Vec<u32> {
        self.stages.iter().map(ProcessHandle::pid).collect()
    }
}
