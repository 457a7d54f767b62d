//! Spawning, signalling and reaping external processes

use crate::command::CommandSpec;
use crate::error::{ProcessError, ProcessResult};
use crate::status::ExitStatus;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, ChildStdout};
use tracing::{debug, info, warn};

/// Where a spawned process writes its stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Discard output
    Null,
    /// Share the harness's stdout
    Inherit,
    /// Create (or truncate) a file and write into it
    File(PathBuf),
    /// Keep a pipe for the caller, used to chain pipeline stages
    Piped,
}

impl OutputSink {
    fn to_stdio(&self) -> ProcessResult<Stdio> {
        match self {
            OutputSink::Null => Ok(Stdio::null()),
            OutputSink::Inherit => Ok(Stdio::inherit()),
            OutputSink::Piped => Ok(Stdio::piped()),
            OutputSink::File(path) => std::fs::File::create(path)
                .map(Stdio::from)
                .map_err(|source| ProcessError::Sink {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

/// Liveness of a supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Exited(ExitStatus),
}

/// A process started by [`ProcessSupervisor::spawn`].
///
/// The child is killed if the handle is dropped while still running, so an
/// aborted run never leaves a server behind.
#[derive(Debug)]
pub struct ProcessHandle {
    label: String,
    pid: u32,
    command: CommandSpec,
    child: Child,
    state: ProcessState,
}

impl ProcessHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Last known liveness; call [`ProcessSupervisor::try_wait`] to refresh
    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self.state {
            ProcessState::Running => None,
            ProcessState::Exited(status) => Some(status),
        }
    }

    pub(crate) fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    fn record_exit(&mut self, status: std::process::ExitStatus) -> ExitStatus {
        let status = ExitStatus::from(status);
        self.state = ProcessState::Exited(status);
        status
    }
}

/// Starts external processes and owns the rules for stopping them.
///
/// stdin of every child is closed and stderr is discarded unless
/// `forward_stderr` is set.
#[derive(Debug, Clone, Default)]
pub struct ProcessSupervisor {
    forward_stderr: bool,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forward_stderr(mut self, forward_stderr: bool) -> Self {
        self.forward_stderr = forward_stderr;
        self
    }

    /// Launch a process. It starts running immediately.
    pub fn spawn(
        &self,
        label: impl Into<String>,
        spec: &CommandSpec,
        sink: OutputSink,
    ) -> ProcessResult<ProcessHandle> {
        self.spawn_with_stdin(label.into(), spec, Stdio::null(), &sink)
    }

    pub(crate) fn spawn_with_stdin(
        &self,
        label: String,
        spec: &CommandSpec,
        stdin: Stdio,
        sink: &OutputSink,
    ) -> ProcessResult<ProcessHandle> {
        let stderr = if self.forward_stderr {
            Stdio::inherit()
        } else {
            Stdio::null()
        };

        let mut command = spec.to_command();
        command
            .stdin(stdin)
            .stdout(sink.to_stdio()?)
            .stderr(stderr)
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| ProcessError::Spawn {
            label: label.clone(),
            program: spec.program().to_string(),
            source,
        })?;

        let pid = child.id().ok_or_else(|| ProcessError::Spawn {
            label: label.clone(),
            program: spec.program().to_string(),
            source: std::io::Error::other("process exited before its pid was observed"),
        })?;

        debug!(label = %label, pid, command = %spec, "Spawned process");

        Ok(ProcessHandle {
            label,
            pid,
            command: spec.clone(),
            child,
            state: ProcessState::Running,
        })
    }

    /// Non-blocking liveness probe
    pub fn try_wait(&self, handle: &mut ProcessHandle) -> ProcessResult<Option<ExitStatus>> {
        if let ProcessState::Exited(status) = handle.state {
            return Ok(Some(status));
        }

        match handle.child.try_wait() {
            Ok(Some(status)) => Ok(Some(handle.record_exit(status))),
            Ok(None) => Ok(None),
            Err(source) => Err(ProcessError::Wait {
                label: handle.label.clone(),
                source,
            }),
        }
    }

    /// Ask the process to stop (SIGTERM) without waiting for it.
    ///
    /// Terminating a process that already exited is a no-op. Returning does
    /// not mean the process has released its resources; use [`Self::wait`].
    pub fn terminate(&self, handle: &mut ProcessHandle) -> ProcessResult<()> {
        if let Some(status) = self.try_wait(handle)? {
            debug!(label = %handle.label, %status, "Process already exited, nothing to terminate");
            return Ok(());
        }

        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            match signal::kill(Pid::from_raw(handle.pid as i32), Signal::SIGTERM) {
                Ok(()) => {
                    debug!(label = %handle.label, pid = handle.pid, "Sent SIGTERM");
                }
                Err(Errno::ESRCH) => {
                    debug!(label = %handle.label, pid = handle.pid, "Process vanished before SIGTERM");
                }
                Err(e) => {
                    return Err(ProcessError::Signal {
                        label: handle.label.clone(),
                        pid: handle.pid,
                        reason: e.to_string(),
                    });
                }
            }
        }

        #[cfg(not(unix))]
        {
            handle.child.start_kill().map_err(|e| ProcessError::Signal {
                label: handle.label.clone(),
                pid: handle.pid,
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// Stop a process, optionally letting it finish first.
    ///
    /// With `wait` set the call blocks until the process exits on its own and
    /// then terminates it (a no-op at that point). Without it the process is
    /// terminated immediately and not waited on.
    pub async fn terminate_and_wait(
        &self,
        handle: &mut ProcessHandle,
        wait: bool,
    ) -> ProcessResult<Option<ExitStatus>> {
        let status = if wait {
            Some(self.wait(handle).await?)
        } else {
            None
        };

        self.terminate(handle)?;
        Ok(status)
    }

    /// Block until the process exits.
    ///
    /// A nonzero exit is returned as a status, not an error.
    pub async fn wait(&self, handle: &mut ProcessHandle) -> ProcessResult<ExitStatus> {
        if let ProcessState::Exited(status) = handle.state {
            return Ok(status);
        }

        let status = handle
            .child
            .wait()
            .await
            .map_err(|source| ProcessError::Wait {
                label: handle.label.clone(),
                source,
            })?;

        let status = handle.record_exit(status);
        if status.success() {
            debug!(label = %handle.label, pid = handle.pid, %status, "Process exited");
        } else {
            info!(label = %handle.label, pid = handle.pid, %status, "Process exited unsuccessfully");
        }
        Ok(status)
    }

    /// Best-effort termination used on failure paths
    pub fn terminate_quietly(&self, handle: &mut ProcessHandle) {
        if let Err(e) = self.terminate(handle) {
            warn!(label = %handle.label, "Failed to terminate process: {}", e);
        }
    }
}
