//! Profiler attached to a running server
//!
//! The session owns both processes from the moment the profiler is attached
//! until the capture has been drained. The server is stopped and reaped
//! first; the profiler notices its target is gone and flushes. The capture
//! file is only looked at after the profiler has exited.

use crate::error::{AttachError, ProfilingError, ProfilingResult};
use salvo_config::domains::profiler::{OUTPUT_PLACEHOLDER, PID_PLACEHOLDER};
use salvo_config::ProfilerConfig;
use salvo_process::{CommandSpec, ExitStatus, OutputSink, ProcessHandle, ProcessSupervisor};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Profiler output after the profiler has exited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFile {
    pub path: PathBuf,
    pub size: u64,
    pub profiler_status: ExitStatus,
}

#[derive(Debug)]
pub struct ProfilingSession {
    supervisor: ProcessSupervisor,
    server: ProcessHandle,
    profiler: ProcessHandle,
    capture_path: PathBuf,
}

impl ProfilingSession {
    /// Attach the configured profiler to `server`.
    ///
    /// On failure the server is terminated before the error is returned, so
    /// the caller never has to clean up after a half-started session.
    pub async fn begin(
        supervisor: &ProcessSupervisor,
        mut server: ProcessHandle,
        config: &ProfilerConfig,
    ) -> ProfilingResult<Self> {
        match supervisor.try_wait(&mut server) {
            Ok(Some(status)) => {
                return Err(AttachError::TargetExited {
                    pid: server.pid(),
                    status,
                }
                .into());
            }
            Ok(None) => {}
            Err(e) => {
                supervisor.terminate_quietly(&mut server);
                return Err(ProfilingError::Wait(e));
            }
        }

        remove_stale_capture(&config.capture_path).await;

        let spec = match profiler_command(config, server.pid()) {
            Ok(spec) => spec,
            Err(e) => {
                supervisor.terminate_quietly(&mut server);
                return Err(ProfilingError::Spawn(e));
            }
        };

        let mut profiler = match supervisor.spawn("profiler", &spec, OutputSink::Null) {
            Ok(handle) => handle,
            Err(e) => {
                supervisor.terminate_quietly(&mut server);
                return Err(ProfilingError::Spawn(e));
            }
        };

        tokio::time::sleep(config.attach_grace).await;

        match supervisor.try_wait(&mut profiler) {
            Ok(None) => {}
            Ok(Some(status)) => {
                supervisor.terminate_quietly(&mut server);
                return Err(AttachError::ProfilerExited { status }.into());
            }
            Err(e) => {
                supervisor.terminate_quietly(&mut server);
                supervisor.terminate_quietly(&mut profiler);
                return Err(ProfilingError::Wait(e));
            }
        }

        // The server may have died while the profiler was attaching
        match supervisor.try_wait(&mut server) {
            Ok(None) => {}
            Ok(Some(status)) => {
                supervisor.terminate_quietly(&mut profiler);
                return Err(AttachError::TargetExited {
                    pid: server.pid(),
                    status,
                }
                .into());
            }
            Err(e) => {
                supervisor.terminate_quietly(&mut server);
                supervisor.terminate_quietly(&mut profiler);
                return Err(ProfilingError::Wait(e));
            }
        }

        info!(
            server_pid = server.pid(),
            profiler_pid = profiler.pid(),
            capture = %config.capture_path.display(),
            "Profiler attached"
        );

        Ok(Self {
            supervisor: supervisor.clone(),
            server,
            profiler,
            capture_path: config.capture_path.clone(),
        })
    }

    pub fn server_pid(&self) -> u32 {
        self.server.pid()
    }

    pub fn profiler_pid(&self) -> u32 {
        self.profiler.pid()
    }

    pub fn capture_path(&self) -> &Path {
        &self.capture_path
    }

    /// Check that both the server and the profiler are still running.
    ///
    /// Called once load is done: a session that lost either process covers
    /// only part of the load and its capture is not comparable to a full run.
    pub fn ensure_alive(&mut self) -> ProfilingResult<()> {
        for (process, handle) in [("server", &mut self.server), ("profiler", &mut self.profiler)] {
            if let Some(status) = self.supervisor.try_wait(handle).map_err(ProfilingError::Wait)? {
                return Err(ProfilingError::Detached { process, status });
            }
        }
        Ok(())
    }

    /// Stop the server and wait until the profiler has flushed its capture
    pub async fn end(mut self) -> ProfilingResult<CaptureFile> {
        if let Err(e) = self.stop_server().await {
            self.abort();
            return Err(e);
        }
        self.drain().await
    }

    /// Terminate the server and reap it.
    ///
    /// Reaping matters: until the server is reaped its pid still exists, and
    /// a profiler following that pid would keep sampling a zombie.
    pub async fn stop_server(&mut self) -> ProfilingResult<ExitStatus> {
        self.supervisor
            .terminate(&mut self.server)
            .map_err(ProfilingError::Wait)?;

        let status = self
            .supervisor
            .wait(&mut self.server)
            .await
            .map_err(ProfilingError::Wait)?;
        debug!(%status, "Server stopped");
        Ok(status)
    }

    /// Wait for the profiler to exit, then inspect the capture.
    ///
    /// A nonzero profiler exit is logged but not fatal; the capture file
    /// decides whether the session produced anything.
    pub async fn drain(mut self) -> ProfilingResult<CaptureFile> {
        let profiler_status = self
            .supervisor
            .wait(&mut self.profiler)
            .await
            .map_err(ProfilingError::Wait)?;
        if !profiler_status.success() {
            warn!(%profiler_status, "Profiler exited unsuccessfully");
        }

        let size = match tokio::fs::metadata(&self.capture_path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => {
                warn!(capture = %self.capture_path.display(), "Failed to inspect capture: {}", e);
                0
            }
        };

        if size == 0 {
            return Err(ProfilingError::CaptureMissing {
                path: self.capture_path,
            });
        }

        info!(capture = %self.capture_path.display(), size, "Capture drained");
        Ok(CaptureFile {
            path: self.capture_path,
            size,
            profiler_status,
        })
    }

    /// Best-effort stop of both processes
    pub fn abort(mut self) {
        self.supervisor.terminate_quietly(&mut self.server);
        self.supervisor.terminate_quietly(&mut self.profiler);
    }
}

fn profiler_command(config: &ProfilerConfig, pid: u32) -> salvo_process::ProcessResult<CommandSpec> {
    let pid = pid.to_string();
    let output = config.capture_path.to_string_lossy();

    let spec = CommandSpec::new(config.program.clone())
        .args(config.args.iter().cloned())
        .substitute(&[(PID_PLACEHOLDER, pid.as_str()), (OUTPUT_PLACEHOLDER, output.as_ref())]);

    if config.elevate {
        spec.elevated(&config.elevate_program)
    } else {
        Ok(spec)
    }
}

// A capture left over from an earlier run would hide a profiler that never wrote
async fn remove_stale_capture(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(capture = %path.display(), "Removed previous capture"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(capture = %path.display(), "Failed to remove previous capture: {}", e),
    }
}
