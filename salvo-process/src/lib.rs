//! Process supervision for salvo
//!
//! Every external program the harness touches (server under test, profiler,
//! HTTP client, render filters) is started and stopped through
//! [`ProcessSupervisor`]. Exit codes are values, never errors; only failing
//! to spawn, signal or observe a process is an error.

pub mod command;
pub mod error;
pub mod pipeline;
pub mod status;
pub mod supervisor;

pub use command::CommandSpec;
pub use error::{ProcessError, ProcessResult};
pub use pipeline::{Pipeline, PipelineHandle, StageStatus};
pub use status::ExitStatus;
pub use supervisor::{OutputSink, ProcessHandle, ProcessState, ProcessSupervisor};
