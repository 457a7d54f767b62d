//! Process supervision errors

use std::path::PathBuf;
use thiserror::Error;

pub type ProcessResult<T> = Result<T, ProcessError>;

#[derive(Error, Debug)]
pub enum ProcessError {
    /// The command line could not be turned into a program and arguments
    #[error("Invalid command line '{0}'")]
    InvalidCommand(String),

    /// The executable could not be located or the fork failed
    #[error("Failed to spawn {label} ({program}): {source}")]
    Spawn {
        label: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Output file for a process could not be opened
    #[error("Failed to open output file {path}: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to deliver a termination signal
    #[error("Failed to signal {label} (pid {pid}): {reason}")]
    Signal { label: String, pid: u32, reason: String },

    /// Waiting on the process failed at the OS level
    #[error("Failed to wait on {label}: {source}")]
    Wait {
        label: String,
        #[source]
        source: std::io::Error,
    },

    /// Connecting one pipeline stage to the next failed
    #[error("Failed to connect pipeline stage {label}: {reason}")]
    Pipe { label: String, reason: String },
}
