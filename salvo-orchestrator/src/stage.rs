//! Run stages and the transition history

use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle stage of a run. Stages are entered strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    ServerStarting,
    ProfilerAttaching,
    LoadRunning,
    ServerStopping,
    ProfilerDraining,
    Rendering,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Idle,
        Stage::ServerStarting,
        Stage::ProfilerAttaching,
        Stage::LoadRunning,
        Stage::ServerStopping,
        Stage::ProfilerDraining,
        Stage::Rendering,
        Stage::Done,
    ];

    /// Following stage, `None` once done
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::ServerStarting),
            Stage::ServerStarting => Some(Stage::ProfilerAttaching),
            Stage::ProfilerAttaching => Some(Stage::LoadRunning),
            Stage::LoadRunning => Some(Stage::ServerStopping),
            Stage::ServerStopping => Some(Stage::ProfilerDraining),
            Stage::ProfilerDraining => Some(Stage::Rendering),
            Stage::Rendering => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::ServerStarting => "ServerStarting",
            Stage::ProfilerAttaching => "ProfilerAttaching",
            Stage::LoadRunning => "LoadRunning",
            Stage::ServerStopping => "ServerStopping",
            Stage::ProfilerDraining => "ProfilerDraining",
            Stage::Rendering => "Rendering",
            Stage::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a run currently is. `Failed` is terminal and remembers the stage
/// that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    At(Stage),
    Failed(Stage),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::At(Stage::Done) | RunState::Failed(_))
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::At(stage) => write!(f, "{}", stage),
            RunState::Failed(stage) => write!(f, "Failed({})", stage),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: RunState,
    pub to: RunState,
    pub at: DateTime<Utc>,
}
