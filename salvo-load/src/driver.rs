//! Sequential load loop

use crate::shot::{ShotExecutor, ShotResult};
use crate::source::RequestStream;
use std::fmt;
use tracing::{debug, info, warn};

/// Aggregate outcome of a load run, used for reporting only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub fired: u32,
    pub completed: u32,
    pub failed: u32,
}

impl LoadSummary {
    fn record(&mut self, result: &ShotResult) {
        self.fired += 1;
        match result {
            ShotResult::Completed => self.completed += 1,
            ShotResult::Failed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} shots ({} completed, {} failed)",
            self.fired, self.completed, self.failed
        )
    }
}

/// Drives a fixed number of shots, one at a time
pub struct LoadDriver<E> {
    executor: E,
}

impl<E: ShotExecutor> LoadDriver<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Fire exactly `shot_count` shots in stream order.
    ///
    /// Shot `k + 1` starts only after shot `k` returned. Failed shots are
    /// logged and counted; they never stop the run.
    pub async fn run(&mut self, stream: &mut RequestStream, shot_count: u32) -> LoadSummary {
        let mut summary = LoadSummary::default();
        info!(shot_count, seed = stream.seed(), "Shooting");

        for shot in 0..shot_count {
            // The stream is infinite
            let Some(target) = stream.next() else { break };

            debug!(shot, %target, "Firing");
            let result = self.executor.fire(&target).await;
            if let ShotResult::Failed(reason) = &result {
                warn!(shot, %target, "Shot failed: {}", reason);
            }
            summary.record(&result);
        }

        info!(%summary, "Shooting complete");
        summary
    }

    pub fn into_inner(self) -> E {
        self.executor
    }
}
