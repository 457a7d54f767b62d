//! Run lifecycle configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Fixed pause after rendering before the run is reported done.
    /// There is no flush-completion signal from the filters, so this is a
    /// coarse stand-in for one.
    #[serde(with = "humantime_serde", default = "default_settle_delay")]
    pub settle_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            settle_delay: default_settle_delay(),
        }
    }
}

impl Validatable for OrchestratorConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.settle_delay > Duration::from_secs(60) {
            return Err(self.validation_error("settle_delay cannot exceed 60s"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "orchestrator"
    }
}

fn default_settle_delay() -> Duration {
    Duration::from_secs(1)
}
