//! Domain-specific configuration modules

pub mod load;
pub mod logging;
pub mod orchestrator;
pub mod profiler;
pub mod render;
pub mod server;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main salvo configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SalvoConfig {
    /// Server under test
    #[serde(default)]
    pub server: server::ServerConfig,

    /// Request stream and shot pacing
    #[serde(default)]
    pub load: load::LoadConfig,

    /// Sampling profiler
    #[serde(default)]
    pub profiler: profiler::ProfilerConfig,

    /// Flamegraph rendering pipeline
    #[serde(default)]
    pub render: render::RenderConfig,

    /// Run lifecycle
    #[serde(default)]
    pub orchestrator: orchestrator::OrchestratorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl SalvoConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.load.validate()?;
        self.profiler.validate()?;
        self.render.validate()?;
        self.orchestrator.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Render the configuration as YAML
    /// Non-fatal findings, to be logged once logging is up
    pub fn warnings(&self) -> Vec<String> {
        self.load.warnings()
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
