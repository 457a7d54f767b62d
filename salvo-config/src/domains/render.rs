//! Flamegraph rendering configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder replaced by the capture file path in stage arguments
pub const CAPTURE_PLACEHOLDER: &str = "{capture}";

/// Rendering pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Stages run in order, each reading the previous stage's stdout
    #[serde(default = "default_stages")]
    pub stages: Vec<StageConfig>,

    /// File receiving the last stage's stdout
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
}

/// One stage of the rendering pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "crate::domains::utils::default_false")]
    pub elevate: bool,

    #[serde(default = "crate::domains::utils::default_elevate_program")]
    pub elevate_program: String,
}

impl StageConfig {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            elevate: false,
            elevate_program: crate::domains::utils::default_elevate_program(),
        }
    }

    pub fn elevated(mut self) -> Self {
        self.elevate = true;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            stages: default_stages(),
            artifact_path: default_artifact_path(),
        }
    }
}

impl Validatable for RenderConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.stages.is_empty() {
            return Err(self.validation_error("at least one render stage is required"));
        }

        for stage in &self.stages {
            stage.validate()?;
        }

        if !self
            .stages
            .iter()
            .any(|stage| stage.args.iter().any(|arg| arg.contains(CAPTURE_PLACEHOLDER)))
        {
            return Err(self.validation_error(format!(
                "one stage must read the capture file through {}",
                CAPTURE_PLACEHOLDER
            )));
        }

        if self.artifact_path.as_os_str().is_empty() {
            return Err(self.validation_error("artifact_path cannot be empty"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "render"
    }
}

impl Validatable for StageConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.program, "program", self.domain_name())?;
        if self.elevate {
            validate_required_string(&self.elevate_program, "elevate_program", self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "render.stages"
    }
}

fn default_stages() -> Vec<StageConfig> {
    vec![
        StageConfig::new("perf", &["script", "-i", CAPTURE_PLACEHOLDER]).elevated(),
        StageConfig::new("./FlameGraph/stackcollapse-perf.pl", &[]),
        StageConfig::new("./FlameGraph/flamegraph.pl", &[]),
    ]
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("graph.svg")
}
