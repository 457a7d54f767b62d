//! Sampling profiler configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder replaced by the server pid in profiler arguments
pub const PID_PLACEHOLDER: &str = "{pid}";

/// Placeholder replaced by the capture file path in profiler arguments
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Profiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Profiler executable
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments, with `{pid}` and `{output}` substituted at attach time
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Run the profiler through `elevate_program`
    #[serde(default = "crate::domains::utils::default_true")]
    pub elevate: bool,

    /// Privilege elevation wrapper
    #[serde(default = "crate::domains::utils::default_elevate_program")]
    pub elevate_program: String,

    /// Where the profiler writes its samples
    #[serde(default = "default_capture_path")]
    pub capture_path: PathBuf,

    /// How long the profiler must survive after spawn to count as attached
    #[serde(with = "humantime_serde", default = "default_attach_grace")]
    pub attach_grace: Duration,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            elevate: true,
            elevate_program: crate::domains::utils::default_elevate_program(),
            capture_path: default_capture_path(),
            attach_grace: default_attach_grace(),
        }
    }
}

impl Validatable for ProfilerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.program, "program", self.domain_name())?;

        if self.elevate {
            validate_required_string(&self.elevate_program, "elevate_program", self.domain_name())?;
        }

        if !self.args.iter().any(|arg| arg.contains(PID_PLACEHOLDER)) {
            return Err(self.validation_error(format!(
                "args must reference the server pid through {}",
                PID_PLACEHOLDER
            )));
        }

        if self.capture_path.as_os_str().is_empty() {
            return Err(self.validation_error("capture_path cannot be empty"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "profiler"
    }
}

fn default_program() -> String {
    "perf".to_string()
}

fn default_args() -> Vec<String> {
    ["record", "-o", OUTPUT_PLACEHOLDER, "-p", PID_PLACEHOLDER, "-g"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_capture_path() -> PathBuf {
    PathBuf::from("perf.data")
}

fn default_attach_grace() -> Duration {
    Duration::from_millis(250)
}
