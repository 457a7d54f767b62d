//! Server-under-test configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// How the server under test is launched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Command line starting the server. Usually supplied on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Run the command line through `sh -c` instead of splitting it into words
    #[serde(default = "crate::domains::utils::default_false")]
    pub use_shell: bool,

    /// Forward stderr of spawned processes instead of discarding it
    #[serde(default = "crate::domains::utils::default_false")]
    pub forward_stderr: bool,
}

impl Validatable for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(ref command) = self.command {
            validate_required_string(command, "command", self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "server"
    }
}
