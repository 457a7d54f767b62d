//! Configuration loading and environment variable handling

use crate::domains::SalvoConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "SALVO".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<SalvoConfig> {
        let content = std::fs::read_to_string(path)?;
        self.from_yaml_str(&content)
    }

    /// Load configuration from YAML text with environment overrides
    pub fn from_yaml_str(&self, content: &str) -> ConfigResult<SalvoConfig> {
        let mut config: SalvoConfig = serde_yaml::from_str(content)?;
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<SalvoConfig> {
        let mut config = SalvoConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<SalvoConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut SalvoConfig) -> ConfigResult<()> {
        self.apply_load_overrides(&mut config.load)?;
        self.apply_profiler_overrides(&mut config.profiler);
        self.apply_render_overrides(&mut config.render);
        self.apply_orchestrator_overrides(&mut config.orchestrator)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_load_overrides(
        &self,
        config: &mut crate::domains::load::LoadConfig,
    ) -> ConfigResult<()> {
        if let Some(seed) = self.parse_env_var::<u64>("SEED")? {
            config.seed = seed;
        }

        if let Some(count) = self.parse_env_var::<u32>("SHOT_COUNT")? {
            config.shot_count = count;
        }

        if let Some(millis) = self.parse_env_var::<u64>("COOLDOWN_MS")? {
            config.cooldown = Duration::from_millis(millis);
        }

        Ok(())
    }

    fn apply_profiler_overrides(&self, config: &mut crate::domains::profiler::ProfilerConfig) {
        if let Ok(path) = self.get_env_var("CAPTURE_PATH") {
            config.capture_path = PathBuf::from(path);
        }
    }

    fn apply_render_overrides(&self, config: &mut crate::domains::render::RenderConfig) {
        if let Ok(path) = self.get_env_var("ARTIFACT_PATH") {
            config.artifact_path = PathBuf::from(path);
        }
    }

    fn apply_orchestrator_overrides(
        &self,
        config: &mut crate::domains::orchestrator::OrchestratorConfig,
    ) -> ConfigResult<()> {
        if let Some(millis) = self.parse_env_var::<u64>("SETTLE_DELAY_MS")? {
            config.settle_delay = Duration::from_millis(millis);
        }
        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }

    /// Parse an optional prefixed environment variable
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e))),
            Err(_) => Ok(None),
        }
    }
}
