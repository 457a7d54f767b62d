//! Load generation configuration
//!
//! Every value in this domain is part of the reproducibility contract of a
//! run: two runs with the same seed, limit, catalog, shot count and cooldown
//! issue the same request sequence at the same pace.

use crate::error::ConfigResult;
use crate::validation::{validate_address, validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seed of the request stream used by the reference configuration
pub const DEFAULT_SEED: u64 = 123_456_789;

/// Upper bound (exclusive) of every raw draw before the modulo reduction
pub const DEFAULT_RANDOM_LIMIT: u64 = 1000;

/// Number of shots fired per run
pub const DEFAULT_SHOT_COUNT: u32 = 100;

/// Load generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Seed of the request stream generator
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Exclusive upper bound of raw draws, reduced modulo the catalog size
    #[serde(default = "default_random_limit")]
    pub random_limit: u64,

    /// Number of sequential shots
    #[serde(default = "default_shot_count")]
    pub shot_count: u32,

    /// Pause after issuing each shot
    #[serde(with = "humantime_serde", default = "default_cooldown")]
    pub cooldown: Duration,

    /// Host and port prefixed to every catalog path
    #[serde(default = "default_base_address")]
    pub base_address: String,

    /// Endpoint paths the stream draws from
    #[serde(default = "default_catalog")]
    pub catalog: Vec<String>,

    /// Client used to issue each shot
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Transport used by the shot executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Spawn a command-line HTTP client per shot, target appended last
    Command {
        #[serde(default = "default_client_program")]
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Issue the request in-process
    Http {
        #[serde(with = "humantime_serde", default = "default_http_timeout")]
        timeout: Duration,
    },
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            random_limit: default_random_limit(),
            shot_count: default_shot_count(),
            cooldown: default_cooldown(),
            base_address: default_base_address(),
            catalog: default_catalog(),
            transport: TransportConfig::default(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Command {
            program: default_client_program(),
            args: Vec::new(),
        }
    }
}

impl LoadConfig {
    /// Settings that are valid but probably not what was intended
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.cooldown.is_zero() {
            warnings.push("load.cooldown is zero; shots will be paced only by request latency".to_string());
        }
        warnings
    }

    /// Full targets, in catalog order
    pub fn targets(&self) -> Vec<String> {
        self.catalog
            .iter()
            .map(|path| format!("{}{}", self.base_address, path))
            .collect()
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.shot_count, "shot_count", self.domain_name())?;
        validate_address(&self.base_address, "base_address", self.domain_name())?;

        if self.catalog.is_empty() {
            return Err(self.validation_error("catalog must contain at least one path"));
        }
        for path in &self.catalog {
            validate_required_string(path, "catalog entry", self.domain_name())?;
        }

        if self.random_limit <= self.catalog.len() as u64 {
            return Err(self.validation_error(format!(
                "random_limit ({}) must be larger than the catalog size ({})",
                self.random_limit,
                self.catalog.len()
            )));
        }
        if self.random_limit > u64::from(u32::MAX) {
            return Err(self.validation_error(format!(
                "random_limit ({}) must fit in 32 bits",
                self.random_limit
            )));
        }

        self.transport.validate()
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

impl Validatable for TransportConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self {
            TransportConfig::Command { program, .. } => {
                validate_required_string(program, "program", self.domain_name())
            }
            TransportConfig::Http { timeout } => {
                validate_positive(timeout.as_millis(), "timeout", self.domain_name())
            }
        }
    }

    fn domain_name(&self) -> &'static str {
        "load.transport"
    }
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_random_limit() -> u64 {
    DEFAULT_RANDOM_LIMIT
}

fn default_shot_count() -> u32 {
    DEFAULT_SHOT_COUNT
}

fn default_cooldown() -> Duration {
    Duration::from_millis(100)
}

fn default_base_address() -> String {
    "localhost:8080".to_string()
}

fn default_catalog() -> Vec<String> {
    vec!["/api/v1/maps/map1".to_string(), "/api/v1/maps".to_string()]
}

fn default_client_program() -> String {
    "curl".to_string()
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(5)
}
