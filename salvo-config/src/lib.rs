//! Domain-driven configuration for salvo
//!
//! Configuration is split by functional domain (server, load, profiler,
//! render, orchestrator, logging). Each domain has defaults matching the
//! reference profiling run, validation, and `SALVO_*` environment overrides.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    load::{LoadConfig, TransportConfig},
    logging::{LogFormat, LogLevel, LoggingConfig},
    orchestrator::OrchestratorConfig,
    profiler::ProfilerConfig,
    render::{RenderConfig, StageConfig},
    server::ServerConfig,
    SalvoConfig,
};
