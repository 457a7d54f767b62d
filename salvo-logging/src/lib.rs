//! Logging setup for salvo
//!
//! All crates log through `tracing`; this crate installs the global
//! subscriber once, from the logging domain of the configuration.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
