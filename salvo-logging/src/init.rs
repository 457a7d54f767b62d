use anyhow::Result;
use salvo_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Build an env filter from an explicit level, falling back to `RUST_LOG`
/// and finally to `info`.
pub fn build_env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging from configuration.
///
/// `level_override` (usually `--log-level`) wins over the configured level.
pub fn init_logging_from_config(config: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override
        .map(str::to_string)
        .unwrap_or_else(|| config.level.to_string());
    let env_filter = build_env_filter(&level);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    // Use try_init to avoid panic if global subscriber already set
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    if tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(log_level))
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_env_filter_accepts_directives() {
        let filter = build_env_filter("salvo_orchestrator=debug,warn");
        let rendered = filter.to_string();
        assert!(rendered.contains("salvo_orchestrator=debug"));
        assert!(rendered.contains("warn"));
    }

    #[test]
    fn test_repeated_initialization_is_harmless() {
        let config = LoggingConfig::default();
        assert!(init_logging_from_config(&config, Some("debug")).is_ok());
        assert!(init_logging_from_config(&config, None).is_ok());
        assert!(init_simple_tracing("trace").is_ok());
    }
}
