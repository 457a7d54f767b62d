mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use salvo_config::{ConfigLoader, SalvoConfig, Validatable};
use salvo_load::RequestStream;
use salvo_logging::init_logging_from_config;
use salvo_orchestrator::Orchestrator;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};

/// Load configuration from file or environment.
///
/// An explicit path that does not exist is an error rather than a silent
/// fallback to the default profile.
fn load_config(config_path: Option<&PathBuf>) -> Result<SalvoConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if !path.exists() {
                bail!("Configuration file not found: {:?}", path);
            }
            loader
                .from_file(path)
                .context(format!("Failed to load configuration from {:?}", path))
        }
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

fn show_sequence(config: &SalvoConfig, count: usize) -> Result<()> {
    let stream = RequestStream::from_config(&config.load).context("Invalid load configuration")?;
    for target in stream.take(count) {
        println!("{}", target);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    cli.apply(&mut config);
    config
        .server
        .validate()
        .context("Invalid server configuration")?;

    if cli.dump_config {
        print!("{}", config.to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    init_logging_from_config(&config.logging, cli.log_level.as_deref())?;
    debug!(?cli, "Parsed command line");
    for warning in config.warnings() {
        warn!("{}", warning);
    }

    if let Some(count) = cli.show_sequence {
        show_sequence(&config, count)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut orchestrator = Orchestrator::from_config(config)?;
    match orchestrator.run().await {
        Ok(report) => {
            info!(
                run_id = %report.run_id,
                started_at = %report.started_at,
                elapsed_ms = report.elapsed.as_millis() as u64,
                capture = %report.capture.path.display(),
                artifact = %report.artifact.path.display(),
                "{}",
                report.load
            );
            println!("Job done");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
