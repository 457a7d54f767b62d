//! CLI argument parsing definitions

use clap::Parser;
use salvo_config::SalvoConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command line of the server to profile (overrides `server.command`)
    #[arg(value_name = "SERVER_COMMAND", required_unless_present_any = ["dump_config", "show_sequence"])]
    pub server_command: Option<String>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Run the server command through `sh -c` instead of splitting it into words
    #[arg(long)]
    pub shell: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Print the first N targets of the request sequence and exit
    #[arg(long, value_name = "N")]
    pub show_sequence: Option<usize>,
}

impl Cli {
    /// Fold command line overrides into the loaded configuration
    pub fn apply(&self, config: &mut SalvoConfig) {
        if let Some(command) = &self.server_command {
            config.server.command = Some(command.clone());
        }
        if self.shell {
            config.server.use_shell = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_command_is_positional() {
        let cli = Cli::try_parse_from(["salvo", "--log-level", "debug", "./target/release/server --port 8080"]).unwrap();
        assert_eq!(cli.server_command.as_deref(), Some("./target/release/server --port 8080"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(!cli.shell);

        let mut config = SalvoConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.server.command.as_deref(), Some("./target/release/server --port 8080"));
        assert!(!config.server.use_shell);
    }

    #[test]
    fn test_server_command_required_for_runs() {
        assert!(Cli::try_parse_from(["salvo"]).is_err());
        assert!(Cli::try_parse_from(["salvo", "--dump-config"]).is_ok());

        let cli = Cli::try_parse_from(["salvo", "--show-sequence", "10"]).unwrap();
        assert_eq!(cli.show_sequence, Some(10));
    }

    #[test]
    fn test_shell_flag_sets_use_shell() {
        let cli = Cli::try_parse_from(["salvo", "--shell", "cd srv && ./run"]).unwrap();
        let mut config = SalvoConfig::default();
        cli.apply(&mut config);
        assert!(config.server.use_shell);
    }
}
