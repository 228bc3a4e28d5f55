use crate::config::settings::SettingsOverrides;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "msr")]
#[command(about = "Performs measurements on remote web pages")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "MSR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the registry file
    #[arg(long, global = true, env = "MSR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Maximum number of concurrent fetches during a refresh
    #[arg(long, global = true, env = "MSR_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "MSR_TIMEOUT_SECS")]
    pub timeout: Option<f64>,

    /// Print reports as JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Prints a semver string to STDOUT
    Version,
    /// Adds a URL to the registry
    Register { url: String },
    /// Refreshes the registry and prints the body size of every URL
    Measure,
    /// Refreshes the registry and prints the average load time per domain
    Race,
}

impl Cli {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            data_dir: self.data_dir.clone(),
            concurrency: self.concurrency,
            timeout_seconds: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register() {
        let cli = Cli::try_parse_from(["msr", "register", "https://example.com"]).unwrap();
        match cli.command {
            Command::Register { url } => assert_eq!(url, "https://example.com"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "msr",
            "race",
            "--concurrency",
            "4",
            "--timeout",
            "1.5",
            "--json",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::Race));
        assert!(cli.json);
        let overrides = cli.overrides();
        assert_eq!(overrides.concurrency, Some(4));
        assert_eq!(overrides.timeout_seconds, Some(1.5));
    }

    #[test]
    fn test_register_requires_url() {
        assert!(Cli::try_parse_from(["msr", "register"]).is_err());
    }
}
