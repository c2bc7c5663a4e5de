//! CLI argument definitions for netwarden-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Netwarden intrusion alert daemon.
///
/// Tails a Suricata EVE log, normalizes alert events, persists them,
/// and fans them out to search, cache, and live subscribers.
#[derive(Parser, Debug)]
#[command(name = "netwarden-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to netwarden.toml configuration file.
    #[arg(short, long, default_value = "/etc/netwarden/netwarden.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override the EVE log path to tail.
    #[arg(long)]
    pub eve_log: Option<PathBuf>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_path() {
        let cli = DaemonCli::parse_from(["netwarden-daemon"]);
        assert_eq!(
            cli.config,
            PathBuf::from("/etc/netwarden/netwarden.toml")
        );
        assert!(cli.log_level.is_none());
        assert!(!cli.validate);
    }

    #[test]
    fn overrides_are_parsed() {
        let cli = DaemonCli::parse_from([
            "netwarden-daemon",
            "--config",
            "/tmp/custom.toml",
            "--log-level",
            "debug",
            "--eve-log",
            "/tmp/eve.json",
            "--validate",
        ]);
        assert_eq!(cli.config, PathBuf::from("/tmp/custom.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.eve_log, Some(PathBuf::from("/tmp/eve.json")));
        assert!(cli.validate);
    }
}
