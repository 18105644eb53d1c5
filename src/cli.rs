// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `gamectl`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gamectl",
    version,
    about = "Supervise a Minecraft server process and expose it over HTTP.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Gamectl.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GAMECTL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override `[http].port` from the config file.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Parse + validate, print the resolved launch command and endpoints,
    /// but don't start anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Start the game server as soon as the control plane is up.
    ///
    /// Equivalent to `[server].autostart = true`.
    #[arg(long)]
    pub autostart: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_flags_given() {
        let args = CliArgs::try_parse_from(["gamectl"]).unwrap();
        assert_eq!(args.config, PathBuf::from("Gamectl.toml"));
        assert!(args.port.is_none());
        assert!(!args.dry_run);
        assert!(!args.autostart);
    }

    #[test]
    fn parses_overrides() {
        let args = CliArgs::try_parse_from([
            "gamectl",
            "--config",
            "srv/Gamectl.toml",
            "--port",
            "8080",
            "--log-level",
            "debug",
            "--autostart",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("srv/Gamectl.toml"));
        assert_eq!(args.port, Some(8080));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.autostart);
    }
}
