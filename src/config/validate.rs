// src/config/validate.rs

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, ConsoleSettings, RawConfigFile, StatusTarget};
use crate::errors::{GamectlError, Result};
use crate::supervisor::{LaunchSpec, SupervisorSettings};

static MEMORY_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[KMGkmg]?$").expect("memory size regex is valid"));

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = GamectlError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;

        let server = &raw.server;
        let launch = build_launch_spec(&raw);
        let plugins_dir = raw
            .plugins
            .dir
            .clone()
            .unwrap_or_else(|| server.dir.join("plugins"));

        Ok(ConfigFile {
            launch,
            supervisor: SupervisorSettings {
                stop_command: server.stop_command.trim().to_string(),
                write_timeout: duration_field("server.write_timeout", &server.write_timeout)?,
                ..SupervisorSettings::default()
            },
            shutdown_timeout: duration_field("server.shutdown_timeout", &server.shutdown_timeout)?,
            autostart: server.autostart,
            console: ConsoleSettings {
                capacity: raw.console.capacity,
                trim_interval: duration_field("console.trim_interval", &raw.console.trim_interval)?,
            },
            http: raw.http.clone(),
            status: StatusTarget {
                host: raw.status.host.clone(),
                port: raw.status.port,
                timeout: duration_field("status.timeout", &raw.status.timeout)?,
            },
            telemetry_timeout: duration_field("telemetry.timeout", &raw.telemetry.timeout)?,
            plugins_dir,
        })
    }
}

/// Check semantic invariants that serde can't express.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_server(cfg)?;
    validate_console(cfg)?;
    validate_status(cfg)?;
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    let server = &cfg.server;

    if server.dir.as_os_str().is_empty() {
        return Err(config_error("[server].dir must not be empty"));
    }
    if server.jar.trim().is_empty() {
        return Err(config_error("[server].jar must not be empty"));
    }
    if server.java.trim().is_empty() {
        return Err(config_error("[server].java must not be empty"));
    }
    if !MEMORY_SIZE.is_match(server.memory.trim()) {
        return Err(GamectlError::ConfigError(format!(
            "[server].memory must look like \"8G\" or \"512M\" (got {:?})",
            server.memory
        )));
    }
    if server.stop_command.trim().is_empty() {
        return Err(config_error("[server].stop_command must not be empty"));
    }
    if server.stop_command.contains(['\n', '\r']) {
        return Err(config_error("[server].stop_command must be a single line"));
    }
    Ok(())
}

fn validate_console(cfg: &RawConfigFile) -> Result<()> {
    if cfg.console.capacity == 0 {
        return Err(config_error("[console].capacity must be >= 1 (got 0)"));
    }
    // Unparseable values are reported when the duration is resolved.
    if let Ok(every) = parse_duration(&cfg.console.trim_interval) {
        if every.is_zero() {
            return Err(GamectlError::ConfigError(format!(
                "console.trim_interval must be greater than zero (got {:?})",
                cfg.console.trim_interval
            )));
        }
    }
    Ok(())
}

fn validate_status(cfg: &RawConfigFile) -> Result<()> {
    if cfg.status.host.trim().is_empty() {
        return Err(config_error("[status].host must not be empty"));
    }
    Ok(())
}

fn build_launch_spec(cfg: &RawConfigFile) -> LaunchSpec {
    let server = &cfg.server;
    let memory = server.memory.trim();

    let mut args = vec![format!("-Xms{memory}"), format!("-Xmx{memory}")];
    args.extend(server.jvm_flags.iter().cloned());
    args.push("-jar".to_string());
    args.push(server.jar.clone());
    args.extend(server.args.iter().cloned());

    LaunchSpec {
        program: server.java.clone(),
        args,
        working_dir: server.dir.clone(),
    }
}

fn duration_field(name: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| GamectlError::ConfigError(format!("{name}: {e}")))
}

fn config_error(msg: &str) -> GamectlError {
    GamectlError::ConfigError(msg.to_string())
}
