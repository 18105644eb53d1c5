// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::supervisor::{LaunchSpec, SupervisorSettings};

/// Configuration exactly as read from `Gamectl.toml`.
///
/// ```toml
/// [server]
/// dir = "/srv/minecraft"
/// jar = "spigot-1.21.10.jar"
/// memory = "8G"
/// jvm_flags = ["-XX:+UseG1GC"]
/// args = ["--nogui"]
///
/// [http]
/// port = 3000
///
/// [status]
/// host = "play.example.net"
/// port = 25565
/// ```
///
/// Only `server.dir` and `server.jar` are required.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub server: ServerSection,

    #[serde(default)]
    pub console: ConsoleSection,

    #[serde(default)]
    pub http: HttpSection,

    #[serde(default)]
    pub status: StatusSection,

    #[serde(default)]
    pub telemetry: TelemetrySection,

    #[serde(default)]
    pub plugins: PluginsSection,
}

/// `[server]`: how to launch and stop the managed process.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Working directory of the server (where the jar lives).
    pub dir: PathBuf,

    /// Server jar, relative to `dir` unless absolute.
    pub jar: String,

    /// Java executable.
    #[serde(default = "default_java")]
    pub java: String,

    /// Heap size used for both `-Xms` and `-Xmx` (e.g. `"8G"`).
    #[serde(default = "default_memory")]
    pub memory: String,

    /// Extra JVM flags placed before `-jar`.
    #[serde(default = "default_jvm_flags")]
    pub jvm_flags: Vec<String>,

    /// Arguments passed to the server after the jar.
    #[serde(default = "default_server_args")]
    pub args: Vec<String>,

    /// Line written to stdin for a graceful shutdown.
    #[serde(default = "default_stop_command")]
    pub stop_command: String,

    #[serde(default = "default_write_timeout")]
    pub write_timeout: String,

    /// How long the control service waits for the server to exit when it is
    /// itself shutting down.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: String,

    /// Start the server as soon as the control service is up.
    #[serde(default)]
    pub autostart: bool,
}

fn default_java() -> String {
    "java".to_string()
}

fn default_memory() -> String {
    "8G".to_string()
}

fn default_jvm_flags() -> Vec<String> {
    vec!["-XX:+UseG1GC".to_string()]
}

fn default_server_args() -> Vec<String> {
    vec!["--nogui".to_string()]
}

fn default_stop_command() -> String {
    "stop".to_string()
}

fn default_write_timeout() -> String {
    "5s".to_string()
}

fn default_shutdown_timeout() -> String {
    "60s".to_string()
}

/// `[console]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleSection {
    /// Maximum number of characters kept.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Cadence of the background trim.
    #[serde(default = "default_trim_interval")]
    pub trim_interval: String,
}

fn default_capacity() -> usize {
    crate::console::DEFAULT_CAPACITY
}

fn default_trim_interval() -> String {
    "1s".to_string()
}

impl Default for ConsoleSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            trim_interval: default_trim_interval(),
        }
    }
}

/// `[http]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3000
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_http_port(),
        }
    }
}

impl HttpSection {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// `[status]`: where the game server answers status pings.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusSection {
    #[serde(default = "default_status_host")]
    pub host: String,

    #[serde(default = "default_status_port")]
    pub port: u16,

    #[serde(default = "default_status_timeout")]
    pub timeout: String,
}

fn default_status_host() -> String {
    "127.0.0.1".to_string()
}

fn default_status_port() -> u16 {
    25565
}

fn default_status_timeout() -> String {
    "3s".to_string()
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            host: default_status_host(),
            port: default_status_port(),
            timeout: default_status_timeout(),
        }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySection {
    #[serde(default = "default_telemetry_timeout")]
    pub timeout: String,
}

fn default_telemetry_timeout() -> String {
    "2s".to_string()
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            timeout: default_telemetry_timeout(),
        }
    }
}

/// `[plugins]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PluginsSection {
    /// Defaults to `<server.dir>/plugins`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Validated, fully-resolved configuration.
///
/// Build it with `ConfigFile::try_from(raw)` (see `validate.rs`) or
/// [`load_and_validate`](super::load_and_validate).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub launch: LaunchSpec,
    pub supervisor: SupervisorSettings,
    pub shutdown_timeout: Duration,
    pub autostart: bool,
    pub console: ConsoleSettings,
    pub http: HttpSection,
    pub status: StatusTarget,
    pub telemetry_timeout: Duration,
    pub plugins_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub capacity: usize,
    pub trim_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTarget {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}
