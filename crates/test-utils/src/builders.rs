#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gamectl::config::{
    ConfigFile, ConsoleSection, HttpSection, PluginsSection, RawConfigFile, ServerSection,
    StatusSection, TelemetrySection,
};
use gamectl::console::ConsoleBuffer;
use gamectl::supervisor::{
    LaunchSpec, ProcessLauncher, SupervisorHandle, SupervisorSettings, spawn_supervisor,
};

/// Builder for `RawConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(dir: impl Into<PathBuf>, jar: &str) -> Self {
        Self {
            config: RawConfigFile {
                server: ServerSection {
                    dir: dir.into(),
                    jar: jar.to_string(),
                    java: "java".to_string(),
                    memory: "8G".to_string(),
                    jvm_flags: vec!["-XX:+UseG1GC".to_string()],
                    args: vec!["--nogui".to_string()],
                    stop_command: "stop".to_string(),
                    write_timeout: "5s".to_string(),
                    shutdown_timeout: "60s".to_string(),
                    autostart: false,
                },
                console: ConsoleSection::default(),
                http: HttpSection::default(),
                status: StatusSection::default(),
                telemetry: TelemetrySection::default(),
                plugins: PluginsSection::default(),
            },
        }
    }

    pub fn with_memory(mut self, memory: &str) -> Self {
        self.config.server.memory = memory.to_string();
        self
    }

    pub fn with_stop_command(mut self, cmd: &str) -> Self {
        self.config.server.stop_command = cmd.to_string();
        self
    }

    pub fn with_console_capacity(mut self, capacity: usize) -> Self {
        self.config.console.capacity = capacity;
        self
    }

    pub fn with_trim_interval(mut self, every: &str) -> Self {
        self.config.console.trim_interval = every.to_string();
        self
    }

    pub fn with_plugins_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.plugins.dir = Some(dir.into());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// A launch spec nobody actually runs (fake launchers ignore it).
pub fn fake_launch_spec() -> LaunchSpec {
    LaunchSpec {
        program: "java".to_string(),
        args: vec!["-jar".to_string(), "server.jar".to_string()],
        working_dir: PathBuf::from("."),
    }
}

/// Supervisor settings with short timeouts for tests.
pub fn fast_settings() -> SupervisorSettings {
    SupervisorSettings {
        stop_command: "stop".to_string(),
        write_timeout: Duration::from_secs(1),
        drain_grace: Duration::from_millis(500),
    }
}

/// Spawn a supervisor over `launcher` with a fresh console buffer.
pub fn spawn_test_supervisor(
    launcher: Arc<dyn ProcessLauncher>,
    capacity: usize,
) -> (SupervisorHandle, ConsoleBuffer) {
    let console = ConsoleBuffer::new(capacity);
    let handle = spawn_supervisor(launcher, fake_launch_spec(), console.clone(), fast_settings());
    (handle, console)
}
