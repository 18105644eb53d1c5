#![allow(dead_code)]

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use gamectl::api::AppState;
use gamectl::console::ConsoleBuffer;
use gamectl::errors::ProbeError;
use gamectl::probe::{MetricsProvider, PlayerSample, ServerStatus, StatusProbe, SystemStats};
use gamectl::supervisor::SupervisorHandle;

/// Status probe returning a canned answer (or failing when `None`).
pub struct FakeStatus {
    pub reply: Mutex<Option<ServerStatus>>,
}

impl FakeStatus {
    pub fn online() -> Self {
        Self {
            reply: Mutex::new(Some(ServerStatus {
                motd: "A Minecraft Server".to_string(),
                players_online: 1,
                players_max: 20,
                latency_ms: 3,
                version: "Paper 1.21.10".to_string(),
                player_sample: vec![PlayerSample {
                    name: "alex".to_string(),
                    id: "0000-1".to_string(),
                }],
            })),
        }
    }

    pub fn offline() -> Self {
        Self {
            reply: Mutex::new(None),
        }
    }
}

impl StatusProbe for FakeStatus {
    fn query(&self) -> Pin<Box<dyn Future<Output = Result<ServerStatus, ProbeError>> + Send + '_>> {
        let reply = self.reply.lock().unwrap().clone();
        Box::pin(async move {
            reply.ok_or_else(|| {
                ProbeError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))
            })
        })
    }
}

pub struct FakeMetrics;

impl MetricsProvider for FakeMetrics {
    fn sample(&self) -> Pin<Box<dyn Future<Output = SystemStats> + Send + '_>> {
        Box::pin(async {
            SystemStats::from_readings(
                12,
                (2 * 1024 * 1024 * 1024, 16 * 1024 * 1024 * 1024),
                (50 * 1024 * 1024 * 1024, 200 * 1024 * 1024 * 1024),
                (0.0, 512.0 * 1024.0),
            )
        })
    }
}

/// App state over a test supervisor with fake probes.
pub fn app_state(
    supervisor: SupervisorHandle,
    console: ConsoleBuffer,
    status: FakeStatus,
    plugins_dir: PathBuf,
) -> Arc<AppState> {
    let mut state = AppState::new(
        supervisor,
        console,
        Arc::new(status),
        Arc::new(FakeMetrics),
        plugins_dir,
    );
    state.java_home = Some("/usr/lib/jvm/java-21".to_string());
    Arc::new(state)
}
