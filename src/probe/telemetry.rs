// src/probe/telemetry.rs

//! Host telemetry (CPU load, memory, disk, network throughput) via `sysinfo`.
//!
//! Sampling is blocking, so it runs on the blocking pool under a timeout.
//! Anything that fails or times out degrades to zeros; callers always get a
//! well-formed [`SystemStats`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use sysinfo::{Disks, Networks, System};
use tokio::task;
use tokio::time::timeout;
use tracing::warn;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// One telemetry sample, serialized with the field names the dashboard
/// expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    /// 1-minute load average over CPU count, as a floored percentage.
    pub cpu_load: u64,
    pub ram_used: f64,
    pub ram_total: f64,
    pub disk_used: f64,
    pub disk_total: f64,
    pub net_up: String,
    pub net_down: String,
    pub net_up_val: f64,
    pub net_down_val: f64,
}

impl SystemStats {
    /// Build a sample from raw readings. Sizes are in bytes, rates in
    /// bytes per second.
    pub fn from_readings(
        cpu_load: u64,
        ram: (u64, u64),
        disk: (u64, u64),
        net_rates: (f64, f64),
    ) -> Self {
        let up = round2(net_rates.0 / MIB);
        let down = round2(net_rates.1 / MIB);
        Self {
            cpu_load,
            ram_used: round2(ram.0 as f64 / GIB),
            ram_total: round2(ram.1 as f64 / GIB),
            disk_used: round2(disk.0 as f64 / GIB),
            disk_total: round2(disk.1 as f64 / GIB),
            net_up: format!("{up} MB/s"),
            net_down: format!("{down} MB/s"),
            net_up_val: up,
            net_down_val: down,
        }
    }

    pub fn zeroed() -> Self {
        Self::from_readings(0, (0, 0), (0, 0), (0.0, 0.0))
    }
}

impl Default for SystemStats {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Trait abstracting host telemetry collection.
pub trait MetricsProvider: Send + Sync + 'static {
    fn sample(&self) -> Pin<Box<dyn Future<Output = SystemStats> + Send + '_>>;
}

#[derive(Debug, Clone, Copy)]
struct NetCounters {
    at: Instant,
    sent: u64,
    received: u64,
}

/// `sysinfo`-backed provider. Network rates are computed against the
/// previous sample; the first sample reports zero throughput.
#[derive(Debug, Clone)]
pub struct SysinfoProvider {
    timeout: Duration,
    last_net: Arc<Mutex<Option<NetCounters>>>,
}

impl SysinfoProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_net: Arc::new(Mutex::new(None)),
        }
    }
}

impl MetricsProvider for SysinfoProvider {
    fn sample(&self) -> Pin<Box<dyn Future<Output = SystemStats> + Send + '_>> {
        Box::pin(async move {
            let last_net = Arc::clone(&self.last_net);
            let job = task::spawn_blocking(move || collect(&last_net));

            match timeout(self.timeout, job).await {
                Ok(Ok(stats)) => stats,
                Ok(Err(e)) => {
                    warn!(error = %e, "telemetry sampling task failed");
                    SystemStats::zeroed()
                }
                Err(_) => {
                    warn!(timeout = ?self.timeout, "telemetry sampling timed out");
                    SystemStats::zeroed()
                }
            }
        })
    }
}

fn collect(last_net: &Mutex<Option<NetCounters>>) -> SystemStats {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu_all();

    let cpus = sys.cpus().len().max(1);
    let load = System::load_average().one;
    let cpu_load = cpu_load_percent(load, cpus);

    let disks = Disks::new_with_refreshed_list();
    let (disk_used, disk_total) = disks.list().iter().fold((0u64, 0u64), |(used, total), d| {
        let t = d.total_space();
        (used + t.saturating_sub(d.available_space()), total + t)
    });

    let networks = Networks::new_with_refreshed_list();
    let (sent, received) = networks.list().iter().fold((0u64, 0u64), |(tx, rx), (_, data)| {
        (tx + data.total_transmitted(), rx + data.total_received())
    });
    let now = NetCounters {
        at: Instant::now(),
        sent,
        received,
    };

    let mut guard = last_net.lock().unwrap_or_else(|p| p.into_inner());
    let rates = guard.map(|prev| net_rates(prev, now)).unwrap_or((0.0, 0.0));
    *guard = Some(now);
    drop(guard);

    SystemStats::from_readings(
        cpu_load,
        (sys.used_memory(), sys.total_memory()),
        (disk_used, disk_total),
        rates,
    )
}

fn cpu_load_percent(load_one: f64, cpus: usize) -> u64 {
    if !load_one.is_finite() || load_one <= 0.0 {
        return 0;
    }
    (load_one / cpus as f64 * 100.0).floor() as u64
}

/// Bytes per second (up, down) between two counter snapshots. Counter
/// resets (interface went away) read as zero.
fn net_rates(prev: NetCounters, now: NetCounters) -> (f64, f64) {
    let secs = now.at.duration_since(prev.at).as_secs_f64();
    if secs <= 0.0 {
        return (0.0, 0.0);
    }
    let up = now.sent.saturating_sub(prev.sent) as f64 / secs;
    let down = now.received.saturating_sub(prev.received) as f64 / secs;
    (up, down)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
