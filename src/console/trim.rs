// src/console/trim.rs

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::ConsoleBuffer;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Spawn the periodic trim task.
///
/// The ring already enforces its bound on every append; this loop re-applies
/// it on a fixed cadence anyway and warns if it ever finds work to do.
/// The task runs until aborted (or the runtime shuts down). A zero period is
/// raised to 1ms.
pub fn spawn_trim_task(buffer: ConsoleBuffer, every: Duration) -> JoinHandle<()> {
    let every = every.max(MIN_PERIOD);
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(interval = ?every, "console trim task started");

        loop {
            ticker.tick().await;
            let evicted = buffer.trim();
            if evicted > 0 {
                warn!(evicted, "console buffer was over capacity; trimmed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trim_task_keeps_buffer_bounded() {
        let buf = ConsoleBuffer::new(10);
        let handle = spawn_trim_task(buf.clone(), Duration::from_millis(5));

        for _ in 0..5 {
            buf.append("0123456789abc");
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(buf.len() <= 10);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn zero_period_does_not_kill_the_task() {
        let buf = ConsoleBuffer::new(4);
        let handle = spawn_trim_task(buf.clone(), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());

        handle.abort();
    }
}
