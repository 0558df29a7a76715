use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// One countdown pulse, tagged with the attempt generation that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Repeating ticker owned by one active attempt.
pub struct Countdown;

impl Countdown {
    /// Spawn a ticker that sends a `Tick` every `period`, starting one period
    /// from now. The task ends when the receiver goes away or the handle is
    /// cancelled or dropped.
    #[must_use]
    pub fn spawn(ticks: mpsc::Sender<Tick>, generation: u64, period: Duration) -> CountdownHandle {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(Tick { generation }).await.is_err() {
                    break;
                }
            }
        });
        tracing::debug!(generation, ?period, "countdown started");
        CountdownHandle {
            task: Some(task),
            generation,
        }
    }
}

/// Cancels its countdown when dropped.
#[derive(Debug)]
pub struct CountdownHandle {
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl CountdownHandle {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the ticker. Ticks already queued are left for the receiver to
    /// discard by generation.
    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(generation = self.generation, "countdown cancelled");
        }
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
