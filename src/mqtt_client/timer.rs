//! The single-shot timer collaborator.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one scheduled wakeup. A fired or cancelled handle is never
/// reused within an engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(pub u64);

/// Scheduler for the engine's keep-alive wakeups. At most one wakeup is
/// pending at a time.
pub trait TimerDriver {
    fn schedule_once(&mut self, delay_ms: u64) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Timer driver backed by a spawned `tokio::time::sleep` task per wakeup.
/// Fired handles are delivered through the channel given at construction and
/// fed back into the engine as `TimerFired` stimuli.
pub struct TokioTimer {
    tx: mpsc::UnboundedSender<TimerHandle>,
    next_id: u64,
    active: Option<(TimerHandle, JoinHandle<()>)>,
}

impl TokioTimer {
    pub fn new(tx: mpsc::UnboundedSender<TimerHandle>) -> Self {
        Self {
            tx,
            next_id: 0,
            active: None,
        }
    }
}

impl TimerDriver for TokioTimer {
    fn schedule_once(&mut self, delay_ms: u64) -> TimerHandle {
        if let Some((_, task)) = self.active.take() {
            task.abort();
        }
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let _ = tx.send(handle);
        });
        self.active = Some((handle, task));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some((active, task)) = self.active.take() {
            if active == handle {
                task.abort();
            } else {
                self.active = Some((active, task));
            }
        }
    }
}
