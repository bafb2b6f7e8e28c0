use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// The single repeating refresh timer.
///
/// Ticks are delivered through a channel so the owner can drain them from its
/// own loop. At most one timer task exists at a time.
pub struct PollTimer {
    tx: mpsc::UnboundedSender<()>,
    rx: mpsc::UnboundedReceiver<()>,
    task: Option<JoinHandle<()>>,
}

impl PollTimer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx, task: None }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Start ticking every `period`, first tick one full period from now.
    /// A running timer is replaced.
    pub fn start(&mut self, period: Duration) {
        self.stop();
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop the timer. Ticks already queued are discarded.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        while self.rx.try_recv().is_ok() {}
    }

    /// Count of ticks delivered since the last call, without waiting.
    pub fn drain(&mut self) -> usize {
        let mut ticks = 0;
        while self.rx.try_recv().is_ok() {
            ticks += 1;
        }
        ticks
    }
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_full_period() {
        let mut timer = PollTimer::new();
        timer.start(PERIOD);
        time::sleep(PERIOD - Duration::from_secs(1)).await;
        assert_eq!(timer.drain(), 0);
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(timer.drain(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_then_restart() {
        let mut timer = PollTimer::new();
        timer.start(PERIOD);
        timer.stop();
        assert!(!timer.is_running());
        time::sleep(PERIOD * 3).await;
        assert_eq!(timer.drain(), 0);

        timer.start(PERIOD);
        time::sleep(PERIOD + Duration::from_secs(1)).await;
        assert_eq!(timer.drain(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_running_timer() {
        let mut timer = PollTimer::new();
        timer.start(PERIOD);
        timer.start(PERIOD);
        time::sleep(PERIOD + Duration::from_secs(1)).await;
        assert_eq!(timer.drain(), 1);
    }
}
