use std::time::Duration;

use chrono::Local;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::api::{AssignmentSource, BackendError};
use crate::config::Config;
use crate::controller::{Controller, Effect, Notification, ViewMode};
use crate::models::Snapshot;
use crate::poll::PollTimer;
use crate::view::Node;

/// A render tree ready to mount, with the fade duration to mount it with.
#[derive(Debug, Clone)]
pub struct Frame {
    pub tree: Node,
    pub animation: Duration,
}

struct FetchResult {
    seq: u64,
    result: Result<Snapshot, BackendError>,
}

/// The mounted widget: controller, fetch source and poll timer.
///
/// Lives on the host's loop. Fetches run as spawned tasks and report back
/// through a channel that [`Widget::poll`] drains without blocking.
pub struct Widget<S: AssignmentSource> {
    config: Config,
    source: S,
    controller: Controller,
    timer: PollTimer,
    started: bool,
    fetch_tx: mpsc::UnboundedSender<FetchResult>,
    fetch_rx: mpsc::UnboundedReceiver<FetchResult>,
    pending_render: Option<Duration>,
}

impl<S: AssignmentSource> Widget<S> {
    pub fn new(config: Config, source: S) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        Self {
            controller: Controller::new(&config),
            config,
            source,
            timer: PollTimer::new(),
            started: false,
            fetch_tx,
            fetch_rx,
            pending_render: None,
        }
    }

    pub fn mode(&self) -> &ViewMode {
        self.controller.mode()
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.controller.snapshot()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.controller.last_error()
    }

    pub fn is_polling(&self) -> bool {
        self.timer.is_running()
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Warm the cache with one fetch and begin polling.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        tracing::info!(backend = %self.config.backend_url, "starting widget");
        self.started = true;
        let fetch = self.controller.refresh();
        self.execute(vec![fetch]);
        self.timer.start(self.config.poll_interval());
    }

    pub fn suspend(&mut self) {
        tracing::info!("suspending widget");
        self.timer.stop();
    }

    pub fn resume(&mut self) {
        if !self.started {
            return;
        }
        tracing::info!("resuming widget");
        self.timer.start(self.config.poll_interval());
    }

    // ── Events ──────────────────────────────────────────────────────────

    pub fn notify(&mut self, notification: Notification) {
        let effects = self.controller.handle(notification);
        self.execute(effects);
    }

    /// Decode and deliver a notification from the host bus. Returns `false`
    /// for names this widget does not handle.
    pub fn notify_bus(&mut self, name: &str, payload: &Value) -> bool {
        match Notification::parse(name, payload) {
            Some(notification) => {
                self.notify(notification);
                true
            }
            None => {
                tracing::trace!(name, "ignoring foreign notification");
                false
            }
        }
    }

    /// Ask for a refresh of the current view outside the poll schedule.
    pub fn refresh_now(&mut self) {
        let fetch = self.controller.refresh();
        self.execute(vec![fetch]);
    }

    /// Drain ticks and finished fetches without waiting. Returns a frame when
    /// something asked for a re-render.
    pub fn poll(&mut self) -> Option<Frame> {
        for _ in 0..self.timer.drain() {
            let effects = self.controller.tick();
            self.execute(effects);
        }

        while let Ok(FetchResult { seq, result }) = self.fetch_rx.try_recv() {
            let effects = self.controller.apply_fetch(seq, result);
            self.execute(effects);
        }

        let animation = self.pending_render.take()?;
        Some(Frame {
            tree: self.current_tree(),
            animation,
        })
    }

    pub fn current_tree(&self) -> Node {
        self.controller.view(&self.config, Local::now())
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch { seq, endpoint } => {
                    tracing::debug!(seq, ?endpoint, "fetching assignments");
                    let fut = self.source.fetch(endpoint);
                    let tx = self.fetch_tx.clone();
                    tokio::spawn(async move {
                        let result = fut.await;
                        let _ = tx.send(FetchResult { seq, result });
                    });
                }
                Effect::Render { animation } => {
                    self.pending_render = Some(animation);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Endpoint;
    use crate::models::Assignment;
    use std::future::Future;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::time;

    const PERIOD: Duration = Duration::from_secs(60);

    #[derive(Clone, Default)]
    struct FakeSource {
        calls: Arc<Mutex<Vec<Endpoint>>>,
        fail: bool,
    }

    impl FakeSource {
        fn calls(&self) -> Vec<Endpoint> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AssignmentSource for FakeSource {
        fn fetch(
            &self,
            endpoint: Endpoint,
        ) -> impl Future<Output = Result<Snapshot, BackendError>> + Send + 'static {
            self.calls.lock().unwrap().push(endpoint);
            let fail = self.fail;
            async move {
                if fail {
                    return Err(BackendError::Unsuccessful {
                        message: "success=false".into(),
                    });
                }
                Ok(Snapshot {
                    assignments: vec![Assignment {
                        title: format!("{endpoint:?}"),
                        due_date: Some("2099-01-01".into()),
                        ..Default::default()
                    }],
                    ..Default::default()
                })
            }
        }
    }

    fn config() -> Config {
        Config {
            update_interval: PERIOD.as_millis() as u64,
            ..Config::default()
        }
    }

    async fn settle() {
        time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fetched_before_start() {
        let source = FakeSource::default();
        let mut widget = Widget::new(config(), source.clone());
        time::sleep(PERIOD * 3).await;
        assert!(widget.poll().is_none());
        assert!(source.calls().is_empty());

        widget.start();
        assert_eq!(source.calls(), vec![Endpoint::All]);
        assert!(widget.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_week_fetches_and_renders() {
        let source = FakeSource::default();
        let mut widget = Widget::new(config(), source.clone());
        widget.start();
        settle().await;
        widget.poll();

        widget.notify(Notification::ShowWeek);
        assert_eq!(widget.mode(), &ViewMode::Week);
        assert_eq!(source.calls(), vec![Endpoint::All, Endpoint::Week]);

        settle().await;
        let frame = widget.poll().expect("frame after show");
        assert_eq!(frame.animation, Duration::from_millis(500));
        let root = frame.tree.as_element().unwrap();
        assert!(root.find("week-view").is_some());
        assert_eq!(widget.snapshot().assignments[0].title, "Week");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_ticks_do_not_fetch() {
        let source = FakeSource::default();
        let mut widget = Widget::new(config(), source.clone());
        widget.start();
        time::sleep(PERIOD * 2 + Duration::from_secs(1)).await;
        widget.poll();
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_suspend_and_resume() {
        let source = FakeSource::default();
        let mut widget = Widget::new(config(), source.clone());
        widget.start();
        widget.notify(Notification::ShowWeek);
        settle().await;
        widget.poll();
        let baseline = source.calls().len();

        widget.suspend();
        time::sleep(PERIOD + Duration::from_secs(1)).await;
        widget.poll();
        assert_eq!(source.calls().len(), baseline);

        widget.resume();
        time::sleep(PERIOD + Duration::from_secs(1)).await;
        widget.poll();
        assert_eq!(source.calls().len(), baseline + 1);
        assert_eq!(source.calls().last(), Some(&Endpoint::Week));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_rendering_stale_data() {
        let source = FakeSource {
            fail: true,
            ..FakeSource::default()
        };
        let mut widget = Widget::new(config(), source.clone());
        widget.start();
        widget.notify(Notification::ShowWeek);
        settle().await;
        // The notification itself still re-renders, just with an empty cache.
        let frame = widget.poll().expect("render from notification");
        let root = frame.tree.as_element().unwrap();
        assert!(root.find("empty-state").is_some());
        assert!(widget.last_error().is_some());
        assert_eq!(widget.mode(), &ViewMode::Week);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bus_notifications_by_name() {
        let source = FakeSource::default();
        let mut widget = Widget::new(config(), source.clone());
        widget.start();

        assert!(widget.notify_bus("UNI_SHOW_MODULE", &json!({"params": {"id": "sec-2"}})));
        assert_eq!(
            widget.mode(),
            &ViewMode::Module {
                selected: Some("sec-2".into())
            }
        );
        assert_eq!(source.calls().last(), Some(&Endpoint::All));

        assert!(widget.notify_bus("UNI_SHOW_WEEK", &Value::Null));
        assert_eq!(widget.mode(), &ViewMode::Week);
        assert_eq!(source.calls().last(), Some(&Endpoint::Week));

        assert!(widget.notify_bus("HIDE_MODULES", &Value::Null));
        assert_eq!(widget.mode(), &ViewMode::Hidden);
        let calls = source.calls().len();

        assert!(!widget.notify_bus("CALENDAR_EVENTS", &json!({"events": []})));
        assert_eq!(widget.mode(), &ViewMode::Hidden);
        assert_eq!(source.calls().len(), calls);
    }
}
