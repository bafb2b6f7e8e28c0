pub mod event;
pub mod ui;

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::api::BackendClient;
use crate::controller::{ViewMode, HIDE_ALL_MODULES, SHOW_MODULE, SHOW_WEEK};
use crate::models::SyncSummary;
use crate::view::Node;
use crate::widget::{Frame, Widget};

// ─── Mounted frame ───────────────────────────────────────────────────────────

/// The tree currently on screen and when it was swapped in.
pub struct Mounted {
    pub tree: Node,
    pub mounted_at: Instant,
    pub animation: Duration,
}

impl Mounted {
    /// True while the new frame is still fading in.
    pub fn is_fading(&self) -> bool {
        self.mounted_at.elapsed() < self.animation
    }
}

// ─── App State ──────────────────────────────────────────────────────────────

pub struct App {
    pub widget: Widget<BackendClient>,
    pub client: BackendClient,
    pub running: bool,
    pub suspended: bool,
    pub mounted: Mounted,

    /// Index into the cached modules for the next `m` press.
    pub module_cursor: usize,

    pub status_message: String,
    pub sync_rx: Option<oneshot::Receiver<Result<SyncSummary, String>>>,

    // Incremented each frame; used to drive the sync spinner.
    pub frame_count: u64,
}

impl App {
    pub fn new(widget: Widget<BackendClient>, client: BackendClient) -> Self {
        let mounted = Mounted {
            tree: widget.current_tree(),
            mounted_at: Instant::now(),
            animation: Duration::ZERO,
        };
        Self {
            widget,
            client,
            running: true,
            suspended: false,
            mounted,
            module_cursor: 0,
            status_message: "Press w for this week, m for modules.".into(),
            sync_rx: None,
            frame_count: 0,
        }
    }

    pub fn mount(&mut self, frame: Frame) {
        self.mounted = Mounted {
            tree: frame.tree,
            mounted_at: Instant::now(),
            animation: frame.animation,
        };
    }

    /// Collect widget frames and background sync results. Call once per loop.
    pub fn tick(&mut self) {
        if let Some(frame) = self.widget.poll() {
            self.mount(frame);
        }
        self.poll_sync_result();
    }

    /// Deliver a bus notification by name, as a dashboard host would.
    pub fn broadcast(&mut self, name: &str, payload: Value) {
        if !self.widget.notify_bus(name, &payload) {
            self.status_message = format!("Ignored notification {name}");
        }
    }

    pub fn show_week(&mut self) {
        self.broadcast(SHOW_WEEK, Value::Null);
    }

    /// Show the module grid, selecting the next cached module on each press.
    pub fn show_next_module(&mut self) {
        let modules = &self.widget.snapshot().modules;
        let id = if modules.is_empty() {
            None
        } else {
            let idx = self.module_cursor % modules.len();
            self.module_cursor = idx + 1;
            modules[idx].id.clone()
        };
        self.broadcast(SHOW_MODULE, json!({ "params": { "id": id } }));
    }

    pub fn hide(&mut self) {
        self.broadcast(HIDE_ALL_MODULES, Value::Null);
    }

    pub fn toggle_suspend(&mut self) {
        if self.suspended {
            self.widget.resume();
            self.status_message = "Polling resumed.".into();
        } else {
            self.widget.suspend();
            self.status_message = "Polling suspended — press p to resume.".into();
        }
        self.suspended = !self.suspended;
    }

    pub fn refresh(&mut self) {
        if self.widget.mode().is_hidden() {
            self.status_message = "Nothing to refresh while hidden.".into();
            return;
        }
        self.widget.refresh_now();
    }

    /// Spawn a backend resync. No-ops if one is already running.
    pub fn start_sync(&mut self) {
        if self.sync_rx.is_some() {
            return;
        }
        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        self.sync_rx = Some(rx);
        self.status_message = "Backend sync running…".into();
        tokio::spawn(async move {
            let result = client.trigger_sync().await.map_err(|e| e.to_string());
            let _ = tx.send(result);
        });
    }

    /// Check the sync channel without blocking. Returns `true` when a result
    /// arrived.
    pub fn poll_sync_result(&mut self) -> bool {
        let result = match self.sync_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(r) => r,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.sync_rx = None;
                    return false;
                }
            },
        };
        self.sync_rx = None;
        match result {
            Ok(summary) => {
                tracing::info!(
                    assignments = summary.assignments_count,
                    modules = summary.modules_count,
                    "backend sync completed"
                );
                self.status_message = format!(
                    "Synced {} assignments in {} modules.",
                    summary.assignments_count, summary.modules_count
                );
                if !self.widget.mode().is_hidden() {
                    self.widget.refresh_now();
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "backend sync failed");
                self.status_message = format!("Sync failed: {e}");
            }
        }
        true
    }

    pub fn mode_label(&self) -> String {
        match self.widget.mode() {
            ViewMode::Module {
                selected: Some(id),
            } => format!("module {id}"),
            mode => mode.label().to_string(),
        }
    }
}
