use std::time::Duration;

use chrono::{DateTime, Local};
use serde_json::Value;

use crate::api::{BackendError, Endpoint};
use crate::config::Config;
use crate::models::Snapshot;
use crate::view::{self, Node};

// ─── View mode ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Hidden,
    Week,
    Module { selected: Option<String> },
}

impl ViewMode {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }

    /// Week polls the week endpoint; everything else uses the general one.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Week => Endpoint::Week,
            Self::Hidden | Self::Module { .. } => Endpoint::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Week => "week",
            Self::Module { .. } => "module",
        }
    }
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub const SHOW_WEEK: &str = "UNI_SHOW_WEEK";
pub const SHOW_MODULE: &str = "UNI_SHOW_MODULE";
pub const HIDE_ALL_MODULES: &str = "HIDE_ALL_MODULES";
pub const HIDE_MODULES: &str = "HIDE_MODULES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ShowWeek,
    ShowModule(Option<String>),
    HideAll,
}

impl Notification {
    /// Decode a bus notification. Unknown names are not ours and yield `None`.
    ///
    /// `UNI_SHOW_MODULE` carries `{"params": {"id": ...}}`; a missing, empty or
    /// non-scalar id becomes `None`.
    pub fn parse(name: &str, payload: &Value) -> Option<Self> {
        match name {
            SHOW_WEEK => Some(Self::ShowWeek),
            SHOW_MODULE => {
                let id = match payload.pointer("/params/id") {
                    Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                };
                Some(Self::ShowModule(id))
            }
            HIDE_ALL_MODULES | HIDE_MODULES => Some(Self::HideAll),
            _ => None,
        }
    }
}

// ─── Effects ─────────────────────────────────────────────────────────────────

/// Work the controller asks its owner to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch { seq: u64, endpoint: Endpoint },
    Render { animation: Duration },
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Single owner of the view mode and the cached collections.
///
/// Performs no I/O: every method returns the [`Effect`]s to execute, and fetch
/// results come back through [`Controller::apply_fetch`].
#[derive(Debug)]
pub struct Controller {
    mode: ViewMode,
    snapshot: Snapshot,
    animation: Duration,
    next_seq: u64,
    /// Sequence number of the newest fetch whose result was applied.
    applied_seq: u64,
    last_error: Option<String>,
}

impl Controller {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: ViewMode::Hidden,
            snapshot: Snapshot::default(),
            animation: config.animation(),
            next_seq: 0,
            applied_seq: 0,
            last_error: None,
        }
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn handle(&mut self, notification: Notification) -> Vec<Effect> {
        tracing::debug!(?notification, from = self.mode.label(), "notification received");
        match notification {
            Notification::ShowWeek => {
                self.mode = ViewMode::Week;
                vec![self.refresh(), self.render()]
            }
            Notification::ShowModule(selected) => {
                self.mode = ViewMode::Module { selected };
                vec![self.refresh(), self.render()]
            }
            Notification::HideAll => {
                self.mode = ViewMode::Hidden;
                vec![self.render()]
            }
        }
    }

    /// A poll tick refreshes the active view; hidden views are not polled.
    pub fn tick(&mut self) -> Vec<Effect> {
        if self.mode.is_hidden() {
            return Vec::new();
        }
        vec![self.refresh()]
    }

    /// Issue a fetch for the current mode's endpoint, regardless of visibility.
    pub fn refresh(&mut self) -> Effect {
        self.next_seq += 1;
        Effect::Fetch {
            seq: self.next_seq,
            endpoint: self.mode.endpoint(),
        }
    }

    pub fn render(&self) -> Effect {
        Effect::Render {
            animation: self.animation,
        }
    }

    /// Apply the outcome of fetch `seq`. Outcomes older than the newest applied
    /// one are dropped, errors included; failures leave the cache untouched.
    pub fn apply_fetch(&mut self, seq: u64, result: Result<Snapshot, BackendError>) -> Vec<Effect> {
        if seq <= self.applied_seq {
            tracing::debug!(seq, applied = self.applied_seq, "discarding stale fetch result");
            return Vec::new();
        }
        match result {
            Ok(snapshot) => {
                self.applied_seq = seq;
                self.snapshot = snapshot;
                self.last_error = None;
                vec![self.render()]
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "error loading assignments");
                self.last_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    pub fn view(&self, config: &Config, now: DateTime<Local>) -> Node {
        view::render(&self.mode, &self.snapshot, config, now)
    }
}
