//! Session runner: the host side of the timer engine.
//!
//! The engine never reads a clock; the runner does. It stamps every user
//! action with the current time, syncs after each one, and turns the engine
//! state into a [`RunnerView`] a renderer can draw directly.
//!
//! [`run_ticking`] drives a runner from an async task: a fixed-cadence tick
//! plus a channel of user actions, serialized through one `select!` loop.

use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::config::{Config, DisplayConfig};
use crate::display::{self, SegmentTone};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::protocol::Protocol;
use crate::session::{
    build_segments, Command, EngineState, Mode, Segment, SessionSummary, TimerEngine,
};

/// Source of "now" in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock, UTC epoch milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<F> Clock for F
where
    F: Fn() -> i64,
{
    fn now_ms(&self) -> i64 {
        self()
    }
}

/// User-facing actions; the runner supplies the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Pause,
    Resume,
    /// Pause when running, resume when paused.
    Toggle,
    Skip,
    Back,
    Done,
    EndEarly,
    Sync,
}

impl Action {
    fn into_command(self, mode: Mode, now_ms: i64) -> Command {
        match self {
            Action::Pause => Command::Pause { now_ms },
            Action::Resume => Command::Resume { now_ms },
            Action::Toggle if mode == Mode::Running => Command::Pause { now_ms },
            Action::Toggle => Command::Resume { now_ms },
            Action::Skip => Command::Skip { now_ms },
            Action::Back => Command::Back { now_ms },
            Action::Done => Command::CompleteManualStep { now_ms },
            Action::EndEarly => Command::EndEarly { now_ms },
            Action::Sync => Command::Sync { now_ms },
        }
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Ok(Action::Pause),
            "r" | "resume" => Ok(Action::Resume),
            "t" | "toggle" | "" => Ok(Action::Toggle),
            "s" | "skip" | "next" => Ok(Action::Skip),
            "b" | "back" | "prev" => Ok(Action::Back),
            "d" | "done" => Ok(Action::Done),
            "q" | "end" | "end_early" => Ok(Action::EndEarly),
            "sync" => Ok(Action::Sync),
            other => Err(ValidationError::InvalidValue {
                field: "action".into(),
                message: format!("unknown action '{other}'"),
            }),
        }
    }
}

/// Everything a renderer needs after a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerView {
    pub session_id: Option<Uuid>,
    pub now_ms: i64,
    pub state: EngineState,
    pub remaining_sec: u64,
    pub active_segment: Option<Segment>,
    pub label: Option<String>,
    pub primary_text: Option<String>,
    pub caption: Option<String>,
    pub tone: Option<SegmentTone>,
    pub progress_pct: f64,
    pub events: Vec<Event>,
}

impl RunnerView {
    /// One line of text for terminal hosts.
    pub fn status_line(&self, display: &DisplayConfig) -> String {
        if self.state.is_finished() {
            return "Session finished".to_string();
        }
        let (Some(label), Some(primary)) = (&self.label, &self.primary_text) else {
            return "Loading...".to_string();
        };
        let mut line = format!("{label:<11} {primary:>8}");
        if display.show_caption {
            if let Some(caption) = self.caption.as_deref().filter(|c| !c.is_empty()) {
                line.push_str("  ");
                line.push_str(caption);
            }
        }
        if display.show_progress {
            line.push_str(&format!("  {:>3.0}%", self.progress_pct));
        }
        if self.state.mode == Mode::Paused {
            line.push_str(" [paused]");
        }
        line
    }
}

/// Owns one engine and the clock that feeds it.
#[derive(Debug)]
pub struct SessionRunner<C: Clock> {
    clock: C,
    engine: TimerEngine,
    session_id: Option<Uuid>,
    tick_interval: Duration,
    sync_on_foreground: bool,
}

impl<C: Clock> SessionRunner<C> {
    pub fn new(clock: C, config: &Config) -> Self {
        Self {
            clock,
            engine: TimerEngine::new(),
            session_id: None,
            tick_interval: config.tick_interval(),
            sync_on_foreground: config.runner.sync_on_foreground,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn mode(&self) -> Mode {
        self.engine.mode()
    }

    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    /// Build the plan for `protocol` and start a fresh session on it.
    pub fn start(&mut self, protocol: &Protocol) -> Result<RunnerView> {
        let segments = build_segments(protocol)?;
        Ok(self.start_segments(segments))
    }

    pub fn start_segments(&mut self, segments: Vec<Segment>) -> RunnerView {
        let id = Uuid::new_v4();
        let now_ms = self.clock.now_ms();
        tracing::info!(session_id = %id, segments = segments.len(), "session started");
        self.session_id = Some(id);
        let events = self.engine.start(segments, now_ms);
        self.view_at(now_ms, events)
    }

    /// Apply a user action to the segment showing at this instant, then
    /// catch up with the clock.
    pub fn apply(&mut self, action: Action) -> RunnerView {
        let now_ms = self.clock.now_ms();
        let mut events = self.engine.sync(now_ms);
        let command = action.into_command(self.engine.mode(), now_ms);
        events.extend(self.engine.dispatch(command));
        events.extend(self.engine.sync(now_ms));
        if events
            .iter()
            .any(|e| matches!(e, Event::SessionCompleted { .. }))
        {
            tracing::info!(session_id = ?self.session_id, ?action, "session completed");
        }
        self.view_at(now_ms, events)
    }

    /// Periodic sync.
    pub fn tick(&mut self) -> RunnerView {
        let now_ms = self.clock.now_ms();
        let events = self.engine.sync(now_ms);
        self.view_at(now_ms, events)
    }

    /// The host came back from the background: absorb the gap in one sync.
    pub fn on_foreground(&mut self) -> RunnerView {
        let now_ms = self.clock.now_ms();
        if !self.sync_on_foreground {
            return self.view_at(now_ms, Vec::new());
        }
        let before = self.engine.active_index();
        let events = self.engine.sync(now_ms);
        tracing::info!(
            from = before,
            to = self.engine.active_index(),
            "foreground sync"
        );
        self.view_at(now_ms, events)
    }

    /// Current view without changing anything.
    pub fn view(&self) -> RunnerView {
        self.view_at(self.clock.now_ms(), Vec::new())
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        SessionSummary::from_state(&self.engine.state())
    }

    fn view_at(&self, now_ms: i64, events: Vec<Event>) -> RunnerView {
        let state = self.engine.state();
        let remaining_sec = state.remaining_seconds(now_ms);
        let active_segment = state.active_segment().copied();
        RunnerView {
            session_id: self.session_id,
            now_ms,
            remaining_sec,
            label: active_segment
                .as_ref()
                .map(|s| display::segment_label(s).to_string()),
            primary_text: active_segment
                .as_ref()
                .map(|s| display::primary_text(s, remaining_sec)),
            caption: active_segment.as_ref().map(display::segment_caption),
            tone: active_segment.as_ref().map(display::segment_tone),
            progress_pct: state.session_progress_pct(now_ms),
            active_segment,
            state,
            events,
        }
    }
}

/// Drive `runner` until the session completes or `actions` closes.
///
/// Ticks only sync while the session is running, so a paused display keeps
/// its last value. `on_view` sees every view produced, in order.
pub async fn run_ticking<C, F>(
    runner: &mut SessionRunner<C>,
    mut actions: mpsc::Receiver<Action>,
    mut on_view: F,
) -> RunnerView
where
    C: Clock,
    F: FnMut(&RunnerView),
{
    let mut interval = tokio::time::interval(runner.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let view = tokio::select! {
            _ = interval.tick() => {
                if runner.mode() != Mode::Running {
                    continue;
                }
                runner.tick()
            }
            action = actions.recv() => match action {
                Some(action) => runner.apply(action),
                None => {
                    tracing::debug!("action stream closed");
                    return runner.view();
                }
            },
        };
        on_view(&view);
        if view.state.is_finished() {
            return view;
        }
    }
}
