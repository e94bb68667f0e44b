//! Session timer engine.
//!
//! The engine is a caller-clocked state machine: every command carries the
//! current time in milliseconds and the engine never reads a clock itself.
//! The core is the pure [`transition`] function; [`TimerEngine`] is a thin
//! wrapper that holds the current [`EngineState`] and reports [`Event`]s.
//!
//! ## State Transitions
//!
//! ```text
//! Running <-> Paused
//! (Running | Paused) -> Completed      (plan exhausted, skip past end, end early)
//! Completed -> Running                 (back)
//! ```
//!
//! Elapsed time in the active segment is always
//! `now - segment_started_at_ms - pause_accumulated_ms`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.start(build_segments(&protocol)?, now_ms);
//! // On every tick and when the app returns to the foreground:
//! engine.sync(now_ms);
//! ```

use serde::{Deserialize, Serialize};

use super::segment::Segment;
use crate::events::{self, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Running,
    Paused,
    Completed,
}

/// Why a session reached [`Mode::Completed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The plan ran out, by the clock or by skipping/finishing the last step.
    Finished,
    /// The user stopped the session.
    EndedEarly,
}

/// Complete observable state of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub segments: Vec<Segment>,
    /// Index into `segments`; equals `segments.len()` only once the clock
    /// has run past the last segment.
    pub active_index: usize,
    pub mode: Mode,
    /// When the active segment's clock began. `None` on manual segments.
    pub segment_started_at_ms: Option<i64>,
    pub paused_at_ms: Option<i64>,
    /// Paused time accrued since the active segment started.
    pub pause_accumulated_ms: i64,
    pub started_at_ms: i64,
    pub ended_at_ms: Option<i64>,
    pub end_reason: Option<EndReason>,
}

/// Everything a host can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { segments: Vec<Segment>, now_ms: i64 },
    Pause { now_ms: i64 },
    Resume { now_ms: i64 },
    Sync { now_ms: i64 },
    Skip { now_ms: i64 },
    Back { now_ms: i64 },
    CompleteManualStep { now_ms: i64 },
    EndEarly { now_ms: i64 },
}

impl Command {
    pub fn now_ms(&self) -> i64 {
        match *self {
            Command::Start { now_ms, .. }
            | Command::Pause { now_ms }
            | Command::Resume { now_ms }
            | Command::Sync { now_ms }
            | Command::Skip { now_ms }
            | Command::Back { now_ms }
            | Command::CompleteManualStep { now_ms }
            | Command::EndEarly { now_ms } => now_ms,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Pause { .. } => "pause",
            Command::Resume { .. } => "resume",
            Command::Sync { .. } => "sync",
            Command::Skip { .. } => "skip",
            Command::Back { .. } => "back",
            Command::CompleteManualStep { .. } => "complete_manual_step",
            Command::EndEarly { .. } => "end_early",
        }
    }
}

impl Default for EngineState {
    /// The state before any session has started.
    fn default() -> Self {
        Self {
            segments: Vec::new(),
            active_index: 0,
            mode: Mode::Paused,
            segment_started_at_ms: None,
            paused_at_ms: None,
            pause_accumulated_ms: 0,
            started_at_ms: 0,
            ended_at_ms: None,
            end_reason: None,
        }
    }
}

/// Apply `command` to `state`, returning the next state.
///
/// Commands that don't apply in the current mode return an unchanged copy.
pub fn transition(state: &EngineState, command: Command) -> EngineState {
    let mut next = state.clone();
    match command {
        Command::Start { segments, now_ms } => next.start(segments, now_ms),
        Command::Pause { now_ms } => next.pause(now_ms),
        Command::Resume { now_ms } => next.resume(now_ms),
        Command::Sync { now_ms } => next.auto_advance(now_ms),
        Command::Skip { now_ms } => next.skip(now_ms),
        Command::Back { now_ms } => next.back(now_ms),
        Command::CompleteManualStep { now_ms } => {
            if next.mode != Mode::Completed && next.active_segment().is_some_and(Segment::is_manual)
            {
                next.advance_segment(now_ms);
            }
        }
        Command::EndEarly { now_ms } => {
            if next.mode != Mode::Completed {
                next.complete(now_ms, EndReason::EndedEarly);
            }
        }
    }
    next
}

impl EngineState {
    // ── Queries ──────────────────────────────────────────────────────

    pub fn active_segment(&self) -> Option<&Segment> {
        self.segments.get(self.active_index)
    }

    pub fn is_finished(&self) -> bool {
        self.mode == Mode::Completed
    }

    /// Has a session been started on this state?
    pub fn is_started(&self) -> bool {
        !self.segments.is_empty() || self.mode != Mode::Paused
    }

    /// Time spent in the active segment. May be negative if `now_ms` is
    /// earlier than the segment start.
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        match self.segment_started_at_ms {
            Some(started) => now_ms
                .saturating_sub(started)
                .saturating_sub(self.pause_accumulated_ms),
            None => 0,
        }
    }

    /// Whole seconds left in the active segment, rounded up.
    ///
    /// Zero when there is no active segment or it is a manual one.
    pub fn remaining_seconds(&self, now_ms: i64) -> u64 {
        let Some(duration_ms) = self.active_segment().and_then(Segment::duration_ms) else {
            return 0;
        };
        let remaining_ms = duration_ms.saturating_sub(self.elapsed_ms(now_ms));
        if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms as u64).div_ceil(1000)
        }
    }

    /// 0.0 .. 100.0 progress through the timed part of the plan.
    pub fn session_progress_pct(&self, now_ms: i64) -> f64 {
        let total_ms: i64 = self.segments.iter().filter_map(Segment::duration_ms).sum();
        if total_ms == 0 {
            return 0.0;
        }
        if self.end_reason == Some(EndReason::Finished) {
            return 100.0;
        }
        let done_ms: i64 = self
            .segments
            .iter()
            .take(self.active_index)
            .filter_map(Segment::duration_ms)
            .sum();
        let current_ms = self
            .active_segment()
            .and_then(Segment::duration_ms)
            .map(|d| self.elapsed_ms(now_ms).clamp(0, d))
            .unwrap_or(0);
        ((done_ms + current_ms) as f64 / total_ms as f64 * 100.0).min(100.0)
    }

    /// Latest timestamp recorded anywhere in the state.
    pub fn latest_timestamp_ms(&self) -> i64 {
        [
            Some(self.started_at_ms),
            self.segment_started_at_ms,
            self.paused_at_ms,
            self.ended_at_ms,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(self.started_at_ms)
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn start(&mut self, segments: Vec<Segment>, now_ms: i64) {
        *self = EngineState {
            segments,
            active_index: 0,
            mode: Mode::Running,
            segment_started_at_ms: Some(now_ms),
            paused_at_ms: None,
            pause_accumulated_ms: 0,
            started_at_ms: now_ms,
            ended_at_ms: None,
            end_reason: None,
        };
        if self.active_segment().is_some_and(Segment::is_manual) {
            self.segment_started_at_ms = None;
        }
        // A zero-length first segment is consumed right away.
        self.auto_advance(now_ms);
    }

    fn pause(&mut self, now_ms: i64) {
        if self.mode != Mode::Running {
            return;
        }
        self.mode = Mode::Paused;
        self.paused_at_ms = Some(now_ms);
    }

    fn resume(&mut self, now_ms: i64) {
        if self.mode != Mode::Paused {
            return;
        }
        if let Some(paused_at) = self.paused_at_ms.take() {
            self.pause_accumulated_ms = self
                .pause_accumulated_ms
                .saturating_add(now_ms.saturating_sub(paused_at));
        }
        self.mode = Mode::Running;
    }

    fn skip(&mut self, now_ms: i64) {
        if self.mode == Mode::Completed {
            return;
        }
        self.advance_segment(now_ms);
    }

    fn back(&mut self, now_ms: i64) {
        if self.active_index == 0 {
            return;
        }
        self.active_index -= 1;
        if self.mode == Mode::Completed {
            self.mode = Mode::Running;
            self.ended_at_ms = None;
            self.end_reason = None;
        }
        self.init_segment(now_ms);
    }

    /// Walk forward through every timed segment whose time is up.
    ///
    /// Finished segments are banked: the next segment starts exactly where
    /// the previous one ended, not at `now_ms`, so one late call lands on the
    /// same boundaries as many timely ones. Paused time is folded into the
    /// banked start so the accumulator can restart at zero.
    fn auto_advance(&mut self, now_ms: i64) {
        if self.mode != Mode::Running {
            return;
        }
        let Some(mut started) = self.segment_started_at_ms else {
            return;
        };

        while let Some(duration_ms) = self.active_segment().and_then(Segment::duration_ms) {
            let elapsed = now_ms
                .saturating_sub(started)
                .saturating_sub(self.pause_accumulated_ms);
            if elapsed < duration_ms {
                break;
            }

            started = started
                .saturating_add(self.pause_accumulated_ms)
                .saturating_add(duration_ms);
            self.pause_accumulated_ms = 0;
            self.segment_started_at_ms = Some(started);
            self.active_index += 1;

            if self.active_index >= self.segments.len() {
                self.complete(started, EndReason::Finished);
                return;
            }
            if self.active_segment().is_some_and(Segment::is_manual) {
                self.segment_started_at_ms = None;
                return;
            }
        }
    }

    fn advance_segment(&mut self, now_ms: i64) {
        if self.active_index + 1 < self.segments.len() {
            self.active_index += 1;
            self.init_segment(now_ms);
        } else {
            self.complete(now_ms, EndReason::Finished);
        }
    }

    fn init_segment(&mut self, now_ms: i64) {
        let timed = self.active_segment().is_some_and(Segment::is_timed);
        self.segment_started_at_ms = timed.then_some(now_ms);
        self.pause_accumulated_ms = 0;
        self.paused_at_ms = (self.mode == Mode::Paused).then_some(now_ms);
    }

    fn complete(&mut self, at_ms: i64, reason: EndReason) {
        self.mode = Mode::Completed;
        self.ended_at_ms = Some(at_ms);
        self.end_reason = Some(reason);
        self.paused_at_ms = None;
    }
}

/// Stateful wrapper around [`transition`].
///
/// Owns exactly one session's state; starting a new session replaces it.
#[derive(Debug, Clone, Default)]
pub struct TimerEngine {
    state: EngineState,
    last_now_ms: Option<i64>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously captured state.
    pub fn with_state(state: EngineState) -> Self {
        let last_now_ms = state.is_started().then(|| state.latest_timestamp_ms());
        Self { state, last_now_ms }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Snapshot of the current state.
    pub fn state(&self) -> EngineState {
        self.state.clone()
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn active_index(&self) -> usize {
        self.state.active_index
    }

    pub fn active_segment(&self) -> Option<&Segment> {
        self.state.active_segment()
    }

    pub fn remaining_seconds(&self, now_ms: i64) -> u64 {
        self.state.remaining_seconds(now_ms)
    }

    pub fn session_progress_pct(&self, now_ms: i64) -> f64 {
        self.state.session_progress_pct(now_ms)
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply one command and return what changed.
    pub fn dispatch(&mut self, command: Command) -> Vec<Event> {
        let now_ms = command.now_ms();
        let is_start = matches!(command, Command::Start { .. });
        match self.last_now_ms {
            Some(last) if !is_start && now_ms < last => {
                tracing::warn!(
                    command = command.name(),
                    now_ms,
                    last_now_ms = last,
                    "timestamp went backwards; elapsed time may be negative"
                );
            }
            _ => {}
        }
        self.last_now_ms = match self.last_now_ms {
            Some(last) if !is_start => Some(last.max(now_ms)),
            _ => Some(now_ms),
        };

        let name = command.name();
        let next = transition(&self.state, command);
        let events = if is_start {
            events::started(&self.state, &next, now_ms)
        } else {
            events::diff(&self.state, &next, now_ms)
        };
        if events.is_empty() {
            tracing::trace!(command = name, "no-op command");
        }
        for event in &events {
            tracing::debug!(command = name, ?event, "engine event");
        }
        self.state = next;
        events
    }

    pub fn start(&mut self, segments: Vec<Segment>, now_ms: i64) -> Vec<Event> {
        self.dispatch(Command::Start { segments, now_ms })
    }

    pub fn pause(&mut self, now_ms: i64) -> Vec<Event> {
        self.dispatch(Command::Pause { now_ms })
    }

    pub fn resume(&mut self, now_ms: i64) -> Vec<Event> {
        self.dispatch(Command::Resume { now_ms })
    }

    /// Catch up with the clock. Call on every tick and on return from background.
    pub fn sync(&mut self, now_ms: i64) -> Vec<Event> {
        self.dispatch(Command::Sync { now_ms })
    }

    pub fn skip(&mut self, now_ms: i64) -> Vec<Event> {
        self.dispatch(Command::Skip { now_ms })
    }

    pub fn back(&mut self, now_ms: i64) -> Vec<Event> {
        self.dispatch(Command::Back { now_ms })
    }

    pub fn complete_manual_step(&mut self, now_ms: i64) -> Vec<Event> {
        self.dispatch(Command::CompleteManualStep { now_ms })
    }

    pub fn end_early(&mut self, now_ms: i64) -> Vec<Event> {
        self.dispatch(Command::EndEarly { now_ms })
    }
}
