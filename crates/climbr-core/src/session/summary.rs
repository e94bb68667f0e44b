//! End-of-session summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::builder::PlanStats;
use super::engine::{EndReason, EngineState};
use super::segment::Segment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub reason: EndReason,
    pub started_at_ms: i64,
    pub ended_at_ms: i64,
    pub duration_ms: i64,
    /// Segments fully behind the athlete when the session ended.
    pub segments_done: usize,
    pub segments_total: usize,
    pub work_reps_done: usize,
    pub manual_sets_done: usize,
    pub planned: PlanStats,
}

impl SessionSummary {
    /// Summarize a completed session; `None` while it is still going.
    pub fn from_state(state: &EngineState) -> Option<Self> {
        if !state.is_finished() {
            return None;
        }
        let reason = state.end_reason.unwrap_or(EndReason::Finished);
        let ended_at_ms = state.ended_at_ms.unwrap_or(state.started_at_ms);

        // Ending on the last segment by skip/done leaves it as the active
        // index, but it was finished all the same.
        let segments_done = match reason {
            EndReason::Finished => state.segments.len(),
            EndReason::EndedEarly => state.active_index.min(state.segments.len()),
        };
        let done = &state.segments[..segments_done];

        Some(Self {
            reason,
            started_at_ms: state.started_at_ms,
            ended_at_ms,
            duration_ms: ended_at_ms.saturating_sub(state.started_at_ms).max(0),
            segments_done,
            segments_total: state.segments.len(),
            work_reps_done: done
                .iter()
                .filter(|s| matches!(s, Segment::Work { .. }))
                .count(),
            manual_sets_done: done.iter().filter(|s| s.is_manual()).count(),
            planned: PlanStats::of(&state.segments),
        })
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.started_at_ms)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.ended_at_ms)
    }

    pub fn headline(&self) -> &'static str {
        match self.reason {
            EndReason::Finished => "Session Complete!",
            EndReason::EndedEarly => "Session Ended",
        }
    }
}
