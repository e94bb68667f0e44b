use serde::{Deserialize, Serialize};

use crate::session::{EndReason, EngineState, Mode, Segment};

/// Every observable change in a session produces an Event.
/// Hosts use them for cues (beeps, haptics) and logs; the state snapshot
/// stays the source of truth for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        segment_count: usize,
        at_ms: i64,
    },
    Paused {
        active_index: usize,
        at_ms: i64,
    },
    Resumed {
        active_index: usize,
        /// How long this pause lasted.
        paused_ms: i64,
        at_ms: i64,
    },
    /// The active segment moved, by the clock or by the user.
    SegmentChanged {
        from: usize,
        to: usize,
        segment: Segment,
        at_ms: i64,
    },
    SessionCompleted {
        active_index: usize,
        reason: EndReason,
        ended_at_ms: i64,
    },
    /// A completed session was brought back by stepping back.
    SessionReopened {
        active_index: usize,
        at_ms: i64,
    },
}

/// Events for a fresh start: the start itself plus whatever the initial
/// catch-up pass did.
pub(crate) fn started(before: &EngineState, after: &EngineState, now_ms: i64) -> Vec<Event> {
    let mut events = vec![Event::SessionStarted {
        segment_count: after.segments.len(),
        at_ms: now_ms,
    }];
    let baseline = EngineState {
        segments: after.segments.clone(),
        active_index: 0,
        mode: Mode::Running,
        ..before.clone()
    };
    events.extend(diff(&baseline, after, now_ms));
    events
}

/// Derive the events that explain the move from `before` to `after`.
pub(crate) fn diff(before: &EngineState, after: &EngineState, now_ms: i64) -> Vec<Event> {
    let mut events = Vec::new();

    if before.mode == Mode::Completed && after.mode != Mode::Completed {
        events.push(Event::SessionReopened {
            active_index: after.active_index,
            at_ms: now_ms,
        });
    }

    match (before.mode, after.mode) {
        (Mode::Running, Mode::Paused) => events.push(Event::Paused {
            active_index: after.active_index,
            at_ms: now_ms,
        }),
        (Mode::Paused, Mode::Running) => events.push(Event::Resumed {
            active_index: after.active_index,
            paused_ms: before.paused_at_ms.map_or(0, |p| now_ms.saturating_sub(p)),
            at_ms: now_ms,
        }),
        _ => {}
    }

    if before.active_index != after.active_index {
        if let Some(segment) = after.active_segment() {
            events.push(Event::SegmentChanged {
                from: before.active_index,
                to: after.active_index,
                segment: *segment,
                at_ms: after.segment_started_at_ms.unwrap_or(now_ms),
            });
        }
    }

    if before.mode != Mode::Completed && after.mode == Mode::Completed {
        events.push(Event::SessionCompleted {
            active_index: after.active_index,
            reason: after.end_reason.unwrap_or(EndReason::Finished),
            ended_at_ms: after.ended_at_ms.unwrap_or(now_ms),
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TimerEngine;

    fn plan() -> Vec<Segment> {
        vec![
            Segment::Countdown { duration_sec: 5 },
            Segment::Work {
                set_index: 0,
                rep_index: 0,
                duration_sec: 10,
            },
        ]
    }

    #[test]
    fn start_emits_session_started() {
        let mut engine = TimerEngine::new();
        let events = engine.start(plan(), 0);
        assert_eq!(
            events,
            vec![Event::SessionStarted {
                segment_count: 2,
                at_ms: 0
            }]
        );
    }

    #[test]
    fn catch_up_to_completion() {
        let mut engine = TimerEngine::new();
        engine.start(plan(), 0);
        let events = engine.sync(5_000);
        assert_eq!(
            events,
            vec![Event::SegmentChanged {
                from: 0,
                to: 1,
                segment: plan()[1],
                at_ms: 5_000,
            }]
        );

        let events = engine.sync(60_000);
        assert_eq!(
            events,
            vec![Event::SessionCompleted {
                active_index: 2,
                reason: EndReason::Finished,
                ended_at_ms: 15_000,
            }]
        );
    }

    #[test]
    fn pause_resume_and_reopen() {
        let mut engine = TimerEngine::new();
        engine.start(plan(), 0);
        assert_eq!(
            engine.pause(1_000),
            vec![Event::Paused {
                active_index: 0,
                at_ms: 1_000
            }]
        );
        assert_eq!(
            engine.resume(4_000),
            vec![Event::Resumed {
                active_index: 0,
                paused_ms: 3_000,
                at_ms: 4_000
            }]
        );

        engine.skip(5_000);
        let events = engine.end_early(6_000);
        assert_eq!(
            events,
            vec![Event::SessionCompleted {
                active_index: 1,
                reason: EndReason::EndedEarly,
                ended_at_ms: 6_000,
            }]
        );

        let events = engine.back(7_000);
        assert!(matches!(
            events.as_slice(),
            [
                Event::SessionReopened { active_index: 0, .. },
                Event::SegmentChanged { from: 1, to: 0, .. }
            ]
        ));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(Event::Paused {
            active_index: 3,
            at_ms: 10,
        })
        .unwrap();
        assert_eq!(json["type"], "paused");
        assert_eq!(json["active_index"], 3);
    }
}
