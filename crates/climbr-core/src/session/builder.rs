//! Segment builder.
//!
//! Expands a [`Protocol`] into the flat, ordered list of segments the timer
//! engine walks through. Every plan opens with a countdown and never ends on
//! a rest.

use serde::{Deserialize, Serialize};

use super::segment::{Segment, COUNTDOWN_SEC};
use crate::error::ValidationError;
use crate::protocol::{Protocol, TimedRepsSets, WeightsRepsSets};

/// Build the execution plan for `protocol`.
///
/// Fails if the protocol breaks its count invariants instead of returning an
/// empty or truncated plan.
pub fn build_segments(protocol: &Protocol) -> Result<Vec<Segment>, ValidationError> {
    protocol.validate()?;

    let mut segments = vec![Segment::Countdown {
        duration_sec: COUNTDOWN_SEC,
    }];

    match protocol {
        Protocol::TimedRepsSets(p) => push_timed(&mut segments, p),
        Protocol::WeightsRepsSets(p) => push_weights(&mut segments, p),
    }

    tracing::debug!(
        kind = %protocol.kind(),
        segments = segments.len(),
        "built session plan"
    );
    Ok(segments)
}

fn push_timed(segments: &mut Vec<Segment>, p: &TimedRepsSets) {
    for s in 0..p.sets {
        for r in 0..p.reps_per_set {
            segments.push(Segment::Work {
                set_index: s,
                rep_index: r,
                duration_sec: p.work_sec_per_rep,
            });
            if r + 1 < p.reps_per_set {
                segments.push(Segment::RestBetweenReps {
                    set_index: s,
                    rep_index: r,
                    duration_sec: p.rest_sec_between_reps,
                });
            }
        }
        if s + 1 < p.sets {
            segments.push(Segment::RestBetweenSets {
                set_index: s,
                duration_sec: p.rest_sec_between_sets,
            });
        }
    }
}

fn push_weights(segments: &mut Vec<Segment>, p: &WeightsRepsSets) {
    for s in 0..p.sets {
        segments.push(Segment::ManualSet {
            set_index: s,
            target_reps: p.reps_per_set,
        });
        if s + 1 < p.sets {
            segments.push(Segment::RestBetweenSets {
                set_index: s,
                duration_sec: p.rest_sec_between_sets,
            });
        }
    }
}

/// Aggregate numbers for a plan, shown before a session starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub segment_count: usize,
    /// Seconds across all timed segments, countdown included.
    pub timed_sec: u64,
    pub work_sec: u64,
    pub rest_sec: u64,
    pub manual_sets: usize,
}

impl PlanStats {
    pub fn of(segments: &[Segment]) -> Self {
        let mut stats = PlanStats {
            segment_count: segments.len(),
            ..Default::default()
        };
        for seg in segments {
            let secs = u64::from(seg.duration_sec().unwrap_or(0));
            stats.timed_sec += secs;
            match seg {
                Segment::Work { .. } => stats.work_sec += secs,
                Segment::RestBetweenReps { .. } | Segment::RestBetweenSets { .. } => {
                    stats.rest_sec += secs
                }
                Segment::ManualSet { .. } => stats.manual_sets += 1,
                Segment::Countdown { .. } => {}
            }
        }
        stats
    }
}
