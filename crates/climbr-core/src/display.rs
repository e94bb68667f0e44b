//! Text helpers for drawing a session.

use serde::{Deserialize, Serialize};

use crate::session::Segment;

/// Colour family a renderer should use for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentTone {
    Countdown,
    Work,
    Rest,
}

pub fn segment_label(segment: &Segment) -> &'static str {
    match segment {
        Segment::Countdown { .. } => "Get Ready",
        Segment::Work { .. } => "Work",
        Segment::RestBetweenReps { .. } => "Rest (Rep)",
        Segment::RestBetweenSets { .. } => "Rest (Set)",
        Segment::ManualSet { .. } => "Manual Set",
    }
}

pub fn segment_tone(segment: &Segment) -> SegmentTone {
    match segment {
        Segment::Countdown { .. } => SegmentTone::Countdown,
        Segment::Work { .. } | Segment::ManualSet { .. } => SegmentTone::Work,
        Segment::RestBetweenReps { .. } | Segment::RestBetweenSets { .. } => SegmentTone::Rest,
    }
}

/// `M:SS`, minutes unbounded.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// "Set 2 / Rep 3" (1-based), "Set 2", or empty for the countdown.
pub fn segment_caption(segment: &Segment) -> String {
    match (segment.set_index(), segment.rep_index()) {
        (Some(set), Some(rep)) => format!("Set {} / Rep {}", set + 1, rep + 1),
        (Some(set), None) => format!("Set {}", set + 1),
        _ => String::new(),
    }
}

/// Big centre text: the countdown clock, or the rep target for manual sets.
pub fn primary_text(segment: &Segment, remaining_secs: u64) -> String {
    match segment {
        Segment::ManualSet { target_reps, .. } => format!("Do {target_reps} Reps"),
        _ => format_clock(remaining_secs),
    }
}
