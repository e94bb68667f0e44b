use serde::{Deserialize, Serialize};

/// Length of the "get ready" countdown that opens every plan.
pub const COUNTDOWN_SEC: u32 = 5;

/// One step of a flattened session plan.
///
/// Set and rep indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    #[serde(rename_all = "camelCase")]
    Countdown { duration_sec: u32 },
    #[serde(rename_all = "camelCase")]
    Work {
        set_index: u32,
        rep_index: u32,
        duration_sec: u32,
    },
    #[serde(rename_all = "camelCase")]
    RestBetweenReps {
        set_index: u32,
        rep_index: u32,
        duration_sec: u32,
    },
    #[serde(rename_all = "camelCase")]
    RestBetweenSets { set_index: u32, duration_sec: u32 },
    /// Untimed; finished only by an explicit user action.
    #[serde(rename_all = "camelCase")]
    ManualSet { set_index: u32, target_reps: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Countdown,
    Work,
    RestBetweenReps,
    RestBetweenSets,
    ManualSet,
}

impl Segment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Countdown { .. } => SegmentKind::Countdown,
            Segment::Work { .. } => SegmentKind::Work,
            Segment::RestBetweenReps { .. } => SegmentKind::RestBetweenReps,
            Segment::RestBetweenSets { .. } => SegmentKind::RestBetweenSets,
            Segment::ManualSet { .. } => SegmentKind::ManualSet,
        }
    }

    /// Duration in seconds, or `None` for manual segments.
    pub fn duration_sec(&self) -> Option<u32> {
        match *self {
            Segment::Countdown { duration_sec }
            | Segment::Work { duration_sec, .. }
            | Segment::RestBetweenReps { duration_sec, .. }
            | Segment::RestBetweenSets { duration_sec, .. } => Some(duration_sec),
            Segment::ManualSet { .. } => None,
        }
    }

    /// Duration in milliseconds, or `None` for manual segments.
    pub fn duration_ms(&self) -> Option<i64> {
        self.duration_sec().map(|s| i64::from(s) * 1000)
    }

    pub fn is_timed(&self) -> bool {
        self.duration_sec().is_some()
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Segment::ManualSet { .. })
    }

    pub fn is_rest(&self) -> bool {
        matches!(
            self,
            Segment::RestBetweenReps { .. } | Segment::RestBetweenSets { .. }
        )
    }

    pub fn set_index(&self) -> Option<u32> {
        match *self {
            Segment::Countdown { .. } => None,
            Segment::Work { set_index, .. }
            | Segment::RestBetweenReps { set_index, .. }
            | Segment::RestBetweenSets { set_index, .. }
            | Segment::ManualSet { set_index, .. } => Some(set_index),
        }
    }

    pub fn rep_index(&self) -> Option<u32> {
        match *self {
            Segment::Work { rep_index, .. } | Segment::RestBetweenReps { rep_index, .. } => {
                Some(rep_index)
            }
            _ => None,
        }
    }
}
