mod builder;
mod engine;
mod segment;
mod summary;

pub use builder::{build_segments, PlanStats};
pub use engine::{transition, Command, EndReason, EngineState, Mode, TimerEngine};
pub use segment::{Segment, SegmentKind, COUNTDOWN_SEC};
pub use summary::SessionSummary;
