//! # Climbr Core Library
//!
//! Core logic for running a climbing-training session: turning an exercise
//! protocol into a plan of timed and manual steps, and keeping a resumable
//! clock over that plan.
//!
//! ## Architecture
//!
//! - **Segment Builder**: expands a [`Protocol`] into an ordered list of
//!   [`Segment`]s, always opening with a countdown and never ending on a rest
//! - **Timer Engine**: a caller-clocked state machine; the host passes the
//!   current time into every command and calls `sync` on every tick and when
//!   it returns from the background
//! - **Runner**: host-side glue that owns the clock, dispatches user actions
//!   and produces render-ready views
//!
//! ## Key Components
//!
//! - [`build_segments`]: protocol to plan
//! - [`TimerEngine`]: session state machine
//! - [`SessionRunner`]: clocked host wrapper
//! - [`Config`]: application configuration

pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod protocol;
pub mod runner;
pub mod session;

pub use config::Config;
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use protocol::{Protocol, ProtocolKind, TimedRepsSets, WeightsRepsSets};
pub use runner::{run_ticking, Action, Clock, ManualClock, RunnerView, SessionRunner, SystemClock};
pub use session::{
    build_segments, transition, Command, EndReason, EngineState, Mode, PlanStats, Segment,
    SegmentKind, SessionSummary, TimerEngine, COUNTDOWN_SEC,
};
