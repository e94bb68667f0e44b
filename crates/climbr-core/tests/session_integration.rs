//! End-to-end session flows: protocol file to finished summary.

use climbr_core::{
    build_segments, Action, Config, EndReason, Event, ManualClock, Mode, Protocol, ProtocolKind,
    SessionRunner, SessionSummary, TimerEngine,
};
use tempfile::TempDir;

const REPEATERS_TOML: &str = r#"
kind = "timed_reps_sets"

[default]
sets = 2
repsPerSet = 3
workSecPerRep = 7
restSecBetweenReps = 3
restSecBetweenSets = 60
"#;

const BENCH_JSON: &str = r#"{
    "kind": "weights_reps_sets",
    "default": { "sets": 3, "repsPerSet": 5, "restSecBetweenSets": 120 }
}"#;

fn load(name: &str, content: &str) -> Protocol {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    Protocol::load(&path).unwrap()
}

#[test]
fn repeaters_run_to_completion_unattended() {
    let protocol = load("repeaters.toml", REPEATERS_TOML);
    assert_eq!(protocol.kind(), ProtocolKind::TimedRepsSets);

    let segments = build_segments(&protocol).unwrap();
    // countdown + 6 work + 4 rep rests + 1 set rest
    assert_eq!(segments.len(), 12);

    let clock = ManualClock::new(1_000);
    let mut runner = SessionRunner::new(clock.clone(), &Config::default());
    runner.start(&protocol).unwrap();

    let mut changes = 0;
    while !runner.is_finished() {
        clock.advance(200);
        let view = runner.tick();
        changes += view
            .events
            .iter()
            .filter(|e| matches!(e, Event::SegmentChanged { .. }))
            .count();
    }

    // 5 + 2 * (3 * 7 + 2 * 3) + 60 seconds
    let total_ms = (5 + 2 * (21 + 6) + 60) * 1000;
    let summary = runner.summary().unwrap();
    assert_eq!(changes, 11);
    assert_eq!(summary.reason, EndReason::Finished);
    assert_eq!(summary.ended_at_ms, 1_000 + total_ms);
    assert_eq!(summary.work_reps_done, 6);
    assert_eq!(summary.segments_done, 12);
}

#[test]
fn backgrounded_app_catches_up_in_one_sync() {
    let protocol = load("repeaters.toml", REPEATERS_TOML);
    let clock = ManualClock::new(0);
    let mut runner = SessionRunner::new(clock.clone(), &Config::default());
    runner.start(&protocol).unwrap();

    // Away for 40s: countdown 5, set one (27s), then 8s into the set rest.
    clock.set(40_000);
    let view = runner.on_foreground();
    assert_eq!(view.label.as_deref(), Some("Rest (Set)"));
    assert_eq!(view.state.segment_started_at_ms, Some(32_000));
    assert_eq!(view.remaining_sec, 52);
    // One sync, one change, however many segments it crossed.
    assert!(matches!(
        view.events.as_slice(),
        [Event::SegmentChanged { from: 0, to: 6, .. }]
    ));
}

#[test]
fn bench_session_with_pauses_and_manual_sets() {
    let protocol = load("bench.json", BENCH_JSON);
    let clock = ManualClock::new(0);
    let mut runner = SessionRunner::new(clock.clone(), &Config::default());
    runner.start(&protocol).unwrap();

    clock.set(5_000);
    assert_eq!(runner.tick().primary_text.as_deref(), Some("Do 5 Reps"));

    // Pausing on a manual set changes nothing about the plan.
    clock.set(20_000);
    runner.apply(Action::Pause);
    clock.set(50_000);
    runner.apply(Action::Resume);
    clock.set(60_000);
    let view = runner.apply(Action::Done);
    assert_eq!(view.label.as_deref(), Some("Rest (Set)"));
    assert_eq!(view.remaining_sec, 120);

    // Pause mid-rest for 30s; the rest ends 30s later than planned.
    clock.set(100_000);
    runner.apply(Action::Pause);
    clock.set(130_000);
    runner.apply(Action::Resume);
    clock.set(209_999);
    assert_eq!(runner.tick().state.active_index, 2);
    clock.set(210_000);
    let view = runner.tick();
    assert_eq!(view.state.active_index, 3);
    assert_eq!(view.state.pause_accumulated_ms, 0);

    clock.set(240_000);
    runner.apply(Action::EndEarly);
    let summary = runner.summary().unwrap();
    assert_eq!(summary.reason, EndReason::EndedEarly);
    assert_eq!(summary.manual_sets_done, 1);
    assert_eq!(summary.duration_ms, 240_000);
    assert_eq!(summary.planned.manual_sets, 3);
}

#[test]
fn back_from_summary_reopens_last_segment() {
    let protocol = load("bench.json", BENCH_JSON);
    let clock = ManualClock::new(0);
    let mut runner = SessionRunner::new(clock.clone(), &Config::default());
    runner.start(&protocol).unwrap();
    for t in [1_000, 2_000, 3_000, 4_000, 5_000, 6_000] {
        clock.set(t);
        runner.apply(Action::Skip);
    }
    assert!(runner.is_finished());

    clock.set(7_000);
    let view = runner.apply(Action::Back);
    assert_eq!(view.state.mode, Mode::Running);
    assert_eq!(view.state.active_index, 4);
    assert!(view
        .events
        .iter()
        .any(|e| matches!(e, Event::SessionReopened { .. })));
    assert!(runner.summary().is_none());
}

#[test]
fn engine_state_survives_serialization() {
    let protocol = load("repeaters.toml", REPEATERS_TOML);
    let mut engine = TimerEngine::new();
    engine.start(build_segments(&protocol).unwrap(), 0);
    engine.sync(17_000);
    engine.pause(18_000);

    let json = serde_json::to_string(&engine.state()).unwrap();
    let mut restored = TimerEngine::with_state(serde_json::from_str(&json).unwrap());
    assert_eq!(restored.state(), engine.state());

    restored.resume(20_000);
    engine.resume(20_000);
    assert_eq!(restored.sync(40_000), engine.sync(40_000));
    assert_eq!(restored.state(), engine.state());
}

#[test]
fn summary_only_for_completed_sessions() {
    let protocol = load("repeaters.toml", REPEATERS_TOML);
    let mut engine = TimerEngine::new();
    engine.start(build_segments(&protocol).unwrap(), 0);
    assert!(SessionSummary::from_state(&engine.state()).is_none());
    engine.sync(1_000_000);
    let summary = SessionSummary::from_state(&engine.state()).unwrap();
    assert_eq!(summary.duration_ms, 119_000);
}
