use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use climbr_core::{Action, Config, ManualClock, RunnerView, SessionRunner, SessionSummary};
use serde::Serialize;

#[derive(Args)]
pub struct SimulateArgs {
    /// Protocol file (.json or .toml)
    pub file: PathBuf,
    /// Override a protocol field, e.g. `--set sets=4` (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub overrides: Vec<String>,
    /// Timestamped action, `<ms>:<action>` (e.g. `7000:pause`, `12000:skip`)
    #[arg(long = "at", value_name = "MS:ACTION")]
    pub at: Vec<TimedAction>,
    /// Final sync time in ms; defaults to the last action's time
    #[arg(long)]
    pub until: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct TimedAction {
    pub at_ms: i64,
    pub action: Action,
}

impl FromStr for TimedAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (at, action) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <ms>:<action>, got '{s}'"))?;
        let at_ms = at
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid time '{at}': {e}"))?;
        let action = action.parse::<Action>().map_err(|e| e.to_string())?;
        Ok(Self { at_ms, action })
    }
}

#[derive(Serialize)]
struct SimulationOutput {
    now_ms: i64,
    remaining_sec: u64,
    view: RunnerView,
    summary: Option<SessionSummary>,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let protocol = super::load_protocol(&args.file, &args.overrides)?;
    let clock = ManualClock::new(0);
    let mut runner = SessionRunner::new(clock.clone(), &Config::default());
    let mut view = runner.start(&protocol)?;
    let mut events = std::mem::take(&mut view.events);

    let mut actions = args.at;
    actions.sort_by_key(|a| a.at_ms);
    for timed in &actions {
        clock.set(timed.at_ms);
        view = runner.apply(timed.action);
        events.append(&mut view.events);
    }

    let last_ms = actions.last().map_or(0, |a| a.at_ms);
    clock.set(args.until.unwrap_or(last_ms).max(last_ms));
    view = runner.tick();
    events.append(&mut view.events);
    view.events = events;

    let output = SimulationOutput {
        now_ms: view.now_ms,
        remaining_sec: view.remaining_sec,
        summary: runner.summary(),
        view,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timed_actions() {
        let a: TimedAction = "7000:pause".parse().unwrap();
        assert_eq!(a.at_ms, 7000);
        assert_eq!(a.action, Action::Pause);
        let a: TimedAction = "0:d".parse().unwrap();
        assert_eq!(a.action, Action::Done);
        assert!("7000".parse::<TimedAction>().is_err());
        assert!("soon:skip".parse::<TimedAction>().is_err());
        assert!("10:fly".parse::<TimedAction>().is_err());
    }
}
