use std::path::PathBuf;

use chrono::Local;
use clap::Args;
use climbr_core::display::format_clock;
use climbr_core::{
    run_ticking, Action, Config, Protocol, SessionRunner, SessionSummary, SystemClock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const HELP: &str = "Commands: p pause, r resume, enter toggle, s skip, b back, d done, q end";

#[derive(Args)]
pub struct RunArgs {
    /// Protocol file (.json or .toml)
    pub file: PathBuf,
    /// Override a protocol field, e.g. `--set sets=4` (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub overrides: Vec<String>,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let protocol = super::load_protocol(&args.file, &args.overrides)?;
    tracing::debug!(file = %args.file.display(), kind = %protocol.kind(), "protocol loaded");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_session(protocol, config));
    // The stdin reader may still be parked on a blocking read.
    runtime.shutdown_background();
    result
}

async fn run_session(
    protocol: Protocol,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut runner = SessionRunner::new(SystemClock, &config);
    let view = runner.start(&protocol)?;
    println!("{HELP}");
    let mut last_line = view.status_line(&config.display);
    println!("{last_line}");

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(read_actions(tx));

    let view = run_ticking(&mut runner, rx, |view| {
        let line = view.status_line(&config.display);
        if line != last_line {
            println!("{line}");
            last_line = line;
        }
    })
    .await;

    match runner.summary() {
        Some(summary) => print_summary(&summary),
        None => println!(
            "Session left unfinished at segment {} of {}",
            view.state.active_index + 1,
            view.state.segments.len()
        ),
    }
    Ok(())
}

async fn read_actions(tx: mpsc::Sender<Action>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.parse::<Action>() {
            Ok(action) => {
                if tx.send(action).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(input = %line, "unrecognized command");
                eprintln!("{e}. {HELP}");
            }
        }
    }
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!("{}", summary.headline());
    if let Some(started) = summary.started_at() {
        println!(
            "Started:   {}",
            started.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!(
        "Duration:  {}",
        format_clock((summary.duration_ms / 1000) as u64)
    );
    println!(
        "Segments:  {}/{}",
        summary.segments_done, summary.segments_total
    );
    if summary.planned.manual_sets > 0 {
        println!(
            "Sets:      {}/{}",
            summary.manual_sets_done, summary.planned.manual_sets
        );
    } else {
        println!("Reps:      {}", summary.work_reps_done);
    }
}
