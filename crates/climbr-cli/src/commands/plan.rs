use std::path::PathBuf;

use clap::Args;
use climbr_core::display::{format_clock, segment_caption, segment_label};
use climbr_core::{build_segments, PlanStats, Protocol, Segment};
use serde::Serialize;

#[derive(Args)]
pub struct PlanArgs {
    /// Protocol file (.json or .toml)
    pub file: PathBuf,
    /// Override a protocol field, e.g. `--set sets=4` (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub overrides: Vec<String>,
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    protocol: &'a Protocol,
    segments: &'a [Segment],
    stats: PlanStats,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let protocol = super::load_protocol(&args.file, &args.overrides)?;
    let segments = build_segments(&protocol)?;
    let stats = PlanStats::of(&segments);

    if args.json {
        let output = PlanOutput {
            protocol: &protocol,
            segments: &segments,
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Protocol: {}", protocol.kind());
    println!("{:>4}  {:<11} {:>8}  {}", "#", "Segment", "Length", "Position");
    for (i, segment) in segments.iter().enumerate() {
        let length = match segment {
            Segment::ManualSet { target_reps, .. } => format!("{target_reps} reps"),
            _ => format_clock(u64::from(segment.duration_sec().unwrap_or(0))),
        };
        println!(
            "{:>4}  {:<11} {:>8}  {}",
            i,
            segment_label(segment),
            length,
            segment_caption(segment)
        );
    }
    println!();
    println!("Segments:    {}", stats.segment_count);
    println!("Timed total: {}", format_clock(stats.timed_sec));
    println!("Work:        {}", format_clock(stats.work_sec));
    println!("Rest:        {}", format_clock(stats.rest_sec));
    if stats.manual_sets > 0 {
        println!("Manual sets: {}", stats.manual_sets);
    }
    Ok(())
}
