//! optical-tally - replay optical-photon step traces and report run statistics.
//!
//! A trace directory holds one `worker-*.jsonl` file per worker thread of the
//! transport engine. Each file is replayed through its own worker context, the
//! per-worker counters are merged at the end of the run, and the summary is
//! printed.
//!
//! ```text
//! trace_dir/worker-0.jsonl ──► worker 0 ─┐
//! trace_dir/worker-1.jsonl ──► worker 1 ─┼──► merge ──► report
//! trace_dir/worker-N.jsonl ──► worker N ─┘
//! ```
//!
//! `sweep` replays several trace directories (e.g. one per target thickness)
//! through one controller and tabulates the results.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use runner::{ReportLog, RunConfig, RunController, RunReport, TracingHook};
use serde::Serialize;
use tracing::info;

use config::Overrides;

/// Optical step classification and run statistics
#[derive(Parser, Debug)]
#[command(name = "optical-tally")]
#[command(about = "Classify optical-photon step traces and report detection statistics")]
#[command(version)]
struct Args {
    /// JSON file with detector names, process tables and run options
    #[arg(long, global = true, env = "OPTICAL_TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Quantum efficiency used for the electron estimate
    #[arg(long, global = true, env = "OPTICAL_TALLY_QE")]
    qe: Option<f64>,

    /// Replay workers one after another on a single thread
    #[arg(long, global = true, env = "OPTICAL_TALLY_SEQUENTIAL")]
    sequential: bool,

    /// Terminate tracks on their second boundary interaction
    #[arg(long, global = true, env = "OPTICAL_TALLY_KILL_ON_SECOND_SURFACE")]
    kill_on_second_surface: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true, env = "OPTICAL_TALLY_JSON")]
    json: bool,

    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, env = "OPTICAL_TALLY_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay one trace directory and print the run summary
    Run {
        /// Directory containing worker-*.jsonl trace files
        #[arg(value_name = "TRACE_DIR", env = "OPTICAL_TALLY_TRACE_DIR")]
        trace_dir: PathBuf,
    },
    /// Replay several trace directories and tabulate detection efficiency
    Sweep {
        /// Points as LABEL=TRACE_DIR (label defaults to the directory name)
        #[arg(value_name = "POINT", required = true, value_parser = parse_point)]
        points: Vec<SweepPoint>,

        /// Print CSV instead of an aligned table (ignored with --json)
        #[arg(long)]
        csv: bool,
    },
}

/// One labelled trace directory of a sweep.
#[derive(Debug, Clone)]
struct SweepPoint {
    label: String,
    dir: PathBuf,
}

fn parse_point(s: &str) -> Result<SweepPoint, String> {
    let (label, dir) = match s.split_once('=') {
        Some((label, dir)) => (label.to_string(), PathBuf::from(dir)),
        None => {
            let dir = PathBuf::from(s);
            let label = dir
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| format!("cannot derive a label from '{s}'"))?
                .to_string();
            (label, dir)
        }
    };
    if label.is_empty() {
        return Err(format!("empty label in '{s}'"));
    }
    Ok(SweepPoint { label, dir })
}

/// Sweep result row for JSON output.
#[derive(Debug, Serialize)]
struct SweepRow<'a> {
    label: &'a str,
    report: &'a RunReport,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::load(
        args.config.as_deref(),
        Overrides {
            quantum_efficiency: args.qe,
            sequential: args.sequential,
            kill_on_second_surface: args.kill_on_second_surface,
        },
    )?;

    match &args.command {
        Command::Run { trace_dir } => {
            let mut controller = controller(config);
            let report = replay(&mut controller, trace_dir)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
        Command::Sweep { points, csv } => {
            let log = Arc::new(ReportLog::new());
            let mut controller = controller(config);
            controller.add_hook(log.clone());

            for point in points {
                info!(label = %point.label, dir = %point.dir.display(), "sweep point");
                replay(&mut controller, &point.dir)
                    .with_context(|| format!("Sweep point '{}' failed", point.label))?;
            }

            let reports = log.reports();
            let rows: Vec<(&str, &RunReport)> = points
                .iter()
                .map(|p| p.label.as_str())
                .zip(reports.iter())
                .collect();
            if args.json {
                let rows: Vec<SweepRow<'_>> = rows
                    .iter()
                    .map(|(label, report)| SweepRow { label, report })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if *csv {
                print!("{}", sweep_csv(&rows));
            } else {
                print!("{}", sweep_table(&rows));
            }
        }
    }

    Ok(())
}

fn controller(config: RunConfig) -> RunController {
    let mut controller = RunController::new(config);
    controller.add_hook(Arc::new(TracingHook));
    controller
}

/// Run one trace directory through the controller.
fn replay(controller: &mut RunController, dir: &Path) -> anyhow::Result<RunReport> {
    let files = config::trace_files(dir)?;
    let sources = config::open_sources(&files, controller.config())?;
    info!(dir = %dir.display(), workers = sources.len(), "replaying traces");

    controller.run(sources).map_err(|err| {
        let file = err
            .worker()
            .and_then(|worker| files.get(worker.0 as usize));
        let context = match file {
            Some(file) => format!("Run over {} failed in {}", dir.display(), file.display()),
            None => format!("Run over {} failed", dir.display()),
        };
        anyhow::Error::new(err).context(context)
    })
}

fn sweep_table(rows: &[(&str, &RunReport)]) -> String {
    let width = rows
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0)
        .max("label".len());

    let mut out = format!(
        "{:<width$}  {:>10}  {:>10}  {:>12}  {:>10}\n",
        "label", "created", "detected", "electrons", "efficiency"
    );
    for (label, report) in rows {
        out.push_str(&format!(
            "{:<width$}  {:>10}  {:>10}  {:>12.1}  {:>10.4}\n",
            label,
            report.stats.created,
            report.stats.detected,
            report.estimated_carriers,
            report.detection_efficiency,
        ));
    }
    out
}

fn sweep_csv(rows: &[(&str, &RunReport)]) -> String {
    let mut out = String::from("label,created,detected,estimated_electrons,efficiency\n");
    for (label, report) in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            label,
            report.stats.created,
            report.stats.detected,
            report.estimated_carriers,
            report.detection_efficiency,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{RunId, RunStatistics};

    fn report(created: u64, detected: u64) -> RunReport {
        let mut stats = RunStatistics::ZERO;
        stats.created = created;
        stats.detected = detected;
        RunReport::new(RunId(1), 1, stats, 0.9)
    }

    #[test]
    fn test_parse_point() {
        let p = parse_point("5mm=traces/t5").unwrap();
        assert_eq!(p.label, "5mm");
        assert_eq!(p.dir, PathBuf::from("traces/t5"));

        let p = parse_point("traces/t10").unwrap();
        assert_eq!(p.label, "t10");

        assert!(parse_point("=traces/t5").is_err());
    }

    #[test]
    fn test_sweep_csv() {
        let a = report(100, 25);
        let b = report(0, 0);
        let csv = sweep_csv(&[("1mm", &a), ("2mm", &b)]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "label,created,detected,estimated_electrons,efficiency");
        assert_eq!(lines[1], "1mm,100,25,22.5,0.25");
        assert_eq!(lines[2], "2mm,0,0,0,0");
    }

    #[test]
    fn test_sweep_table_aligns_labels() {
        let a = report(100, 25);
        let table = sweep_table(&[("a-long-label", &a)]);
        let header = table.lines().next().unwrap();
        assert!(header.starts_with(&format!("{:<12}  ", "label")));
        assert!(table.contains("22.5"));
    }
}
