//! Sorter - command-line front end for the organizer engine.
//!
//! Starts a run on the engine's worker thread and renders its events:
//! log lines on stdout, a progress bar on stderr, then a summary.

use clap::{ArgAction, Parser};
use sorter_engine::{
    events, ChecksumAlgorithm, EngineEvent, Mode, Options, Organizer, RunSummary,
};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Sort files into category folders by extension
#[derive(Parser, Debug)]
#[command(name = "sorter")]
#[command(version)]
#[command(about = "Sort files from source folders into Images, Videos, Audio, Documents, Archives and Others")]
struct Args {
    /// Source folders to scan recursively
    #[arg(value_name = "SOURCE", required = true)]
    sources: Vec<PathBuf>,

    /// Destination root; category folders are created beneath it
    #[arg(long, short = 'd', value_name = "PATH", env = "SORTER_DEST")]
    dest: PathBuf,

    /// Move files instead of copying them
    #[arg(long = "move", env = "SORTER_MOVE")]
    move_files: bool,

    /// Compare checksums after each copy: sha256 or blake3
    #[arg(long, value_name = "ALGORITHM")]
    verify: Option<ChecksumAlgorithm>,

    /// Do not print a line per file
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Diagnostic logging on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

/// Return to column 0 and erase the progress bar drawn there.
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Renders engine events for a terminal.
struct CliReporter {
    quiet: bool,
    start_time: Instant,
    last_percent: Option<u8>,
}

impl CliReporter {
    fn new(quiet: bool) -> Self {
        CliReporter {
            quiet,
            start_time: Instant::now(),
            last_percent: None,
        }
    }

    fn format_duration(elapsed: std::time::Duration) -> String {
        let secs = elapsed.as_secs();
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, mins, secs)
        } else if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}s", secs)
        }
    }

    fn progress_bar(percent: u8) -> String {
        let filled = (percent.min(100) / 5) as usize;
        let empty = 20 - filled;
        format!("[{}{}] {}%", "=".repeat(filled), " ".repeat(empty), percent)
    }

    /// Log lines go to `out`, the progress bar to `err`.
    fn handle(
        &mut self,
        event: EngineEvent,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> io::Result<()> {
        match event {
            EngineEvent::Progress(percent) => {
                if self.last_percent == Some(percent) {
                    return Ok(());
                }
                self.last_percent = Some(percent);
                write!(err, "{}Progress: {}", CLEAR_LINE, Self::progress_bar(percent))?;
                err.flush()
            }
            EngineEvent::Log(line) => {
                if self.quiet {
                    return Ok(());
                }
                if self.last_percent.is_some() {
                    // wipe the bar so a shorter log line leaves no tail behind
                    write!(err, "{}", CLEAR_LINE)?;
                    err.flush()?;
                }
                writeln!(out, "{}", line)
            }
            EngineEvent::Completed => {
                if self.last_percent.is_some() {
                    writeln!(err)?;
                }
                Ok(())
            }
        }
    }

    fn print_summary(&self, summary: &RunSummary) {
        eprintln!("Operation completed.");
        eprintln!(
            "Summary: {} of {} files organized, {} failed",
            summary.transferred, summary.total, summary.failed
        );
        eprintln!("Elapsed: {}", Self::format_duration(self.start_time.elapsed()));
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run_cli(&args) {
        Ok(summary) if summary.failed == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(msg) => {
            eprintln!("Error: {}", msg);
            ExitCode::from(2)
        }
    }
}

/// Drop repeated roots and roots nested inside another one.
///
/// Either would be walked twice and every file under it transferred twice.
/// Paths are compared after canonicalizing; a root that cannot be resolved
/// is compared as given and left for the engine to report.
fn distinct_roots(sources: &[PathBuf]) -> Vec<PathBuf> {
    let keys: Vec<PathBuf> = sources
        .iter()
        .map(|p| fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
        .collect();

    sources
        .iter()
        .zip(&keys)
        .enumerate()
        .filter(|&(i, (source, key))| {
            let covered = keys.iter().enumerate().any(|(j, other)| {
                if other == key {
                    j < i
                } else {
                    key.starts_with(other)
                }
            });
            if covered {
                tracing::info!(source = %source.display(), "source already covered, ignoring");
            }
            !covered
        })
        .map(|(_, (source, _))| source.clone())
        .collect()
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<RunSummary, String> {
    let mode = if args.move_files { Mode::Move } else { Mode::Copy };
    let mut options = Options::new(mode);
    if let Some(algorithm) = args.verify {
        options = options.with_verify(algorithm);
    }

    let sources = distinct_roots(&args.sources);
    let organizer = Organizer::new();
    let (sink, events) = events::channel();
    let handle = organizer
        .start(&sources, &args.dest, options, sink)
        .map_err(|e| e.to_string())?;

    eprintln!("Starting operation...");
    eprintln!("  Sources: {}", sources.len());
    eprintln!("  Destination: {}", args.dest.display());
    eprintln!("  Mode: {}", mode);

    let mut reporter = CliReporter::new(args.quiet);
    // Unlocked handles: the worker's tracing output shares stderr
    let (mut out, mut err) = (io::stdout(), io::stderr());
    for event in events {
        if let Err(e) = reporter.handle(event, &mut out, &mut err) {
            tracing::debug!(error = %e, "terminal write failed");
        }
    }

    let summary = handle
        .join()
        .map_err(|_| "worker thread panicked".to_string())?;
    reporter.print_summary(&summary);
    Ok(summary)
}
