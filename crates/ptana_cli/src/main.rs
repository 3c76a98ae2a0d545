//! ptana: timing-path summaries from `report_timing` output.
//!
//! Reads a rules file and a report, prints one summary per selected path, and
//! optionally exports per-path metrics as CSV, clock-check traces as text, and
//! chart data series as JSON.

#![warn(missing_docs)]

mod csv;
mod dump;
mod range;
mod summary;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use ptana_config::load_rules;
use ptana_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use ptana_source::SourceDb;
use ptana_timing::metric::DEFAULT_COLUMNS;
use ptana_timing::{BarRequest, PathMetric, ReportOption, TimePath, TimeReport};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::range::{default_ranges, parse_ranges};
use crate::summary::{SummaryOptions, SummaryWriter};

/// Rules file picked up from the working directory when `-c` is not given.
const DEFAULT_RULES_FILE: &str = ".ptana.setup";

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "ptana", version, about = "PrimeTime timing report analysis")]
pub struct Cli {
    /// Timing report (`report_timing` output, plain or `.gz`).
    pub report: PathBuf,

    /// Rules file.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Do not load any rules file.
    #[arg(long)]
    pub no_config: bool,

    /// Scan ranges, e.g. `6,16+2,26:100,26:100+2` (default: one path from the top).
    #[arg(short, long)]
    pub range: Option<String>,

    /// Run the clock-path check.
    #[arg(long)]
    pub ckc: bool,

    /// Write clock-check traces to this file (implies `--ckc`).
    #[arg(long, value_name = "FILE")]
    pub ckc_dump: Option<PathBuf>,

    /// Print clock/data delta totals.
    #[arg(long)]
    pub dts: bool,

    /// Print path segments.
    #[arg(long)]
    pub seg: bool,

    /// Chart data types (`p c t d i ct`); without values, all of them.
    #[arg(long, num_args = 0.., value_parser = ["p", "c", "t", "d", "i", "ct"])]
    pub bar_data: Option<Vec<String>>,

    /// Chart path parts (`f d l c`; default: `f`).
    #[arg(long, num_args = 1.., value_parser = ["f", "d", "l", "c"])]
    pub bar_path: Vec<String>,

    /// Chart data types from a `bds` group of the rules file.
    #[arg(long, value_name = "TAG")]
    pub bar_set: Option<String>,

    /// Write chart data series to this file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub bar_out: Option<PathBuf>,

    /// Export per-path metrics to this file.
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// CSV columns after `ln` (default: `arr req slk`).
    #[arg(long, num_args = 1.., value_parser = [
        "stp", "edp", "dlat", "arr", "req", "slk", "unce", "lib", "llat", "clat",
        "slat", "crpr", "skew", "ddt", "ldt", "cdt",
    ])]
    pub csv_cols: Vec<String>,

    /// Print the parsed paths as JSON and stop.
    #[arg(long)]
    pub debug: bool,

    /// Diagnostic output format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Suppress status messages.
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal.
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Serialize)]
struct ParsedReport<'a> {
    options: Vec<ReportOption>,
    paths: &'a [TimePath],
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let color = match cli.color {
        ColorChoice::Auto => io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    match run(&cli, color) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn init_tracing(cli: &Cli) {
    // Diagnostics are rendered by `run`; their log mirror only shows with -v.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("error,ptana_diagnostics=off")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,ptana_diagnostics=off"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Picks the rules file: `--no-config` wins, then `-c`, then the default file.
fn rules_path(cli: &Cli) -> Option<PathBuf> {
    if cli.no_config {
        return None;
    }
    if let Some(path) = &cli.config {
        return Some(path.clone());
    }
    let default = Path::new(DEFAULT_RULES_FILE);
    default.is_file().then(|| default.to_path_buf())
}

/// Runs the analysis and renders every diagnostic raised on the way.
///
/// Returns exit code 0, or 1 if an error diagnostic was raised.
pub fn run(cli: &Cli, color: bool) -> Result<i32, Box<dyn Error>> {
    let mut source_db = SourceDb::new();
    let sink = DiagnosticSink::new();

    let result = analyze(cli, &mut source_db, &sink);

    let diagnostics = sink.take_all();
    match cli.format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(color);
            for diag in &diagnostics {
                eprint!("{}", renderer.render(diag, &source_db));
            }
        }
        ReportFormat::Json if !diagnostics.is_empty() => {
            eprintln!("{}", serde_json::to_string_pretty(&diagnostics)?);
        }
        ReportFormat::Json => {}
    }

    result?;
    Ok(if sink.has_errors() { 1 } else { 0 })
}

fn analyze(cli: &Cli, source_db: &mut SourceDb, sink: &DiagnosticSink) -> Result<(), Box<dyn Error>> {
    let rules = load_rules(rules_path(cli).as_deref(), source_db, sink)?;
    let ranges = cli
        .range
        .as_deref()
        .map_or_else(default_ranges, parse_ranges);
    let columns = if cli.csv_cols.is_empty() {
        DEFAULT_COLUMNS.to_vec()
    } else {
        PathMetric::parse_list(cli.csv_cols.iter().map(String::as_str))
            .map_err(|code| format!("unknown CSV column '{code}'"))?
    };

    if !cli.quiet {
        let shown = std::fs::canonicalize(&cli.report).unwrap_or_else(|_| cli.report.clone());
        println!("\n Report: {}\n", shown.display());
    }

    let mut report = TimeReport::new(rules);
    let added = report.load_report(&cli.report, source_db, &ranges, sink)?;
    tracing::info!(paths = added, ranges = ranges.len(), "report parsed");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.debug {
        let parsed = ParsedReport {
            options: report.opt.iter().copied().collect(),
            paths: &report.paths,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&parsed)?)?;
        return Ok(());
    }

    let options = SummaryOptions {
        clock_check: cli.ckc || cli.ckc_dump.is_some(),
        trace: cli.ckc_dump.is_some(),
        delta_sum: cli.dts,
        segments: cli.seg,
    };
    let writer = SummaryWriter::new(&report, options);
    let mut traces = Vec::new();
    for pid in 0..report.paths.len() {
        if let Some(check) = writer.write_path(&mut out, pid)? {
            traces.push((pid, check));
        }
    }
    out.flush()?;

    if let Some(path) = &cli.csv {
        let mut file = BufWriter::new(File::create(path)?);
        csv::write_csv(&mut file, &report, &columns)?;
        file.flush()?;
        tracing::info!(file = %path.display(), rows = report.paths.len(), "CSV written");
    }

    if let Some(path) = &cli.ckc_dump {
        let mut file = BufWriter::new(File::create(path)?);
        for (pid, check) in &traces {
            dump::write_trace(&mut file, *pid, &report.paths[*pid], check)?;
        }
        file.flush()?;
    }

    write_bars(cli, &report, sink, &mut out)?;
    Ok(())
}

/// Exports chart series of the last parsed path, if any were requested.
fn write_bars(
    cli: &Cli,
    report: &TimeReport,
    sink: &DiagnosticSink,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    const ALL_DATA: [&str; 6] = ["p", "c", "t", "d", "i", "ct"];

    let data: Vec<&str> = match &cli.bar_data {
        Some(codes) if codes.is_empty() => ALL_DATA.to_vec(),
        Some(codes) => codes.iter().map(String::as_str).collect(),
        None => Vec::new(),
    };
    let paths: Vec<&str> = if cli.bar_path.is_empty() {
        vec!["f"]
    } else {
        cli.bar_path.iter().map(String::as_str).collect()
    };
    let mut request = BarRequest::from_codes(data, paths, sink);
    if let Some(tag) = &cli.bar_set {
        request.add_bar_set(report, tag, sink);
    }
    let Some(pid) = report.paths.len().checked_sub(1) else {
        return Ok(());
    };
    if request.data.is_empty() {
        return Ok(());
    }

    let series = report.bar_series(pid, &request, sink)?;
    let json = serde_json::to_string_pretty(&series)?;
    match &cli.bar_out {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => writeln!(out, "{json}")?,
    }
    Ok(())
}
