//! The parse session: rules, parsed paths and report options.

use crate::error::{AnalysisError, ReportError};
use crate::model::{ColumnKind, PathStyle, ReportOption, TimePath};
use crate::parser::{scan_header, ReportScanner};
use ptana_config::RuleSet;
use ptana_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use ptana_source::{SourceDb, SourceFile};
use std::collections::BTreeSet;
use std::path::Path;

/// Code of the warning raised when a scan range yields no path.
pub const EMPTY_RANGE: DiagnosticCode = DiagnosticCode::new(Category::Report, 201);

/// A window of report lines to scan.
///
/// Both bounds are 1-based and inclusive; a start of 0 means line 1. A path
/// is taken when it begins at or after `start` and ends at or before `end`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScanRange {
    /// First line to scan.
    pub start: usize,
    /// Last line to scan; `None` runs to the end of the report.
    pub end: Option<usize>,
    /// Maximum number of paths to take; `None` takes all.
    pub count: Option<usize>,
}

impl ScanRange {
    /// Creates a range.
    pub fn new(start: usize, end: Option<usize>, count: Option<usize>) -> Self {
        Self { start, end, count }
    }

    /// The whole report, every path.
    pub fn whole() -> Self {
        Self::new(0, None, None)
    }
}

/// Parsed paths of one report together with the rules they were classified with.
///
/// A `TimeReport` is populated by [`parse_report`](Self::parse_report) and
/// then queried read-only.
pub struct TimeReport {
    rules: RuleSet,
    /// Parsed paths, in range order then report order.
    pub paths: Vec<TimePath>,
    /// Report-wide options recognized so far.
    pub opt: BTreeSet<ReportOption>,
}

impl TimeReport {
    /// Creates an empty session classifying with `rules`.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            paths: Vec::new(),
            opt: BTreeSet::new(),
        }
    }

    /// Returns the rules this session classifies with.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns the path at `pid`.
    pub fn path(&self, pid: usize) -> Result<&TimePath, AnalysisError> {
        self.paths.get(pid).ok_or(AnalysisError::NoSuchPath {
            pid,
            count: self.paths.len(),
        })
    }

    /// Returns the `-path_type` of the report, if its header declared one.
    pub fn style(&self) -> Option<PathStyle> {
        self.opt.iter().find_map(|opt| match opt {
            ReportOption::Style(style) => Some(*style),
            ReportOption::Column(_) => None,
        })
    }

    /// Returns `true` if any pin table carried `column`.
    pub fn has_column(&self, column: ColumnKind) -> bool {
        self.opt.contains(&ReportOption::Column(column))
    }

    /// Loads a report from disk and parses it.
    pub fn load_report(
        &mut self,
        path: &Path,
        source_db: &mut SourceDb,
        ranges: &[ScanRange],
        sink: &DiagnosticSink,
    ) -> Result<usize, ReportError> {
        let id = source_db.load_file(path)?;
        self.parse_report(source_db.get_file(id), ranges, sink)
    }

    /// Scans `ranges` of a report and appends the paths found.
    ///
    /// The header (everything before the first `Startpoint:`) is always read.
    /// Ranges are processed in order and independently, so overlapping ranges
    /// yield duplicate paths. On a format error nothing from this call is
    /// kept. Returns the number of paths added.
    pub fn parse_report(
        &mut self,
        file: &SourceFile,
        ranges: &[ScanRange],
        sink: &DiagnosticSink,
    ) -> Result<usize, ReportError> {
        let header = scan_header(file);
        let mut opt = BTreeSet::new();
        if let Some(style) = header.style {
            opt.insert(ReportOption::Style(style));
        }

        let scanner = ReportScanner::new(file, &self.rules, &header.through);
        let mut found = Vec::new();
        for range in ranges {
            let paths = scanner.scan(range, &mut opt)?;
            tracing::debug!(
                start = range.start,
                end = ?range.end,
                paths = paths.len(),
                "scanned range"
            );
            if paths.is_empty() {
                sink.emit(Diagnostic::warning(
                    EMPTY_RANGE,
                    format!("no timing path found from line {}", range.start.max(1)),
                    file.location(range.start.max(1)),
                ));
            }
            found.extend(paths);
        }

        let added = found.len();
        self.paths.extend(found);
        self.opt.extend(opt);
        Ok(added)
    }
}
