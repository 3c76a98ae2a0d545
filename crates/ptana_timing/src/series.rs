//! Per-pin data series for bar charts of a path.
//!
//! A series holds the values a chart draws for one data kind on one part of a
//! path, with the classification tag of every bar and the bar to highlight.
//! Drawing is left to the caller.

use crate::error::AnalysisError;
use crate::model::{ColumnKind, Pin, TimePath};
use crate::report::TimeReport;
use crate::segment::sticky_tags;
use ptana_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use ptana_source::Location;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Code of the warning raised for a cell no `dc` rule classifies.
pub const UNKNOWN_DRIVE_CELL: DiagnosticCode = DiagnosticCode::new(Category::Analysis, 201);
/// Code of the note raised when a requested column is absent from the report.
pub const MISSING_COLUMN: DiagnosticCode = DiagnosticCode::new(Category::Analysis, 202);
/// Code of the warning raised for an unknown bar-dataset tag or code.
pub const UNKNOWN_BAR_SET: DiagnosticCode = DiagnosticCode::new(Category::Analysis, 203);

/// Label of bars no `pc` rule classifies.
pub const UNCLASSIFIED_PATH_TAG: &str = "TP";
/// Label of bars no `cc` rule classifies.
pub const UNCLASSIFIED_CELL_TAG: &str = "UN";

/// What a series plots.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum BarData {
    /// Physical distance (`p`).
    Distance,
    /// Capacitance (`c`).
    Cap,
    /// Transition (`t`).
    Trans,
    /// Delta delay (`d`).
    Delta,
    /// Incremental delay (`i`).
    Incr,
    /// Incremental delay by cell class, with drive classification (`ct`).
    CellType,
}

impl BarData {
    /// Parses a data-type code.
    pub fn from_code(code: &str) -> Option<BarData> {
        match code {
            "p" => Some(BarData::Distance),
            "c" => Some(BarData::Cap),
            "t" => Some(BarData::Trans),
            "d" => Some(BarData::Delta),
            "i" => Some(BarData::Incr),
            "ct" => Some(BarData::CellType),
            _ => None,
        }
    }

    /// The pin-table column the series reads.
    pub fn column(self) -> ColumnKind {
        match self {
            BarData::Distance => ColumnKind::Location,
            BarData::Cap => ColumnKind::Cap,
            BarData::Trans => ColumnKind::Trans,
            BarData::Delta => ColumnKind::Delta,
            BarData::Incr | BarData::CellType => ColumnKind::Incr,
        }
    }
}

impl fmt::Display for BarData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            BarData::Distance => "distance",
            BarData::Cap => "capacitance",
            BarData::Trans => "transition",
            BarData::Delta => "delta",
            BarData::Incr => "incremental delay",
            BarData::CellType => "cell type",
        };
        f.write_str(title)
    }
}

/// Which part of a path a series covers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum BarPath {
    /// Launch clock network (`l`).
    Launch,
    /// Data path starting at the startpoint clock pin (`d`).
    Data,
    /// Whole launch side (`f`).
    Full,
    /// Capture clock network (`c`).
    Capture,
}

impl BarPath {
    /// Parses a path-type code.
    pub fn from_code(code: &str) -> Option<BarPath> {
        match code {
            "l" => Some(BarPath::Launch),
            "d" => Some(BarPath::Data),
            "f" => Some(BarPath::Full),
            "c" => Some(BarPath::Capture),
            _ => None,
        }
    }
}

impl fmt::Display for BarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            BarPath::Launch => "launch clock",
            BarPath::Data => "data path",
            BarPath::Full => "full path",
            BarPath::Capture => "capture clock",
        };
        f.write_str(title)
    }
}

/// The series a chart wants.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BarRequest {
    /// Data kinds.
    pub data: BTreeSet<BarData>,
    /// Path parts.
    pub paths: BTreeSet<BarPath>,
}

impl BarRequest {
    /// Builds a request from codes; unknown codes are reported and skipped.
    ///
    /// `ct` also requests `i`; `f` replaces `d`.
    pub fn from_codes<'c>(
        data_codes: impl IntoIterator<Item = &'c str>,
        path_codes: impl IntoIterator<Item = &'c str>,
        sink: &DiagnosticSink,
    ) -> Self {
        let mut request = BarRequest::default();
        for code in data_codes {
            match BarData::from_code(code) {
                Some(BarData::CellType) => {
                    request.data.insert(BarData::CellType);
                    request.data.insert(BarData::Incr);
                }
                Some(data) => {
                    request.data.insert(data);
                }
                None => unknown_code(sink, "data type", code),
            }
        }
        for code in path_codes {
            match BarPath::from_code(code) {
                Some(path) => {
                    request.paths.insert(path);
                }
                None => unknown_code(sink, "path type", code),
            }
        }
        if request.paths.contains(&BarPath::Full) {
            request.paths.remove(&BarPath::Data);
        }
        request
    }

    /// Adds the data kinds of the `bds` group `tag`.
    pub fn add_bar_set(&mut self, report: &TimeReport, tag: &str, sink: &DiagnosticSink) {
        let Some(codes) = report.rules().bar_set(tag) else {
            sink.emit(Diagnostic::warning(
                UNKNOWN_BAR_SET,
                format!("bar dataset '{tag}' is not defined in the rules, ignored"),
                Location::DUMMY,
            ));
            return;
        };
        let extra = BarRequest::from_codes(codes.iter().map(String::as_str), [], sink);
        self.data.extend(extra.data);
    }
}

fn unknown_code(sink: &DiagnosticSink, what: &str, code: &str) {
    sink.emit(Diagnostic::warning(
        UNKNOWN_BAR_SET,
        format!("unknown bar {what} '{code}', ignored"),
        Location::DUMMY,
    ));
}

/// Values of one data kind over one part of a path.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarSeries {
    /// What is plotted.
    pub data: BarData,
    /// Which part of the path.
    pub path: BarPath,
    /// Chart title.
    pub title: String,
    /// Pin names, one per bar.
    pub names: Vec<String>,
    /// Report lines, one per bar.
    pub lines: Vec<usize>,
    /// Bar values.
    pub values: Vec<f64>,
    /// Classification tag of every bar.
    pub tags: Vec<String>,
    /// Drive classification of every bar (cell-type series only).
    pub drive: Vec<Option<f64>>,
    /// Index of the startpoint clock pin bar.
    pub highlight: Option<usize>,
}

impl TimeReport {
    /// Builds the requested series of path `pid`.
    ///
    /// Data kinds whose column the report does not carry are skipped with a
    /// note. Cells without a drive classification raise one warning each.
    pub fn bar_series(
        &self,
        pid: usize,
        request: &BarRequest,
        sink: &DiagnosticSink,
    ) -> Result<Vec<BarSeries>, AnalysisError> {
        let path = self.path(pid)?;
        let mut out = Vec::new();
        for &data in &request.data {
            if !self.has_column(data.column()) {
                sink.emit(Diagnostic::note(
                    MISSING_COLUMN,
                    format!("report has no {:?} column, {data} chart skipped", data.column()),
                    Location::DUMMY,
                ));
                continue;
            }
            for &part in &request.paths {
                if let Some(series) = self.one_series(path, data, part, sink) {
                    out.push(series);
                }
            }
        }
        Ok(out)
    }

    fn one_series(
        &self,
        path: &TimePath,
        data: BarData,
        part: BarPath,
        sink: &DiagnosticSink,
    ) -> Option<BarSeries> {
        let (side, range, highlight) = match (part, path.spin) {
            (BarPath::Launch, Some(spin)) => (&path.lpath, 0..spin + 1, Some(spin)),
            (BarPath::Launch, None) => return None,
            (BarPath::Data, Some(spin)) => (&path.lpath, spin..path.lpath.len(), Some(0)),
            (BarPath::Data, None) | (BarPath::Full, None) => (&path.lpath, 0..path.lpath.len(), None),
            (BarPath::Full, Some(spin)) => (&path.lpath, 0..path.lpath.len(), Some(spin)),
            (BarPath::Capture, _) => (&path.cpath, 0..path.cpath.len(), None),
        };
        if range.is_empty() {
            return None;
        }

        let rules = self.rules();
        let tags: Vec<String> = if data == BarData::CellType {
            sticky_tags(side.iter().map(|p| p.cell.as_str()), &rules.cell_classes, None)
                .into_iter()
                .map(|t| t.unwrap_or(UNCLASSIFIED_CELL_TAG).to_string())
                .collect()
        } else {
            sticky_tags(
                side.iter().map(|p| p.name.as_str()),
                &rules.path_classes,
                rules.default_path_class(),
            )
            .into_iter()
            .map(|t| t.unwrap_or(UNCLASSIFIED_PATH_TAG).to_string())
            .collect()
        };

        let pins: &[Pin] = &side[range.clone()];
        let value = data.column().pin_value()?;
        let drive = if data == BarData::CellType {
            pins.iter()
                .map(|pin| {
                    if pin.drv.is_none() && !pin.is_port() {
                        sink.emit(Diagnostic::warning(
                            UNKNOWN_DRIVE_CELL,
                            format!("unknown driving cell '{}' ({})", pin.cell, pin.name),
                            Location::DUMMY,
                        ).with_note(format!("report line {}", pin.ln)));
                    }
                    pin.drv
                })
                .collect()
        } else {
            Vec::new()
        };

        Some(BarSeries {
            data,
            path: part,
            title: format!("{data} of {part} ({} -> {})", path.startpoint, path.endpoint),
            names: pins.iter().map(|p| p.name.clone()).collect(),
            lines: pins.iter().map(|p| p.ln).collect(),
            values: pins.iter().map(value).collect(),
            tags: tags[range].to_vec(),
            drive,
            highlight,
        })
    }
}
