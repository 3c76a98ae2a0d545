//! Line-oriented scanner for `report_timing` text.
//!
//! Each path block is read with a small state machine:
//!
//! - header: `Startpoint:`, `Endpoint:`, `Path Group:`, `Path Type:`,
//!   `Scenario:` and wrapped `(...)` descriptions
//! - launch table: launch clock rows, then data-path pins, closed by
//!   `data arrival time`
//! - capture table: capture clock rows and pins, closed by
//!   `data required time`
//! - summary: skipped until `slack`, which commits the path
//!
//! Pin-table values are placed by the column layout of the most recent
//! `Point ...` header. Lines that are not recognized are skipped; a
//! recognized row that lacks a required number is a [`ReportError::Format`].

use crate::error::ReportError;
use crate::model::{ClockEdge, ColumnKind, DelayType, PathStyle, Pin, ReportOption, TimePath};
use crate::report::ScanRange;
use indexmap::IndexMap;
use ptana_config::RuleSet;
use ptana_source::SourceFile;
use std::collections::BTreeSet;

/// Report-wide facts found before the first path.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ReportHeader {
    /// `-path_type` of the report command.
    pub style: Option<PathStyle>,
    /// `-through` pins of the report command.
    pub through: Vec<String>,
}

/// Reads the report header, i.e. every line before the first `Startpoint:`.
pub(crate) fn scan_header(file: &SourceFile) -> ReportHeader {
    let mut header = ReportHeader::default();
    for (_, text) in file.lines_from(1) {
        if text.trim_start().starts_with("Startpoint:") {
            break;
        }
        let mut words = text.split_whitespace().peekable();
        while let Some(word) = words.next() {
            match word {
                "-path_type" | "-path" => {
                    if let Some(style) = words.next().and_then(PathStyle::from_arg) {
                        header.style = Some(style);
                    }
                }
                "-through" | "-thr" => {
                    while let Some(arg) = words.next_if(|w| !w.starts_with('-')) {
                        let pin = arg.trim_matches(|c| c == '{' || c == '}');
                        if !pin.is_empty() {
                            header.through.push(pin.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
    }
    header
}

/// Scans ranges of one report with one rule set.
pub(crate) struct ReportScanner<'a> {
    file: &'a SourceFile,
    rules: &'a RuleSet,
    through: &'a [String],
}

impl<'a> ReportScanner<'a> {
    pub(crate) fn new(file: &'a SourceFile, rules: &'a RuleSet, through: &'a [String]) -> Self {
        Self {
            file,
            rules,
            through,
        }
    }

    /// Collects the complete paths of one range.
    pub(crate) fn scan(
        &self,
        range: &ScanRange,
        opt: &mut BTreeSet<ReportOption>,
    ) -> Result<Vec<TimePath>, ReportError> {
        let total = self.file.line_count();
        let last_line = range.end.map_or(total, |end| end.min(total));
        let limit = range.count.unwrap_or(usize::MAX);
        let mut paths = Vec::new();
        let mut current: Option<PathBuilder<'_>> = None;

        if limit == 0 {
            return Ok(paths);
        }

        for (ln, text) in self.file.lines_from(range.start) {
            if ln > last_line {
                break;
            }
            if let Some(startpoint) = text.trim_start().strip_prefix("Startpoint:") {
                if let Some(pending) = current.take() {
                    if pending.is_complete() {
                        paths.push(pending.finish(self.through));
                        if paths.len() >= limit {
                            return Ok(paths);
                        }
                    }
                }
                current = Some(PathBuilder::new(ln, startpoint, self.rules));
                continue;
            }
            let Some(builder) = current.as_mut() else {
                continue;
            };
            if builder.feed(ln, text, opt)? == Feed::Done {
                if let Some(done) = current.take() {
                    paths.push(done.finish(self.through));
                }
                if paths.len() >= limit {
                    return Ok(paths);
                }
            }
        }

        let cut_short = range.end.is_some_and(|end| end < total);
        if let Some(pending) = current {
            if !cut_short && pending.is_complete() {
                paths.push(pending.finish(self.through));
            }
        }
        Ok(paths)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum Stage {
    Header,
    Launch,
    Capture,
    Summary,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Feed {
    Continue,
    Done,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum HeaderField {
    Startpoint,
    Endpoint,
    Other,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum RowKind {
    SourceLatency,
    NetworkDelay,
    InputDelay,
    OutputDelay,
    Crpr,
    Uncertainty,
    Library,
    ConstraintDelay,
    PathMargin,
    Arrival,
    Required,
    Slack,
}

const ROW_LABELS: &[(&str, RowKind)] = &[
    ("clock source latency", RowKind::SourceLatency),
    ("clock network delay", RowKind::NetworkDelay),
    ("clock reconvergence pessimism", RowKind::Crpr),
    ("clock uncertainty", RowKind::Uncertainty),
    ("inter-clock uncertainty", RowKind::Uncertainty),
    ("input external delay", RowKind::InputDelay),
    ("output external delay", RowKind::OutputDelay),
    ("library setup time", RowKind::Library),
    ("library hold time", RowKind::Library),
    ("max_delay", RowKind::ConstraintDelay),
    ("min_delay", RowKind::ConstraintDelay),
    ("path margin", RowKind::PathMargin),
    ("data arrival time", RowKind::Arrival),
    ("data required time", RowKind::Required),
    ("slack", RowKind::Slack),
];

enum Row<'t> {
    Labeled(RowKind, &'t str),
    ClockEdge {
        clock: &'t str,
        edge: ClockEdge,
        rest: &'t str,
    },
}

/// Recognizes the non-pin rows of a pin table. `rest` is the text after the label.
fn classify_row(trimmed: &str) -> Option<Row<'_>> {
    for (label, kind) in ROW_LABELS {
        if let Some(rest) = trimmed.strip_prefix(label) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Some(Row::Labeled(*kind, rest));
            }
        }
    }
    let rest = trimmed.strip_prefix("clock ")?;
    for (marker, edge) in [("(rise edge)", ClockEdge::Rise), ("(fall edge)", ClockEdge::Fall)] {
        if let Some(pos) = rest.find(marker) {
            return Some(Row::ClockEdge {
                clock: rest[..pos].trim(),
                edge,
                rest: &rest[pos + marker.len()..],
            });
        }
    }
    None
}

#[derive(Clone, Copy, Debug)]
struct Token<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    text: &line[s..i],
                    start: s,
                    end: i,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &line[s..],
            start: s,
            end: line.len(),
        });
    }
    tokens
}

fn format_error(line: usize, reason: impl Into<String>) -> ReportError {
    ReportError::Format {
        line,
        reason: reason.into(),
    }
}

fn looks_numeric(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-' | '+' | '.') => chars.next().is_some_and(|c| c.is_ascii_digit() || c == '.'),
        _ => false,
    }
}

/// Parses a value token, dropping annotation marks such as `&` or `*`.
fn parse_number(text: &str, line: usize) -> Result<f64, ReportError> {
    text.trim_end_matches(['&', '*', 'H', '^', '@', '$'])
        .parse()
        .map_err(|_| format_error(line, format!("invalid number '{text}'")))
}

/// Values of a labeled row, skipping a leading `(...)` qualifier.
fn row_values(rest: &str, line: usize) -> Result<Vec<f64>, ReportError> {
    let mut rest = rest.trim_start();
    if rest.starts_with('(') {
        rest = rest.find(')').map_or("", |pos| &rest[pos + 1..]);
    }
    rest.split_whitespace()
        .filter(|tok| looks_numeric(tok))
        .map(|tok| parse_number(tok, line))
        .collect()
}

/// `(incr, path)` of a labeled row; a single value serves as both.
fn incr_and_path(rest: &str, line: usize, what: &str) -> Result<(f64, f64), ReportError> {
    match row_values(rest, line)?.as_slice() {
        [] => Err(format_error(line, format!("missing value for {what}"))),
        [only] => Ok((*only, *only)),
        [.., incr, path] => Ok((*incr, *path)),
    }
}

fn last_value(rest: &str, line: usize, what: &str) -> Result<f64, ReportError> {
    incr_and_path(rest, line, what).map(|(_, path)| path)
}

/// Column positions announced by a `Point ...` header line.
#[derive(Clone, Debug, Default)]
struct ColumnLayout {
    /// Column kind and the byte offset of its right edge.
    columns: Vec<(ColumnKind, usize)>,
}

impl ColumnLayout {
    fn from_header(line: &str) -> Self {
        let columns = tokenize(line)
            .into_iter()
            .skip(1)
            .map(|tok| (ColumnKind::from_header(tok.text), tok.end))
            .collect();
        Self { columns }
    }

    fn select(&self, keep: impl Fn(ColumnKind) -> bool) -> Vec<(ColumnKind, usize)> {
        self.columns
            .iter()
            .copied()
            .filter(|(kind, _)| keep(*kind))
            .collect()
    }
}

/// Places values into columns: in order when every column has a value,
/// otherwise by the nearest right edge.
fn assign_columns(values: &[(f64, usize)], columns: &[(ColumnKind, usize)]) -> Vec<(ColumnKind, f64)> {
    if values.len() == columns.len() {
        return columns
            .iter()
            .zip(values)
            .map(|((kind, _), (value, _))| (*kind, *value))
            .collect();
    }
    values
        .iter()
        .filter_map(|(value, end)| {
            columns
                .iter()
                .min_by_key(|(_, col_end)| col_end.abs_diff(*end))
                .map(|(kind, _)| (*kind, *value))
        })
        .collect()
}

struct PinRow<'t> {
    name: &'t str,
    cell: &'t str,
    gclock_source: bool,
    values: Vec<(f64, usize)>,
    location: Option<(f64, f64)>,
}

fn parse_location(group: &str) -> Option<(f64, f64)> {
    let inner = group.strip_prefix('(')?.strip_suffix(')')?;
    let (x, y) = inner.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Parses `name (cell) [(gclock source)] values... [r|f] [(x,y)]`.
///
/// Returns `None` for lines that do not have the shape of a pin row.
fn parse_pin_row(line: &str, ln: usize) -> Result<Option<PinRow<'_>>, ReportError> {
    let tokens = tokenize(line);
    if tokens.len() < 2 || !tokens[1].text.starts_with('(') {
        return Ok(None);
    }

    let mut row = PinRow {
        name: tokens[0].text,
        cell: "",
        gclock_source: false,
        values: Vec::new(),
        location: None,
    };
    let mut i = 1;
    let mut first_group = true;
    while i < tokens.len() {
        let tok = tokens[i];
        if tok.text.starts_with('(') {
            let Some(close) = (i..tokens.len()).find(|&j| tokens[j].text.ends_with(')')) else {
                return Ok(None);
            };
            let group = &line[tok.start..tokens[close].end];
            if first_group {
                row.cell = &group[1..group.len() - 1];
                first_group = false;
            } else if group == "(gclock source)" {
                row.gclock_source = true;
            } else if let Some(location) = parse_location(group) {
                row.location = Some(location);
            }
            i = close + 1;
            continue;
        }
        if looks_numeric(tok.text) {
            row.values.push((parse_number(tok.text, ln)?, tok.end));
        }
        i += 1;
    }
    Ok(Some(row))
}

fn is_port_direction(cell: &str) -> bool {
    matches!(cell, "in" | "out" | "inout")
}

/// Accumulates one path block.
struct PathBuilder<'r> {
    rules: &'r RuleSet,
    path: TimePath,
    stage: Stage,
    last_header: HeaderField,
    layout: ColumnLayout,
    start_is_port: bool,
    /// The startpoint clock pin was found; `spin` no longer moves.
    spin_fixed: bool,
    /// A library pin outside the clock network followed the current `spin`.
    left_clock_network: bool,
    last_location: Option<(f64, f64)>,
    launch_clock_cum: Option<f64>,
    capture_clock_cum: Option<f64>,
    crpr_seen: bool,
}

impl<'r> PathBuilder<'r> {
    fn new(ln: usize, startpoint: &str, rules: &'r RuleSet) -> Self {
        let mut words = startpoint.split_whitespace();
        let path = TimePath {
            ln,
            startpoint: words.next().unwrap_or_default().to_string(),
            ..TimePath::default()
        };
        Self {
            rules,
            path,
            stage: Stage::Header,
            last_header: HeaderField::Startpoint,
            layout: ColumnLayout::default(),
            start_is_port: startpoint.contains("input port"),
            spin_fixed: false,
            left_clock_network: false,
            last_location: None,
            launch_clock_cum: None,
            capture_clock_cum: None,
            crpr_seen: false,
        }
    }

    /// A path is complete once its launch side has been closed.
    fn is_complete(&self) -> bool {
        self.stage >= Stage::Capture
    }

    fn feed(
        &mut self,
        ln: usize,
        line: &str,
        opt: &mut BTreeSet<ReportOption>,
    ) -> Result<Feed, ReportError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.chars().all(|c| c == '-') {
            return Ok(Feed::Continue);
        }

        if self.stage == Stage::Header && self.header_line(trimmed) {
            return Ok(Feed::Continue);
        }

        if trimmed.starts_with("Point") {
            self.layout = ColumnLayout::from_header(line);
            opt.extend(
                self.layout
                    .columns
                    .iter()
                    .filter(|(kind, _)| *kind != ColumnKind::Other)
                    .map(|(kind, _)| ReportOption::Column(*kind)),
            );
            self.stage = self.stage.max(Stage::Launch);
            return Ok(Feed::Continue);
        }

        if self.stage == Stage::Summary {
            if let Some(Row::Labeled(RowKind::Slack, rest)) = classify_row(trimmed) {
                self.path.slack = last_value(rest, ln, "slack")?;
                return Ok(Feed::Done);
            }
            return Ok(Feed::Continue);
        }

        match classify_row(trimmed) {
            Some(Row::ClockEdge { clock, edge, rest }) => {
                self.stage = self.stage.max(Stage::Launch);
                let value = last_value(rest, ln, "clock edge")?;
                if self.stage == Stage::Launch {
                    self.path.launch_clock = Some(clock.to_string());
                    self.path.launch_edge = Some(edge);
                    self.path.launch_edge_value = value;
                    self.launch_clock_cum = Some(value);
                } else {
                    self.path.capture_clock = Some(clock.to_string());
                    self.path.capture_edge = Some(edge);
                    self.path.capture_edge_value = value;
                    self.capture_clock_cum = Some(value);
                }
                Ok(Feed::Continue)
            }
            Some(Row::Labeled(kind, rest)) => {
                self.stage = self.stage.max(Stage::Launch);
                self.labeled_row(kind, rest, ln)
            }
            None => {
                if let Some(row) = parse_pin_row(line, ln)? {
                    self.stage = self.stage.max(Stage::Launch);
                    self.pin_row(row, ln)?;
                }
                Ok(Feed::Continue)
            }
        }
    }

    /// Handles header-only lines; returns `false` for anything else.
    fn header_line(&mut self, trimmed: &str) -> bool {
        let field = |prefix: &str| trimmed.strip_prefix(prefix).map(str::trim);
        if let Some(endpoint) = field("Endpoint:") {
            self.path.endpoint = endpoint
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            self.last_header = HeaderField::Endpoint;
        } else if let Some(group) = field("Path Group:") {
            self.path.group = group.to_string();
            self.last_header = HeaderField::Other;
        } else if let Some(kind) = field("Path Type:") {
            self.path.delay_type = if kind.starts_with("min") {
                DelayType::Min
            } else {
                DelayType::Max
            };
            self.last_header = HeaderField::Other;
        } else if let Some(scenario) = field("Scenario:") {
            self.path.scenario = Some(scenario.to_string());
            self.last_header = HeaderField::Other;
        } else if trimmed.starts_with('(') {
            if self.last_header == HeaderField::Startpoint && trimmed.contains("input port") {
                self.start_is_port = true;
            }
        } else if trimmed.contains(':') && !trimmed.starts_with("Point") {
            self.last_header = HeaderField::Other;
        } else {
            return false;
        }
        true
    }

    fn labeled_row(&mut self, kind: RowKind, rest: &str, ln: usize) -> Result<Feed, ReportError> {
        let launch = self.stage == Stage::Launch;
        match kind {
            RowKind::SourceLatency => {
                let (incr, cum) = incr_and_path(rest, ln, "clock source latency")?;
                if launch {
                    self.path.launch_source_latency = incr;
                    self.launch_clock_cum = Some(cum);
                } else {
                    self.path.capture_source_latency = incr;
                    self.capture_clock_cum = Some(cum);
                }
            }
            RowKind::NetworkDelay => {
                let cum = last_value(rest, ln, "clock network delay")?;
                if launch {
                    self.launch_clock_cum = Some(cum);
                } else if !self.crpr_seen {
                    self.capture_clock_cum = Some(cum);
                }
            }
            RowKind::InputDelay => {
                self.path.input_delay = incr_and_path(rest, ln, "input external delay")?.0;
                self.path.has_input_delay = true;
            }
            RowKind::OutputDelay => {
                self.path.output_delay = incr_and_path(rest, ln, "output external delay")?.0;
                self.path.has_output_delay = true;
            }
            RowKind::Crpr => {
                self.path.crpr = incr_and_path(rest, ln, "clock reconvergence pessimism")?.0;
                self.crpr_seen = true;
            }
            RowKind::Uncertainty => {
                self.path.uncertainty = incr_and_path(rest, ln, "clock uncertainty")?.0;
            }
            RowKind::Library => {
                self.path.library = incr_and_path(rest, ln, "library time")?.0;
            }
            RowKind::ConstraintDelay => {
                self.path.max_delay = incr_and_path(rest, ln, "path delay constraint")?.0;
                self.path.has_max_delay = true;
            }
            RowKind::PathMargin => {
                self.path.path_margin = incr_and_path(rest, ln, "path margin")?.0;
                self.path.has_path_margin = true;
            }
            RowKind::Arrival => {
                if launch {
                    self.path.arrival = last_value(rest, ln, "data arrival time")?;
                    self.stage = Stage::Capture;
                    self.last_location = None;
                }
            }
            RowKind::Required => {
                if self.stage == Stage::Capture {
                    self.path.required = last_value(rest, ln, "data required time")?;
                    self.stage = Stage::Summary;
                }
            }
            RowKind::Slack => {
                if self.stage >= Stage::Capture {
                    self.path.slack = last_value(rest, ln, "slack")?;
                    return Ok(Feed::Done);
                }
            }
        }
        Ok(Feed::Continue)
    }

    fn pin_row(&mut self, row: PinRow<'_>, ln: usize) -> Result<(), ReportError> {
        if row.cell == "net" {
            let columns = self
                .layout
                .select(|k| matches!(k, ColumnKind::Fanout | ColumnKind::Cap));
            let cap = assign_columns(&row.values, &columns)
                .into_iter()
                .find(|(kind, _)| *kind == ColumnKind::Cap);
            let side = if self.stage == Stage::Launch {
                &mut self.path.lpath
            } else {
                &mut self.path.cpath
            };
            if let (Some((_, cap)), Some(prev)) = (cap, side.last_mut()) {
                prev.cap = cap;
            }
            return Ok(());
        }

        let cell = if is_port_direction(row.cell) { "" } else { row.cell };
        let mut pin = Pin {
            name: row.name.to_string(),
            cell: cell.to_string(),
            ln,
            ..Pin::default()
        };
        let extra = match row.values.as_slice() {
            [] => return Err(format_error(ln, format!("pin '{}' has no delay value", row.name))),
            [(path, _)] => {
                pin.cumulative = *path;
                &[][..]
            }
            [extra @ .., (incr, _), (path, _)] => {
                pin.incr = *incr;
                pin.cumulative = *path;
                extra
            }
        };
        let columns = self.layout.select(|k| {
            !matches!(
                k,
                ColumnKind::Incr | ColumnKind::Path | ColumnKind::Location | ColumnKind::Fanout
            )
        });
        for (kind, value) in assign_columns(extra, &columns) {
            match kind {
                ColumnKind::Cap => pin.cap = value,
                ColumnKind::Trans => pin.tran = value,
                ColumnKind::Delta => pin.delta = value,
                _ => {}
            }
        }

        pin.is_clock = self.rules.is_clock_pin(&pin.name, &pin.cell);
        if !pin.is_port() {
            pin.drv = self.rules.drive_classes.classify(&pin.cell);
        }
        if let Some((x, y)) = row.location {
            pin.phy = self
                .last_location
                .map_or(0.0, |(px, py)| (x - px).abs() + (y - py).abs());
            self.last_location = Some((x, y));
        }

        if self.stage == Stage::Launch {
            let idx = self.path.lpath.len();
            if !self.spin_fixed {
                self.place_spin(&pin, idx);
                if row.gclock_source && self.path.spin.map_or(true, |spin| spin >= idx) {
                    self.path.sgpi = Some(idx);
                }
            }
            note_hold_check(&mut self.path.hcd, self.rules, self.path.lpath.last(), &pin);
            self.path.lpath.push(pin);
        } else {
            if row.gclock_source {
                self.path.egpi = Some(self.path.cpath.len());
            }
            if !self.crpr_seen {
                self.capture_clock_cum = Some(pin.cumulative);
            }
            note_hold_check(&mut self.path.hcd, self.rules, self.path.cpath.last(), &pin);
            self.path.cpath.push(pin);
        }
        Ok(())
    }

    /// Moves `spin` along the launch clock network.
    ///
    /// The startpoint's own clock pin fixes `spin`. Until it shows up,
    /// `spin` follows the last clock-classified pin of the contiguous
    /// clock-network prefix.
    fn place_spin(&mut self, pin: &Pin, idx: usize) {
        let sp = self.path.startpoint.as_str();
        if pin.is_port() && pin.name == sp {
            self.start_is_port = true;
        }
        if self.start_is_port || pin.is_port() {
            return;
        }
        if pin.instance() == sp || pin.name == sp {
            self.path.spin = Some(idx);
            self.spin_fixed = true;
        } else if pin.is_clock && !self.left_clock_network {
            self.path.spin = Some(idx);
        } else if !pin.is_clock && self.path.spin.is_some() {
            self.left_clock_network = true;
        }
    }

    fn finish(self, through: &[String]) -> TimePath {
        let mut path = self.path;
        path.thp = through.to_vec();
        if let (Some(sgpi), Some(spin)) = (path.sgpi, path.spin) {
            if sgpi > spin {
                path.sgpi = None;
            }
        }

        let launch_cum = match path.spin {
            Some(spin) => path.lpath[spin].cumulative,
            None => self.launch_clock_cum.unwrap_or(path.launch_edge_value),
        };
        path.launch_latency = launch_cum - path.launch_edge_value;
        path.capture_latency =
            self.capture_clock_cum.unwrap_or(path.capture_edge_value) - path.capture_edge_value;

        let delta_sum = |pins: &[Pin]| pins.iter().map(|p| p.delta).sum::<f64>();
        path.launch_delta = delta_sum(path.launch_clock_pins());
        path.data_delta = delta_sum(path.data_pins());
        path.capture_delta = delta_sum(path.capture_clock_pins());

        tracing::debug!(
            ln = path.ln,
            startpoint = %path.startpoint,
            endpoint = %path.endpoint,
            "committed path"
        );
        path
    }
}

/// Adds the delay of a described cell arc (previous pin → `pin` on one instance).
fn note_hold_check(hcd: &mut IndexMap<String, f64>, rules: &RuleSet, prev: Option<&Pin>, pin: &Pin) {
    let Some(prev) = prev else {
        return;
    };
    if pin.instance().is_empty() || prev.instance() != pin.instance() {
        return;
    }
    if let Some(tag) = rules.hold_check_tag(&pin.cell, prev.pin_name(), pin.pin_name()) {
        *hcd.entry(tag.to_string()).or_insert(0.0) += pin.incr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptana_config::compile_rules_str;
    use ptana_diagnostics::DiagnosticSink;
    use ptana_source::FileId;
    use std::path::PathBuf;

    fn file(text: &str) -> SourceFile {
        SourceFile::new(FileId::from_raw(0), PathBuf::from("t.rpt"), text.to_string())
    }

    fn scan(text: &str, rules: &str) -> Vec<TimePath> {
        let rules = compile_rules_str(rules, &DiagnosticSink::new()).unwrap();
        let file = file(text);
        let header = scan_header(&file);
        let mut opt = BTreeSet::new();
        ReportScanner::new(&file, &rules, &header.through)
            .scan(&ScanRange::whole(), &mut opt)
            .unwrap()
    }

    fn row(point: &str, values: &[&str], tail: &str) -> String {
        let cols: String = values.iter().map(|v| format!("{v:>10}")).collect();
        format!("  {point:<28}{cols} {tail}")
    }

    #[test]
    fn header_style_and_through_pins() {
        let f = file(
            "Report : timing\n  -path_type full_clock\n  -through {a/b c/d} -max_paths 3\n\
             Startpoint: x\n  -path_type full\n",
        );
        let header = scan_header(&f);
        assert_eq!(header.style, Some(PathStyle::FullClock));
        assert_eq!(header.through, vec!["a/b", "c/d"]);
    }

    #[test]
    fn numbers_and_annotations() {
        assert!(looks_numeric("-0.5"));
        assert!(looks_numeric(".25"));
        assert!(!looks_numeric("-"));
        assert!(!looks_numeric("r"));
        assert_eq!(parse_number("0.1234&", 1).unwrap(), 0.1234);
        assert!(matches!(
            parse_number("1.2.3", 7),
            Err(ReportError::Format { line: 7, .. })
        ));
        assert_eq!(row_values(" (ideal)  0.5000  0.7500", 1).unwrap(), vec![0.5, 0.75]);
        assert_eq!(incr_and_path(" 0.4000", 1, "x").unwrap(), (0.4, 0.4));
    }

    #[test]
    fn row_labels() {
        assert!(matches!(
            classify_row("clock reconvergence pessimism   0.01  1.0"),
            Some(Row::Labeled(RowKind::Crpr, _))
        ));
        assert!(matches!(
            classify_row("slack (VIOLATED)  -0.1"),
            Some(Row::Labeled(RowKind::Slack, _))
        ));
        assert!(classify_row("slacker/Z (BUF)  0.1  0.2").is_none());
        match classify_row("clock sys_clk' (fall edge)  5.0  5.0") {
            Some(Row::ClockEdge { clock, edge, .. }) => {
                assert_eq!(clock, "sys_clk'");
                assert_eq!(edge, ClockEdge::Fall);
            }
            _ => panic!("expected a clock edge row"),
        }
    }

    #[test]
    fn pin_row_groups() {
        let line = "  gen/Q (DFFX1) (gclock source)   0.0500   0.2000   1.2000 r (3.0,4.0)";
        let row = parse_pin_row(line, 1).unwrap().unwrap();
        assert_eq!(row.name, "gen/Q");
        assert_eq!(row.cell, "DFFX1");
        assert!(row.gclock_source);
        assert_eq!(row.location, Some((3.0, 4.0)));
        assert_eq!(row.values.len(), 3);
        assert!(parse_pin_row("  Startpoint text", 1).unwrap().is_none());
    }

    #[test]
    fn sparse_values_land_in_nearest_column() {
        let columns = [(ColumnKind::Cap, 20), (ColumnKind::Trans, 30)];
        let placed = assign_columns(&[(0.7, 29)], &columns);
        assert_eq!(placed, vec![(ColumnKind::Trans, 0.7)]);
        let placed = assign_columns(&[(0.1, 5), (0.2, 6)], &columns);
        assert_eq!(placed, vec![(ColumnKind::Cap, 0.1), (ColumnKind::Trans, 0.2)]);
    }

    #[test]
    fn input_port_path_has_no_clock_pin() {
        let text = [
            "Startpoint: in1 (input port clocked by clk)".to_string(),
            "Endpoint: ff2 (rising edge-triggered flip-flop clocked by clk)".to_string(),
            "Path Group: clk".to_string(),
            "Path Type: min".to_string(),
            row("Point", &["Incr", "Path"], ""),
            row("clock clk (rise edge)", &["0.0000", "0.0000"], ""),
            row("input external delay", &["0.2000", "0.2000"], "f"),
            row("in1 (in)", &["0.0000", "0.2000"], "f"),
            row("u1/Z (BUFX2)", &["0.1000", "0.3000"], "f"),
            row("ff2/D (DFFX1)", &["0.0000", "0.3000"], "f"),
            row("data arrival time", &["", "0.3000"], ""),
            row("clock clk (rise edge)", &["0.0000", "0.0000"], ""),
            row("clock network delay (ideal)", &["0.5000", "0.5000"], ""),
            row("ff2/CK (DFFX1)", &["0.0000", "0.5000"], "r"),
            row("library hold time", &["0.0200", "0.5200"], ""),
            row("data required time", &["", "0.5200"], ""),
            row("slack (VIOLATED)", &["", "-0.2200"], ""),
        ]
        .join("\n");
        let paths = scan(&text, "");
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert_eq!(path.delay_type, DelayType::Min);
        assert_eq!(path.spin, None);
        assert!(path.has_input_delay);
        assert!((path.input_delay - 0.2).abs() < 1e-9);
        assert_eq!(path.data_pins().len(), 3);
        assert!((path.launch_latency).abs() < 1e-9);
        assert!((path.capture_latency - 0.5).abs() < 1e-9);
        assert!((path.library - 0.02).abs() < 1e-9);
        assert!((path.slack + 0.22).abs() < 1e-9);
    }

    fn gclock_report() -> String {
        [
            "Startpoint: ff1 (rising edge-triggered flip-flop clocked by gclk)".to_string(),
            "Endpoint: ff2 (rising edge-triggered flip-flop clocked by gclk)".to_string(),
            row("Point", &["Fanout", "Cap", "Incr", "Path"], ""),
            row("clock gclk (rise edge)", &["", "", "0.0000", "0.0000"], ""),
            row("clk (in)", &["", "", "0.0000", "0.0000"], "r"),
            row("div/CK (DFFX1)", &["", "", "0.1000", "0.1000"], "r"),
            row("div/Q (DFFX1) (gclock source)", &["", "", "0.2000", "0.3000"], "r"),
            row("n1 (net)", &["2", "0.0150", "", ""], ""),
            row("ff1/CK (DFFX1)", &["", "", "0.0500", "0.3500"], "r"),
            row("ff1/Q (DFFX1)", &["", "", "0.3000", "0.6500"], "f"),
            row("data arrival time", &["", "", "", "0.6500"], ""),
            row("clock gclk (rise edge)", &["", "", "4.0000", "4.0000"], ""),
            row("clk (in)", &["", "", "0.0000", "4.0000"], "r"),
            row("div/CK (DFFX1)", &["", "", "0.1000", "4.1000"], "r"),
            row("div/Q (DFFX1) (gclock source)", &["", "", "0.2000", "4.3000"], "r"),
            row("ff2/CK (DFFX1)", &["", "", "0.0400", "4.3400"], "r"),
            row("data required time", &["", "", "", "4.3400"], ""),
            row("slack (MET)", &["", "", "", "3.6900"], ""),
        ]
        .join("\n")
    }

    #[test]
    fn nets_and_generated_clock_sources() {
        let paths = scan(&gclock_report(), "");
        let path = &paths[0];
        assert_eq!(path.sgpi, Some(2));
        assert_eq!(path.egpi, Some(2));
        assert_eq!(path.spin, Some(3));
        assert!((path.lpath[2].cap - 0.015).abs() < 1e-9);
        assert_eq!(path.launch_gclock_len(), Some(1));
        assert_eq!(path.capture_gclock_len(), 1);
        assert!((path.launch_latency - 0.35).abs() < 1e-9);
        assert!((path.capture_latency - 0.34).abs() < 1e-9);
    }

    fn buffered_clock_report(startpoint: &str) -> String {
        [
            format!("Startpoint: {startpoint} (rising edge-triggered flip-flop clocked by clk)"),
            "Endpoint: ff2 (rising edge-triggered flip-flop clocked by clk)".to_string(),
            row("Point", &["Incr", "Path"], ""),
            row("clock clk (rise edge)", &["0.0000", "0.0000"], ""),
            row("clk (in)", &["0.0000", "0.0000"], "r"),
            row("cb/Z (CKBUFX4)", &["0.2000", "0.2000"], "r"),
            row("cb2/Z (CKBUFX4)", &["0.1000", "0.3000"], "r"),
            row("ff1/CK (DFFX1)", &["0.0000", "0.3000"], "r"),
            row("ff1/Q (DFFX1)", &["0.3000", "0.6000"], "f"),
            row("u1/Z (CKBUFX4)", &["0.1000", "0.7000"], "f"),
            row("ff2/D (DFFX1)", &["0.0000", "0.7000"], "f"),
            row("data arrival time", &["", "0.7000"], ""),
            row("clock clk (rise edge)", &["2.0000", "2.0000"], ""),
            row("clk (in)", &["0.0000", "2.0000"], "r"),
            row("cb/Z (CKBUFX4)", &["0.2000", "2.2000"], "r"),
            row("ff2/CK (DFFX1)", &["0.0000", "2.2000"], "r"),
            row("data required time", &["", "2.2000"], ""),
            row("slack (MET)", &["", "1.5000"], ""),
        ]
        .join("\n")
    }

    #[test]
    fn clock_pin_rules_keep_spin_on_startpoint_clock_pin() {
        let text = buffered_clock_report("ff1");
        let plain = &scan(&text, "")[0];
        assert_eq!(plain.spin, Some(3));
        assert!(plain.lpath.iter().all(|p| !p.is_clock));

        let classified = &scan(&text, "ckp: c CKBUFX4\n")[0];
        assert_eq!(classified.spin, Some(3));
        assert_eq!(classified.lpath[3].name, "ff1/CK");
        assert!(classified.lpath[1].is_clock && classified.lpath[2].is_clock);
        assert!(classified.lpath[5].is_clock);
        assert_eq!(classified.datapath_level(), plain.datapath_level());
        assert!((classified.launch_latency - 0.3).abs() < 1e-9);
    }

    #[test]
    fn clock_overrides_and_non_clock_cell_toggle() {
        let text = buffered_clock_report("ff1");
        let overridden = &scan(&text, "ckp: c CKBUFX4\nckm: CKBUF.*\n")[0];
        assert!(!overridden.lpath[1].is_clock);
        assert_eq!(overridden.spin, Some(3));

        let rules = "ckm_with_non_clock_cell: true\nckt: y CKBUF.*\n\
                     ckp: c CKBUFX4 DFFX1\nckm: (CKBUF|DFF).*\n";
        let limited = &scan(&text, rules)[0];
        assert!(!limited.lpath[1].is_clock);
        assert!(limited.lpath[3].is_clock);
        assert_eq!(limited.spin, Some(3));
    }

    #[test]
    fn spin_follows_clock_network_without_startpoint_pin() {
        let path = &scan(&buffered_clock_report("top/ff1"), "ckp: c CKBUFX4\n")[0];
        assert_eq!(path.spin, Some(2));
        assert_eq!(path.lpath[2].name, "cb2/Z");
        assert!(path.lpath[5].is_clock);
        assert_eq!(path.datapath_level(), 4);
    }

    #[test]
    fn generated_clock_source_stays_before_spin_with_clock_rules() {
        let path = &scan(&gclock_report(), "ckp: c DFFX1\n")[0];
        assert_eq!(path.spin, Some(3));
        assert_eq!(path.sgpi, Some(2));
        assert_eq!(path.launch_gclock_len(), Some(1));
    }

    #[test]
    fn incomplete_trailing_path_is_dropped() {
        let text = [
            "Startpoint: ff1 (rising edge-triggered flip-flop clocked by clk)".to_string(),
            "Endpoint: ff2 (rising edge-triggered flip-flop clocked by clk)".to_string(),
            row("Point", &["Incr", "Path"], ""),
            row("ff1/CK (DFFX1)", &["0.0000", "0.0000"], "r"),
        ]
        .join("\n");
        assert!(scan(&text, "").is_empty());
    }
}
