//! Per-path text summary.
//!
//! Layout: a path banner, then the slack block, the clock block, the delta
//! totals and the segment block, each enabled by a flag or a rules toggle.

use std::error::Error;
use std::io::Write;

use ptana_config::Toggle;
use ptana_timing::check::ClockCheck;
use ptana_timing::series::UNCLASSIFIED_PATH_TAG;
use ptana_timing::{
    AnalysisError, CheckStatus, ColumnKind, DelayType, PathStyle, Segment, TimePath, TimeReport,
};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Sections requested on the command line, on top of the rules toggles.
#[derive(Clone, Copy, Debug, Default)]
pub struct SummaryOptions {
    /// Run the clock-path check.
    pub clock_check: bool,
    /// Keep the clock-check trace.
    pub trace: bool,
    /// Print delta totals.
    pub delta_sum: bool,
    /// Print segments.
    pub segments: bool,
}

/// Writes path summaries of one report.
pub struct SummaryWriter<'a> {
    report: &'a TimeReport,
    options: SummaryOptions,
}

/// Formats a value with a leading blank in place of a plus sign.
pub fn signed(value: f64) -> String {
    let text = format!("{value:.4}");
    if text.starts_with('-') {
        text
    } else {
        format!(" {text}")
    }
}

fn field(out: &mut impl Write, label: &str, value: f64) -> std::io::Result<()> {
    writeln!(out, " {label:<26}{}", signed(value))
}

fn clock_label(path: &TimePath, launch: bool) -> String {
    let (edge, clock) = if launch {
        (path.launch_edge, path.launch_clock.as_deref())
    } else {
        (path.capture_edge, path.capture_clock.as_deref())
    };
    let edge = edge.map_or_else(|| "-".to_string(), |e| e.to_string());
    format!("({edge} {})", clock.unwrap_or("-"))
}

/// Startpoint pin name: the launch clock pin, else the header startpoint.
pub fn start_name(path: &TimePath) -> &str {
    path.spin
        .and_then(|spin| path.lpath.get(spin))
        .map_or(path.startpoint.as_str(), |pin| pin.name.as_str())
}

/// Endpoint pin name: the last launch-side pin, else the header endpoint.
pub fn end_name(path: &TimePath) -> &str {
    path.lpath
        .last()
        .map_or(path.endpoint.as_str(), |pin| pin.name.as_str())
}

impl<'a> SummaryWriter<'a> {
    /// Creates a writer over `report`.
    pub fn new(report: &'a TimeReport, options: SummaryOptions) -> Self {
        Self { report, options }
    }

    fn toggle(&self, toggle: Toggle) -> bool {
        self.report.rules().toggle(toggle)
    }

    /// Writes the summary of path `pid` and returns its clock check, if run.
    pub fn write_path(
        &self,
        out: &mut impl Write,
        pid: usize,
    ) -> Result<Option<ClockCheck>, Box<dyn Error>> {
        let path = self.report.path(pid)?;
        self.write_banner(out, path)?;
        if self.toggle(Toggle::SlackOnReport) {
            self.write_slack(out, path)?;
        }
        let check = self.write_clock(out, pid, path)?;
        if self.options.delta_sum || self.toggle(Toggle::DeltaSumEnable) {
            self.write_delta(out, path)?;
        }
        if self.options.segments || self.toggle(Toggle::PathSegmentEnable) {
            self.write_segments(out, pid, path)?;
        }
        writeln!(out)?;
        Ok(check)
    }

    fn write_banner(&self, out: &mut impl Write, path: &TimePath) -> std::io::Result<()> {
        let stp = start_name(path);
        let edp = end_name(path);
        let width = stp.len().max(edp.len());

        writeln!(out, " {RULE}")?;
        if path.has_max_delay {
            writeln!(out, " Startpoint: {stp}")?;
            writeln!(out, " Endpoint:   {edp}")?;
        } else if width > 80 {
            writeln!(out, " Startpoint: {stp}")?;
            writeln!(out, "             {}", clock_label(path, true))?;
            writeln!(out, " Endpoint:   {edp}")?;
            writeln!(out, "             {}", clock_label(path, false))?;
        } else {
            writeln!(out, " Startpoint: {stp:<width$} {}", clock_label(path, true))?;
            writeln!(out, " Endpoint:   {edp:<width$} {}", clock_label(path, false))?;
        }
        writeln!(out, " Path group: {}", path.group)?;
        writeln!(out, " Delay type: {}", path.delay_type)?;
        if let Some(scenario) = &path.scenario {
            writeln!(out, " Scenario:   {scenario}")?;
        }
        if self.toggle(Toggle::ThroughPinOnReport) && !path.thp.is_empty() {
            writeln!(out, " {THIN_RULE}")?;
            for pin in &path.thp {
                writeln!(out, " Through:    {pin}")?;
            }
        }
        writeln!(out, " {RULE}")
    }

    fn write_slack(&self, out: &mut impl Write, path: &TimePath) -> std::io::Result<()> {
        let uncertainty = self.toggle(Toggle::ClockUncertaintyOnReport);
        let library = self.toggle(Toggle::LibraryRequiredOnReport);

        field(out, "data latency:", path.data_latency())?;
        field(out, "arrival:", path.arrival)?;
        field(out, "required:", path.required)?;
        field(out, "slack:", path.slack)?;
        if path.has_input_delay
            || path.has_output_delay
            || path.has_path_margin
            || path.has_hcd()
            || uncertainty
            || library
        {
            writeln!(out, " {THIN_RULE}")?;
        }
        if uncertainty {
            field(out, "clock uncertainty:", path.uncertainty)?;
        }
        if library && !path.has_output_delay {
            let label = match path.delay_type {
                DelayType::Max => "library setup:",
                DelayType::Min => "library hold:",
            };
            field(out, label, path.library)?;
        }
        if path.has_input_delay {
            field(out, "input delay:", path.input_delay)?;
        }
        if path.has_output_delay {
            field(out, "output delay:", -path.output_delay)?;
        }
        if path.has_path_margin {
            field(out, "path margin:", path.path_margin)?;
        }
        for (tag, value) in &path.hcd {
            field(out, &format!("{tag}:"), *value)?;
        }
        if self.toggle(Toggle::DatapathLevelOnReport) {
            writeln!(out, " {:<26} {}", "datapath level:", path.datapath_level())?;
        }
        writeln!(out, " {RULE}")
    }

    fn write_clock(
        &self,
        out: &mut impl Write,
        pid: usize,
        path: &TimePath,
    ) -> Result<Option<ClockCheck>, Box<dyn Error>> {
        let mut shown = false;
        if self.toggle(Toggle::ClockSkewOnReport) {
            shown = true;
            if !path.has_max_delay {
                field(out, "launch clock edge value:", path.launch_edge_value)?;
                field(out, "capture clock edge value:", path.capture_edge_value)?;
            }
            field(out, "launch clock latency:", path.launch_latency)?;
            if !path.has_max_delay {
                field(out, "capture clock latency:", path.capture_latency)?;
                field(out, "crpr:", path.crpr)?;
                field(out, "clock skew:", path.skew())?;
            }
        }

        let mut check = None;
        let wants_check = self.options.clock_check || self.toggle(Toggle::ClockCheckEnable);
        if wants_check && !path.has_max_delay {
            if shown {
                writeln!(out, " {THIN_RULE}")?;
            }
            shown = true;
            match self.report.clock_path_check(pid, self.options.trace) {
                Ok(result) => {
                    write_check(out, path, &result)?;
                    check = Some(result);
                }
                Err(AnalysisError::Precondition { missing, .. }) => {
                    writeln!(out, " {:<26} skipped (no {missing})", "clock path check:")?;
                }
                Err(err) => return Err(err.into()),
            }
        }

        if path.has_max_delay {
            shown = true;
            field(out, "max delay:", path.max_delay)?;
        }
        if shown {
            writeln!(out, " {RULE}")?;
        }
        Ok(check)
    }

    fn write_delta(&self, out: &mut impl Write, path: &TimePath) -> std::io::Result<()> {
        let na = || "N/A".to_string();
        let (data, launch, capture) = if self.report.has_column(ColumnKind::Delta) {
            let clock_rows = matches!(
                self.report.style(),
                Some(PathStyle::FullClock | PathStyle::FullClockExpanded)
            );
            if clock_rows {
                (
                    signed(path.data_delta),
                    format!("{:.4}", path.launch_delta),
                    format!("{:.4}", path.capture_delta),
                )
            } else {
                (signed(path.data_delta), na(), na())
            }
        } else {
            (na(), na(), na())
        };
        writeln!(
            out,
            " {:<26}{data} : {launch} : {capture}",
            "total delta (D:L:C):"
        )?;
        writeln!(out, " {RULE}")
    }

    fn write_segments(
        &self,
        out: &mut impl Write,
        pid: usize,
        path: &TimePath,
    ) -> Result<(), Box<dyn Error>> {
        if self.report.rules().path_classes.is_empty() {
            writeln!(out, " Segment: no path classification patterns defined.")?;
            writeln!(out, " {RULE}")?;
            return Ok(());
        }
        let segments = self.report.path_segments(pid)?;
        let style = self.report.style();
        let (data, clock) = match style {
            Some(PathStyle::Full) => (true, false),
            Some(PathStyle::FullClock | PathStyle::FullClockExpanded) => (true, true),
            None => (false, false),
        };
        let style_name = style.map_or_else(|| "unknown".to_string(), |s| s.to_string());
        writeln!(out, " Segment:  (report path type: {style_name})")?;

        if data {
            let latency = self.toggle(Toggle::SegmentDataLatencyOnReport);
            let delta = self.toggle(Toggle::SegmentDataDeltaOnReport);
            if latency || delta {
                writeln!(out, " {THIN_RULE}")?;
            }
            if latency {
                writeln!(out, " data latency: {}", segment_list(&segments.data_latency))?;
            }
            if delta {
                writeln!(out, " data delta:   {}", segment_list(&segments.data_delta))?;
            }
        }

        if clock {
            let latency = self.toggle(Toggle::SegmentLaunchClkLatencyOnReport);
            let delta = self.toggle(Toggle::SegmentLaunchClkDeltaOnReport);
            if latency || delta {
                writeln!(out, " {THIN_RULE}")?;
            }
            if latency {
                writeln!(
                    out,
                    " launch clk latency:  SC:{} {}",
                    signed(path.launch_source_latency),
                    segment_list(&segments.launch_latency)
                )?;
            }
            if delta {
                writeln!(out, " launch clk delta:    {}", segment_list(&segments.launch_delta))?;
            }

            let latency = self.toggle(Toggle::SegmentCaptureClkLatencyOnReport);
            let delta = self.toggle(Toggle::SegmentCaptureClkDeltaOnReport);
            if latency || delta {
                writeln!(out, " {THIN_RULE}")?;
            }
            if latency {
                let include_crpr = self.toggle(Toggle::SegmentCaptureClkLatencyIncludeCrpr);
                let suffix = if include_crpr { " (include crpr)" } else { "" };
                writeln!(
                    out,
                    " capture clk latency: SC:{} {}{suffix}",
                    signed(path.capture_source_latency_with(include_crpr)),
                    segment_list(&segments.capture_latency)
                )?;
            }
            if delta {
                writeln!(out, " capture clk delta:   {}", segment_list(&segments.capture_delta))?;
            }
        }
        writeln!(out, " {RULE}")?;
        Ok(())
    }
}

fn segment_list(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| {
            let tag = s.tag.as_deref().unwrap_or(UNCLASSIFIED_PATH_TAG);
            format!("{tag}:{}", signed(s.value))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_check(out: &mut impl Write, path: &TimePath, check: &ClockCheck) -> std::io::Result<()> {
    let launch_len = path
        .launch_gclock_len()
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    let levels = format!("{launch_len}/{}/{}", path.capture_gclock_len(), check.fork.level);
    let width = levels.len();

    let cell_detail = match &check.cell_type.failure {
        Some(f) if f.is_unknown() => {
            format!("(unknown clock type at level {}, ln:{}:{})", f.level, f.launch_line, f.capture_line)
        }
        Some(f) => format!("(level {}, ln:{}:{})", f.level, f.launch_line, f.capture_line),
        None => String::new(),
    };
    let source_detail = match check.source.mismatch {
        Some(level) => format!("(differs at level {level})"),
        None if check.source.status == CheckStatus::Pass => String::new(),
        None => "(no common source)".to_string(),
    };
    let line = |l: Option<usize>| l.map_or_else(|| "-".to_string(), |n| n.to_string());

    writeln!(
        out,
        " {:<26} {:<width$}    {cell_detail}",
        "clock cell type check:",
        check.cell_type.status.to_string()
    )?;
    writeln!(
        out,
        " {:<26} {:<width$}    {source_detail}",
        "clock source path match:",
        check.source.status.to_string()
    )?;
    writeln!(
        out,
        " {:<26} {levels}    (ln:{}:{})",
        "clock network path fork:",
        line(check.fork.launch_line),
        line(check.fork.capture_line)
    )
}
