//! Pins, paths and report options produced by the report scanner.

use indexmap::IndexMap;
use ptana_config::{instance_of, pin_of};
use serde::Serialize;
use std::fmt;

/// One timing point of a path.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Pin {
    /// Hierarchical pin name, `/`-delimited.
    pub name: String,
    /// Library cell; empty for ports.
    pub cell: String,
    /// Capacitance.
    pub cap: f64,
    /// Manhattan distance from the previous pin, when locations are reported.
    pub phy: f64,
    /// Transition time.
    pub tran: f64,
    /// Incremental delay.
    pub incr: f64,
    /// Cumulative delay ("Path" column).
    pub cumulative: f64,
    /// Crosstalk delta delay.
    pub delta: f64,
    /// Driving-cell classification; `None` when no `dc` rule covers the cell.
    pub drv: Option<f64>,
    /// 1-based report line.
    pub ln: usize,
    /// Clock-network membership decided from `ckp`/`ckm` rules.
    pub is_clock: bool,
}

impl Pin {
    /// Returns the instance part of the pin name (empty for ports).
    pub fn instance(&self) -> &str {
        instance_of(&self.name)
    }

    /// Returns the last component of the pin name.
    pub fn pin_name(&self) -> &str {
        pin_of(&self.name)
    }

    /// Returns `true` for top-level ports, which carry no library cell.
    pub fn is_port(&self) -> bool {
        self.cell.is_empty()
    }
}

/// Analysis type of a path.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayType {
    /// Setup (late) analysis.
    #[default]
    Max,
    /// Hold (early) analysis.
    Min,
}

impl fmt::Display for DelayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayType::Max => write!(f, "max"),
            DelayType::Min => write!(f, "min"),
        }
    }
}

/// Active clock edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockEdge {
    /// Rising edge.
    Rise,
    /// Falling edge.
    Fall,
}

impl fmt::Display for ClockEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockEdge::Rise => write!(f, "rise"),
            ClockEdge::Fall => write!(f, "fall"),
        }
    }
}

/// A column of the pin table, as announced by its `Point ...` header line.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum ColumnKind {
    /// Net fanout.
    Fanout,
    /// Capacitance.
    Cap,
    /// Transition time.
    Trans,
    /// Delay derating factor.
    Derate,
    /// Crosstalk delta delay.
    Delta,
    /// Incremental delay.
    Incr,
    /// Cumulative delay.
    Path,
    /// Placement location.
    Location,
    /// Any header word this scanner does not interpret.
    Other,
}

impl ColumnKind {
    /// Maps a header word to its column.
    pub fn from_header(word: &str) -> ColumnKind {
        match word {
            "Fanout" => ColumnKind::Fanout,
            "Cap" => ColumnKind::Cap,
            "Trans" => ColumnKind::Trans,
            "Derate" => ColumnKind::Derate,
            "Delta" => ColumnKind::Delta,
            "Incr" => ColumnKind::Incr,
            "Path" => ColumnKind::Path,
            "Location" => ColumnKind::Location,
            _ => ColumnKind::Other,
        }
    }

    /// Returns the pin attribute this column fills, if it fills one.
    ///
    /// `Location` maps to the derived physical distance.
    pub fn pin_value(self) -> Option<fn(&Pin) -> f64> {
        let get: fn(&Pin) -> f64 = match self {
            ColumnKind::Cap => |p| p.cap,
            ColumnKind::Trans => |p| p.tran,
            ColumnKind::Delta => |p| p.delta,
            ColumnKind::Incr => |p| p.incr,
            ColumnKind::Path => |p| p.cumulative,
            ColumnKind::Location => |p| p.phy,
            ColumnKind::Fanout | ColumnKind::Derate | ColumnKind::Other => return None,
        };
        Some(get)
    }
}

/// The `-path_type` a report was generated with.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum PathStyle {
    /// `full`: clock networks collapsed into one latency row.
    Full,
    /// `full_clock`: clock networks shown pin by pin.
    FullClock,
    /// `full_clock_expanded`: clock networks shown back to the clock source.
    FullClockExpanded,
}

impl PathStyle {
    /// Parses a `-path_type` argument.
    pub fn from_arg(arg: &str) -> Option<PathStyle> {
        match arg {
            "full" => Some(PathStyle::Full),
            "full_clock" => Some(PathStyle::FullClock),
            "full_clock_expanded" => Some(PathStyle::FullClockExpanded),
            _ => None,
        }
    }
}

impl fmt::Display for PathStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStyle::Full => write!(f, "full"),
            PathStyle::FullClock => write!(f, "full_clock"),
            PathStyle::FullClockExpanded => write!(f, "full_clock_expanded"),
        }
    }
}

/// A report-wide fact recognized while scanning.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum ReportOption {
    /// The report header declared this path style.
    Style(PathStyle),
    /// At least one pin table carried this column.
    Column(ColumnKind),
}

/// One reported timing path.
///
/// `lpath` holds the launch clock network followed by the data path; `spin`
/// separates the two. `cpath` holds the capture clock network.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TimePath {
    /// 1-based line of the `Startpoint:` header.
    pub ln: usize,
    /// Startpoint name from the header.
    pub startpoint: String,
    /// Endpoint name from the header.
    pub endpoint: String,
    /// Path group.
    pub group: String,
    /// Analysis type.
    pub delay_type: DelayType,
    /// Scenario, for multi-scenario reports.
    pub scenario: Option<String>,
    /// Launch clock edge.
    pub launch_edge: Option<ClockEdge>,
    /// Launch clock name.
    pub launch_clock: Option<String>,
    /// Capture clock edge.
    pub capture_edge: Option<ClockEdge>,
    /// Capture clock name.
    pub capture_clock: Option<String>,

    /// Launch-side pins.
    pub lpath: Vec<Pin>,
    /// Capture-clock pins.
    pub cpath: Vec<Pin>,
    /// Index into `lpath` of the startpoint clock pin.
    pub spin: Option<usize>,
    /// Index into `lpath` of the launch generated-clock source pin.
    pub sgpi: Option<usize>,
    /// Index into `cpath` of the capture generated-clock source pin.
    pub egpi: Option<usize>,

    /// Data arrival time.
    pub arrival: f64,
    /// Data required time.
    pub required: f64,
    /// Slack.
    pub slack: f64,
    /// Input external delay.
    pub input_delay: f64,
    /// Output external delay.
    pub output_delay: f64,
    /// Launch clock latency, relative to the launch edge.
    pub launch_latency: f64,
    /// Capture clock latency, relative to the capture edge.
    pub capture_latency: f64,
    /// Clock uncertainty.
    pub uncertainty: f64,
    /// Library setup or hold time.
    pub library: f64,
    /// Path margin.
    pub path_margin: f64,
    /// Clock reconvergence pessimism.
    pub crpr: f64,
    /// `max_delay`/`min_delay` constraint value.
    pub max_delay: f64,
    /// Launch clock edge time.
    pub launch_edge_value: f64,
    /// Capture clock edge time.
    pub capture_edge_value: f64,
    /// Launch clock source latency.
    pub launch_source_latency: f64,
    /// Capture clock source latency.
    pub capture_source_latency: f64,
    /// Total delta on the data path.
    pub data_delta: f64,
    /// Total delta on the launch clock network.
    pub launch_delta: f64,
    /// Total delta on the capture clock network.
    pub capture_delta: f64,

    /// Latency contributions of described hold/check arcs, by tag.
    pub hcd: IndexMap<String, f64>,
    /// `-through` pins of the report command.
    pub thp: Vec<String>,

    /// An input external delay row was present.
    pub has_input_delay: bool,
    /// An output external delay row was present.
    pub has_output_delay: bool,
    /// A path margin row was present.
    pub has_path_margin: bool,
    /// A `max_delay`/`min_delay` row was present.
    pub has_max_delay: bool,
}

impl TimePath {
    /// Returns `true` if any described hold/check arc contributed latency.
    pub fn has_hcd(&self) -> bool {
        !self.hcd.is_empty()
    }

    /// Launch clock network pins, up to and including `spin`.
    pub fn launch_clock_pins(&self) -> &[Pin] {
        match self.spin {
            Some(spin) => &self.lpath[..=spin],
            None => &[],
        }
    }

    /// Data path pins, after `spin` (all of `lpath` without a clock launch).
    pub fn data_pins(&self) -> &[Pin] {
        match self.spin {
            Some(spin) => &self.lpath[spin + 1..],
            None => &self.lpath,
        }
    }

    /// Capture clock network pins.
    pub fn capture_clock_pins(&self) -> &[Pin] {
        &self.cpath
    }

    /// Data path delay net of input delay, launch latency and launch edge.
    pub fn data_latency(&self) -> f64 {
        self.arrival - self.input_delay - self.launch_latency - self.launch_edge_value
    }

    /// Clock skew: launch latency minus capture latency minus CRPR.
    pub fn skew(&self) -> f64 {
        self.launch_latency - self.capture_latency - self.crpr
    }

    /// Number of data-path pins after the startpoint clock pin.
    pub fn datapath_level(&self) -> usize {
        self.data_pins().len()
    }

    /// Capture source latency, optionally with CRPR folded in.
    pub fn capture_source_latency_with(&self, include_crpr: bool) -> f64 {
        if include_crpr {
            self.capture_source_latency + self.crpr
        } else {
            self.capture_source_latency
        }
    }

    /// Launch latency without the source latency.
    pub fn launch_body_latency(&self) -> f64 {
        self.launch_latency - self.launch_source_latency
    }

    /// Capture latency without the (optionally CRPR-adjusted) source latency.
    pub fn capture_body_latency(&self, include_crpr: bool) -> f64 {
        self.capture_latency - self.capture_source_latency_with(include_crpr)
    }

    /// Length of the launch clock network below the generated-clock source.
    ///
    /// The whole network when the source is off-path; `None` without `spin`.
    pub fn launch_gclock_len(&self) -> Option<usize> {
        let spin = self.spin?;
        Some(match self.sgpi {
            Some(sgpi) => spin - sgpi,
            None => spin + 1,
        })
    }

    /// Length of the capture clock network below the generated-clock source.
    pub fn capture_gclock_len(&self) -> usize {
        match self.egpi {
            Some(egpi) => self.cpath.len() - egpi - 1,
            None => self.cpath.len(),
        }
    }
}
