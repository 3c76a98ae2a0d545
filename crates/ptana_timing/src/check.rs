//! Clock-path consistency checks between the launch and capture clock networks.
//!
//! The launch network is `lpath[..=spin]`, the capture network is `cpath`.
//! Both are walked in lockstep from the clock source. Membership is
//! positional: pins up to `spin` are compared whether or not a `ckp` rule
//! marked them [`Pin::is_clock`].

use crate::error::AnalysisError;
use crate::model::Pin;
use crate::report::TimeReport;
use ptana_config::RuleSet;
use serde::Serialize;
use std::fmt;

/// Outcome of a single check.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// The check passed.
    Pass,
    /// The check failed.
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "pass"),
            CheckStatus::Fail => write!(f, "fail"),
        }
    }
}

/// Whether both clock networks start with the same pins.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceCheck {
    /// `Pass` if the shorter network is a prefix of the longer one.
    pub status: CheckStatus,
    /// Number of launch clock pins.
    pub launch_len: usize,
    /// Number of capture clock pins.
    pub capture_len: usize,
    /// 1-based position of the first differing pin.
    pub mismatch: Option<usize>,
}

/// Where the launch and capture clock networks diverge.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForkPoint {
    /// 1-based level of the last shared pin; 0 if the sources differ.
    pub level: usize,
    /// Report line of the last shared pin on the launch side.
    pub launch_line: Option<usize>,
    /// Report line of the last shared pin on the capture side.
    pub capture_line: Option<usize>,
}

/// The first aligned pair of cells whose clock types disagree or are unknown.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellTypeFailure {
    /// 1-based position.
    pub level: usize,
    /// Report line of the launch pin.
    pub launch_line: usize,
    /// Report line of the capture pin.
    pub capture_line: usize,
    /// `ckt` tag of the launch cell.
    pub launch_type: Option<bool>,
    /// `ckt` tag of the capture cell.
    pub capture_type: Option<bool>,
}

impl CellTypeFailure {
    /// Returns `true` if a cell matched no `ckt` rule.
    pub fn is_unknown(&self) -> bool {
        self.launch_type.is_none() || self.capture_type.is_none()
    }
}

/// Whether aligned cells up to the fork resolve to the same clock type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellTypeCheck {
    /// `Pass` if every aligned pair agrees.
    pub status: CheckStatus,
    /// The first failing position.
    pub failure: Option<CellTypeFailure>,
}

/// One side of a trace row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TracePin {
    /// Pin name.
    pub name: String,
    /// Cell name.
    pub cell: String,
    /// Report line.
    pub line: usize,
    /// `ckt` tag of the cell.
    pub clock_type: Option<bool>,
}

/// One position of the lockstep walk.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceRow {
    /// 1-based position.
    pub level: usize,
    /// Launch pin at this position.
    pub launch: Option<TracePin>,
    /// Capture pin at this position.
    pub capture: Option<TracePin>,
    /// Both sides carry the same pin.
    pub shared: bool,
}

/// Result of [`TimeReport::clock_path_check`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClockCheck {
    /// Source match.
    pub source: SourceCheck,
    /// Fork location.
    pub fork: ForkPoint,
    /// Cell-type consistency.
    pub cell_type: CellTypeCheck,
    /// Position-by-position trace, when requested.
    pub trace: Option<Vec<TraceRow>>,
}

impl TimeReport {
    /// Checks the launch and capture clock networks of path `pid`.
    ///
    /// The path must have a startpoint clock pin and a capture clock network.
    /// With `dump`, the lockstep trace is returned as well.
    pub fn clock_path_check(&self, pid: usize, dump: bool) -> Result<ClockCheck, AnalysisError> {
        let path = self.path(pid)?;
        if path.spin.is_none() {
            return Err(AnalysisError::Precondition {
                pid,
                missing: "launch clock pin",
            });
        }
        if path.cpath.is_empty() {
            return Err(AnalysisError::Precondition {
                pid,
                missing: "capture clock path",
            });
        }
        Ok(check_clock_paths(
            path.launch_clock_pins(),
            path.capture_clock_pins(),
            self.rules(),
            dump,
        ))
    }
}

/// Runs the three checks on two clock networks.
pub fn check_clock_paths(launch: &[Pin], capture: &[Pin], rules: &RuleSet, dump: bool) -> ClockCheck {
    let shared = launch
        .iter()
        .zip(capture)
        .take_while(|(l, c)| l.name == c.name)
        .count();
    let shorter = launch.len().min(capture.len());

    let source = SourceCheck {
        status: if shared == shorter {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        },
        launch_len: launch.len(),
        capture_len: capture.len(),
        mismatch: (shared < shorter).then_some(shared + 1),
    };

    let fork = ForkPoint {
        level: shared,
        launch_line: shared.checked_sub(1).map(|i| launch[i].ln),
        capture_line: shared.checked_sub(1).map(|i| capture[i].ln),
    };

    let failure = launch
        .iter()
        .zip(capture)
        .take(shared)
        .enumerate()
        .filter(|(_, (l, c))| !l.is_port() && !c.is_port())
        .map(|(i, (l, c))| CellTypeFailure {
            level: i + 1,
            launch_line: l.ln,
            capture_line: c.ln,
            launch_type: rules.clock_type(&l.cell),
            capture_type: rules.clock_type(&c.cell),
        })
        .find(|f| f.is_unknown() || f.launch_type != f.capture_type);
    let cell_type = CellTypeCheck {
        status: if failure.is_some() {
            CheckStatus::Fail
        } else {
            CheckStatus::Pass
        },
        failure,
    };

    let trace = dump.then(|| trace_rows(launch, capture, rules));
    ClockCheck {
        source,
        fork,
        cell_type,
        trace,
    }
}

fn trace_rows(launch: &[Pin], capture: &[Pin], rules: &RuleSet) -> Vec<TraceRow> {
    let trace_pin = |pin: &Pin| TracePin {
        name: pin.name.clone(),
        cell: pin.cell.clone(),
        line: pin.ln,
        clock_type: rules.clock_type(&pin.cell),
    };
    (0..launch.len().max(capture.len()))
        .map(|i| {
            let l = launch.get(i);
            let c = capture.get(i);
            TraceRow {
                level: i + 1,
                launch: l.map(trace_pin),
                capture: c.map(trace_pin),
                shared: matches!((l, c), (Some(l), Some(c)) if l.name == c.name),
            }
        })
        .collect()
}
