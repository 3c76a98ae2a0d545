//! Timing-report parsing and path analysis.
//!
//! Turns the text of a static-timing path report into structured
//! [`TimePath`]s and answers questions about them.
//!
//! # Architecture
//!
//! - [`report`]: the parse session. A [`TimeReport`] owns the compiled rules,
//!   the parsed paths and the report-wide options, and drives the scanner over
//!   one or more [`ScanRange`]s.
//! - `parser`: the line scanner and per-path state machine.
//! - [`model`]: pins, paths and report options.
//! - [`check`]: launch/capture clock-network consistency checks.
//! - [`segment`]: sticky-tag classification of pins into latency and delta
//!   segments.
//! - [`series`]: per-pin chart data for one path.
//! - [`metric`]: named per-path values for tabular output.
//! - [`error`]: fatal report and analysis errors.

#![warn(missing_docs)]

pub mod check;
pub mod error;
pub mod metric;
pub mod model;
mod parser;
pub mod report;
pub mod segment;
pub mod series;

pub use check::{check_clock_paths, CheckStatus, ClockCheck};
pub use error::{AnalysisError, ReportError};
pub use metric::{MetricValue, PathMetric};
pub use model::{ClockEdge, ColumnKind, DelayType, PathStyle, Pin, ReportOption, TimePath};
pub use report::{ScanRange, TimeReport};
pub use segment::{PathSegments, Segment};
pub use series::{BarData, BarPath, BarRequest, BarSeries};
