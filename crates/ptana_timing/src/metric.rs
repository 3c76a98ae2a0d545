//! Named per-path values for tabular output.

use crate::model::TimePath;
use ptana_config::{RuleSet, Toggle};
use serde::Serialize;
use std::fmt;

/// A per-path column, addressed by its short code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMetric {
    /// Report line of the path (`ln`).
    Line,
    /// Startpoint pin (`stp`).
    Startpoint,
    /// Endpoint pin (`edp`).
    Endpoint,
    /// Data latency (`dlat`).
    DataLatency,
    /// Arrival time (`arr`).
    Arrival,
    /// Required time (`req`).
    Required,
    /// Slack (`slk`).
    Slack,
    /// Clock uncertainty (`unce`).
    Uncertainty,
    /// Library setup/hold (`lib`).
    Library,
    /// Launch clock latency (`llat`).
    LaunchLatency,
    /// Capture clock latency (`clat`).
    CaptureLatency,
    /// Launch source latency (`sllat`).
    LaunchSourceLatency,
    /// Capture source latency (`sclat`).
    CaptureSourceLatency,
    /// Launch latency below the source (`bllat`).
    LaunchBodyLatency,
    /// Capture latency below the source (`bclat`).
    CaptureBodyLatency,
    /// Clock reconvergence pessimism (`crpr`).
    Crpr,
    /// Clock skew (`skew`).
    Skew,
    /// Data path delta (`ddt`).
    DataDelta,
    /// Launch clock delta (`ldt`).
    LaunchDelta,
    /// Capture clock delta (`cdt`).
    CaptureDelta,
}

/// Columns used when none are requested.
pub const DEFAULT_COLUMNS: [PathMetric; 4] = [
    PathMetric::Line,
    PathMetric::Arrival,
    PathMetric::Required,
    PathMetric::Slack,
];

/// Shorthand code expanding to the four source/body latency columns.
pub const SOURCE_LATENCY_GROUP: &str = "slat";

impl PathMetric {
    /// Every metric, in code order.
    pub const ALL: [PathMetric; 20] = [
        PathMetric::Line,
        PathMetric::Startpoint,
        PathMetric::Endpoint,
        PathMetric::DataLatency,
        PathMetric::Arrival,
        PathMetric::Required,
        PathMetric::Slack,
        PathMetric::Uncertainty,
        PathMetric::Library,
        PathMetric::LaunchLatency,
        PathMetric::CaptureLatency,
        PathMetric::LaunchSourceLatency,
        PathMetric::CaptureSourceLatency,
        PathMetric::LaunchBodyLatency,
        PathMetric::CaptureBodyLatency,
        PathMetric::Crpr,
        PathMetric::Skew,
        PathMetric::DataDelta,
        PathMetric::LaunchDelta,
        PathMetric::CaptureDelta,
    ];

    /// Returns the short code.
    pub fn code(self) -> &'static str {
        match self {
            PathMetric::Line => "ln",
            PathMetric::Startpoint => "stp",
            PathMetric::Endpoint => "edp",
            PathMetric::DataLatency => "dlat",
            PathMetric::Arrival => "arr",
            PathMetric::Required => "req",
            PathMetric::Slack => "slk",
            PathMetric::Uncertainty => "unce",
            PathMetric::Library => "lib",
            PathMetric::LaunchLatency => "llat",
            PathMetric::CaptureLatency => "clat",
            PathMetric::LaunchSourceLatency => "sllat",
            PathMetric::CaptureSourceLatency => "sclat",
            PathMetric::LaunchBodyLatency => "bllat",
            PathMetric::CaptureBodyLatency => "bclat",
            PathMetric::Crpr => "crpr",
            PathMetric::Skew => "skew",
            PathMetric::DataDelta => "ddt",
            PathMetric::LaunchDelta => "ldt",
            PathMetric::CaptureDelta => "cdt",
        }
    }

    /// Parses a short code.
    pub fn from_code(code: &str) -> Option<PathMetric> {
        PathMetric::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Parses a column list, expanding `slat` in place.
    ///
    /// `ln` is always first and never repeated. Returns the offending code on
    /// failure.
    pub fn parse_list<'c>(
        codes: impl IntoIterator<Item = &'c str>,
    ) -> Result<Vec<PathMetric>, String> {
        let mut out = vec![PathMetric::Line];
        for code in codes {
            if code == SOURCE_LATENCY_GROUP {
                out.extend([
                    PathMetric::LaunchSourceLatency,
                    PathMetric::CaptureSourceLatency,
                    PathMetric::LaunchBodyLatency,
                    PathMetric::CaptureBodyLatency,
                ]);
                continue;
            }
            match PathMetric::from_code(code) {
                Some(PathMetric::Line) => {}
                Some(metric) => out.push(metric),
                None => return Err(code.to_string()),
            }
        }
        Ok(out)
    }

    /// Resolves the metric on `path`.
    pub fn value(self, path: &TimePath, rules: &RuleSet) -> MetricValue {
        let include_crpr = rules.toggle(Toggle::SegmentCaptureClkLatencyIncludeCrpr);
        let number = match self {
            PathMetric::Line => return MetricValue::Line(path.ln),
            PathMetric::Startpoint => {
                let name = path
                    .spin
                    .and_then(|spin| path.lpath.get(spin))
                    .map_or(path.startpoint.as_str(), |pin| pin.name.as_str());
                return MetricValue::Text(name.to_string());
            }
            PathMetric::Endpoint => {
                let name = path
                    .lpath
                    .last()
                    .map_or(path.endpoint.as_str(), |pin| pin.name.as_str());
                return MetricValue::Text(name.to_string());
            }
            PathMetric::DataLatency => path.data_latency(),
            PathMetric::Arrival => path.arrival,
            PathMetric::Required => path.required,
            PathMetric::Slack => path.slack,
            PathMetric::Uncertainty => path.uncertainty,
            PathMetric::Library => path.library,
            PathMetric::LaunchLatency => path.launch_latency,
            PathMetric::CaptureLatency => path.capture_latency,
            PathMetric::LaunchSourceLatency => path.launch_source_latency,
            PathMetric::CaptureSourceLatency => path.capture_source_latency_with(include_crpr),
            PathMetric::LaunchBodyLatency => path.launch_body_latency(),
            PathMetric::CaptureBodyLatency => path.capture_body_latency(false),
            PathMetric::Crpr => path.crpr,
            PathMetric::Skew => path.skew(),
            PathMetric::DataDelta => path.data_delta,
            PathMetric::LaunchDelta => path.launch_delta,
            PathMetric::CaptureDelta => path.capture_delta,
        };
        MetricValue::Number(number)
    }
}

impl fmt::Display for PathMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A resolved metric.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// A report line.
    Line(usize),
    /// A pin name.
    Text(String),
    /// A time value.
    Number(f64),
}

impl MetricValue {
    /// Returns the numeric value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Line(ln) => write!(f, "{ln}"),
            MetricValue::Text(text) => f.write_str(text),
            MetricValue::Number(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pin;
    use ptana_config::compile_rules_str;
    use ptana_diagnostics::DiagnosticSink;

    fn rules(text: &str) -> RuleSet {
        compile_rules_str(text, &DiagnosticSink::new()).unwrap()
    }

    fn path() -> TimePath {
        let pin = |name: &str| Pin {
            name: name.to_string(),
            cell: "DFF".to_string(),
            ..Pin::default()
        };
        TimePath {
            ln: 42,
            startpoint: "ff1".to_string(),
            lpath: vec![pin("ck/Z"), pin("ff1/CK"), pin("ff1/Q"), pin("ff2/D")],
            spin: Some(1),
            launch_latency: 1.0,
            launch_source_latency: 0.25,
            capture_latency: 0.9,
            capture_source_latency: 0.2,
            crpr: 0.05,
            ..TimePath::default()
        }
    }

    #[test]
    fn list_expands_source_latency_group() {
        let list = PathMetric::parse_list(["ln", "arr", "slat", "skew"]).unwrap();
        let codes: Vec<_> = list.iter().map(|m| m.code()).collect();
        assert_eq!(codes, ["ln", "arr", "sllat", "sclat", "bllat", "bclat", "skew"]);
        assert_eq!(PathMetric::parse_list(["xyz"]), Err("xyz".to_string()));
    }

    #[test]
    fn names_come_from_pins() {
        let rules = rules("");
        let path = path();
        assert_eq!(
            PathMetric::Startpoint.value(&path, &rules),
            MetricValue::Text("ff1/CK".to_string())
        );
        assert_eq!(PathMetric::Endpoint.value(&path, &rules).to_string(), "ff2/D");
        assert_eq!(PathMetric::Line.value(&path, &rules).to_string(), "42");
    }

    #[test]
    fn capture_source_latency_follows_crpr_toggle() {
        let path = path();
        let on = PathMetric::CaptureSourceLatency.value(&path, &rules(""));
        assert!((on.as_number().unwrap() - 0.25).abs() < 1e-9);
        let off = PathMetric::CaptureSourceLatency.value(
            &path,
            &rules("segment_capture_clk_latency_include_crpr: false\n"),
        );
        assert!((off.as_number().unwrap() - 0.2).abs() < 1e-9);
        let body = PathMetric::CaptureBodyLatency.value(&path, &rules(""));
        assert!((body.as_number().unwrap() - 0.7).abs() < 1e-9);
    }
}
