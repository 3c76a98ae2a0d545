//! Sticky-tag grouping of path pins into classified segments.
//!
//! A pin keeps the current tag as long as it still fully matches that tag's
//! pattern. Otherwise the table is searched again in declaration order and
//! the first matching tag (or the default) becomes current. Consecutive pins
//! with the same tag form one segment.

use crate::error::AnalysisError;
use crate::model::Pin;
use crate::report::TimeReport;
use ptana_config::ClassTable;
use serde::Serialize;
use std::ops::Range;

/// Assigns a tag to every key with the sticky rule.
pub fn sticky_tags<'t, 'k>(
    keys: impl IntoIterator<Item = &'k str>,
    table: &'t ClassTable,
    default: Option<&'t str>,
) -> Vec<Option<&'t str>> {
    let mut current = default;
    keys.into_iter()
        .map(|key| {
            let keeps = current
                .and_then(|tag| table.get(tag))
                .is_some_and(|pattern| pattern.is_full_match(key));
            if !keeps {
                current = table.first_match(key).or(default);
            }
            current
        })
        .collect()
}

/// A run of consecutive pins with the same tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRun<'t> {
    /// The tag; `None` when nothing classified the pins.
    pub tag: Option<&'t str>,
    /// Index range of the pins.
    pub range: Range<usize>,
}

/// Groups per-pin tags into runs.
pub fn tag_runs<'t>(tags: &[Option<&'t str>]) -> Vec<TagRun<'t>> {
    let mut runs: Vec<TagRun<'t>> = Vec::new();
    for (i, tag) in tags.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.tag == *tag => run.range.end = i + 1,
            _ => runs.push(TagRun {
                tag: *tag,
                range: i..i + 1,
            }),
        }
    }
    runs
}

/// One aggregated segment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Segment {
    /// The tag; `None` when nothing classified the pins.
    pub tag: Option<String>,
    /// Aggregated value.
    pub value: f64,
}

/// Latency and delta segments of the three sub-paths of a path.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PathSegments {
    /// Data-path latency per segment.
    pub data_latency: Vec<Segment>,
    /// Data-path delta per segment.
    pub data_delta: Vec<Segment>,
    /// Launch-clock latency per segment.
    pub launch_latency: Vec<Segment>,
    /// Launch-clock delta per segment.
    pub launch_delta: Vec<Segment>,
    /// Capture-clock latency per segment.
    pub capture_latency: Vec<Segment>,
    /// Capture-clock delta per segment.
    pub capture_delta: Vec<Segment>,
}

/// Segments `pins` by name with `table` and returns `(latency, delta)` lists.
///
/// A run's latency is the cumulative delay at its last pin minus the
/// cumulative delay at the pin just before it; the first run of the sub-path
/// takes its absolute cumulative delay. Delta is summed.
pub fn segment_pins(
    pins: &[Pin],
    table: &ClassTable,
    default: Option<&str>,
) -> (Vec<Segment>, Vec<Segment>) {
    let tags = sticky_tags(pins.iter().map(|p| p.name.as_str()), table, default);
    let mut latency = Vec::new();
    let mut delta = Vec::new();
    for run in tag_runs(&tags) {
        let before = run
            .range
            .start
            .checked_sub(1)
            .map_or(0.0, |prev| pins[prev].cumulative);
        let run_pins = &pins[run.range];
        let end = run_pins.last().map_or(before, |pin| pin.cumulative);
        let tag = run.tag.map(str::to_string);
        latency.push(Segment {
            tag: tag.clone(),
            value: end - before,
        });
        delta.push(Segment {
            tag,
            value: run_pins.iter().map(|p| p.delta).sum(),
        });
    }
    (latency, delta)
}

impl TimeReport {
    /// Segments the data, launch-clock and capture-clock sub-paths of `pid`
    /// with the `pc` table and the default path tag.
    pub fn path_segments(&self, pid: usize) -> Result<PathSegments, AnalysisError> {
        let path = self.path(pid)?;
        let table = &self.rules().path_classes;
        let default = self.rules().default_path_class();

        let (data_latency, data_delta) = segment_pins(path.data_pins(), table, default);
        let (launch_latency, launch_delta) =
            segment_pins(path.launch_clock_pins(), table, default);
        let (capture_latency, capture_delta) =
            segment_pins(path.capture_clock_pins(), table, default);
        Ok(PathSegments {
            data_latency,
            data_delta,
            launch_latency,
            launch_delta,
            capture_latency,
            capture_delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimePath;
    use ptana_config::{compile_rules_str, Pattern, RuleSet};
    use ptana_diagnostics::DiagnosticSink;

    fn table(entries: &[(&str, &str)]) -> ClassTable {
        let mut table = ClassTable::default();
        for (tag, pattern) in entries {
            table.insert(*tag, Pattern::new(pattern).unwrap());
        }
        table
    }

    fn pin(name: &str, cumulative: f64, delta: f64) -> Pin {
        Pin {
            name: name.to_string(),
            cumulative,
            delta,
            ..Pin::default()
        }
    }

    #[test]
    fn sticky_runs_follow_tag_changes() {
        let table = table(&[("A", "a.*"), ("B", "b.*")]);
        let tags = sticky_tags(["a1", "a2", "b1", "a3"], &table, Some("A"));
        let runs = tag_runs(&tags);
        assert_eq!(
            runs,
            vec![
                TagRun { tag: Some("A"), range: 0..2 },
                TagRun { tag: Some("B"), range: 2..3 },
                TagRun { tag: Some("A"), range: 3..4 },
            ]
        );
    }

    #[test]
    fn current_tag_sticks_over_earlier_declared_match() {
        let table = table(&[("CORE", "core/.*"), ("ANY", ".*")]);
        let tags = sticky_tags(["io/a", "core/b", "core/c"], &table, None);
        assert_eq!(tags, vec![Some("ANY"), Some("ANY"), Some("ANY")]);
    }

    #[test]
    fn unmatched_pins_fall_back_to_default_or_none() {
        let table = table(&[("A", "a.*")]);
        assert_eq!(
            sticky_tags(["x", "a1", "y"], &table, None),
            vec![None, Some("A"), None]
        );
        assert_eq!(
            sticky_tags(["x", "a1", "y"], &table, Some("A")),
            vec![Some("A"), Some("A"), Some("A")]
        );
    }

    #[test]
    fn segment_values_aggregate_per_run() {
        let pins = vec![
            pin("a1", 0.1, 0.01),
            pin("a2", 0.3, 0.0),
            pin("b1", 0.6, 0.02),
            pin("a3", 1.0, 0.03),
        ];
        let (latency, delta) = segment_pins(&pins, &table(&[("A", "a.*"), ("B", "b.*")]), None);
        let values: Vec<_> = latency.iter().map(|s| s.value).collect();
        assert_eq!(latency.len(), 3);
        assert!((values[0] - 0.3).abs() < 1e-9);
        assert!((values[1] - 0.3).abs() < 1e-9);
        assert!((values[2] - 0.4).abs() < 1e-9);
        assert_eq!(delta[2].tag.as_deref(), Some("A"));
        assert!((delta[0].value - 0.01).abs() < 1e-9);
    }

    #[test]
    fn first_run_keeps_its_starting_offset() {
        let pins = vec![
            pin("clk", 4.0, 0.0),
            pin("cb/Z", 4.2, 0.01),
            pin("cb2/Z", 4.3, 0.0),
            pin("ff2/CK", 4.3, 0.0),
        ];
        let (latency, delta) = segment_pins(&pins, &table(&[("ANY", ".*")]), None);
        assert_eq!(latency.len(), 1);
        assert_eq!(latency[0].tag.as_deref(), Some("ANY"));
        assert!((latency[0].value - 4.3).abs() < 1e-9);
        assert!((delta[0].value - 0.01).abs() < 1e-9);

        let table = table(&[("CK", "c.*"), ("FF", "ff.*")]);
        let (latency, _) = segment_pins(&pins, &table, None);
        assert!((latency[0].value - 4.3).abs() < 1e-9);
        assert!(latency[1].value.abs() < 1e-9);
    }

    #[test]
    fn empty_sub_path_yields_no_segments() {
        let (latency, delta) = segment_pins(&[], &table(&[("A", ".*")]), Some("A"));
        assert!(latency.is_empty());
        assert!(delta.is_empty());
    }

    #[test]
    fn report_segments_split_sub_paths() {
        let rules: RuleSet = compile_rules_str(
            "pc: CLK ck.*\npc: DATA d.*\ndpc: DATA\n",
            &DiagnosticSink::new(),
        )
        .unwrap();
        let mut report = TimeReport::new(rules);
        report.paths.push(TimePath {
            lpath: vec![
                pin("ck0", 0.1, 0.0),
                pin("ck1", 0.3, 0.0),
                pin("d0", 0.6, 0.0),
                pin("x0", 1.0, 0.05),
            ],
            cpath: vec![pin("ck0", 2.1, 0.0), pin("ck2", 2.35, 0.0)],
            spin: Some(1),
            ..TimePath::default()
        });

        let segs = report.path_segments(0).unwrap();
        assert_eq!(segs.launch_latency.len(), 1);
        assert_eq!(segs.launch_latency[0].tag.as_deref(), Some("CLK"));
        assert!((segs.launch_latency[0].value - 0.3).abs() < 1e-9);
        assert_eq!(segs.data_latency.len(), 1);
        assert!((segs.data_latency[0].value - 1.0).abs() < 1e-9);
        assert!((segs.data_delta[0].value - 0.05).abs() < 1e-9);
        assert_eq!(segs.capture_latency.len(), 1);
        assert!((segs.capture_latency[0].value - 2.35).abs() < 1e-9);
        assert!(matches!(
            report.path_segments(1),
            Err(AnalysisError::NoSuchPath { pid: 1, count: 1 })
        ));
    }
}
