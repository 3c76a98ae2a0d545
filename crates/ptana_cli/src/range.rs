//! `-r` scan-range syntax: a comma list of `start[:end][+count]`.

use std::sync::OnceLock;

use ptana_timing::ScanRange;
use regex::Regex;

/// Range used when none is given: one path from the top of the report.
pub fn default_ranges() -> Vec<ScanRange> {
    vec![ScanRange::new(0, None, Some(1))]
}

/// Parses a range list. Malformed entries are skipped with a warning; an
/// empty result falls back to [`default_ranges`].
pub fn parse_ranges(text: &str) -> Vec<ScanRange> {
    let Some(entry_re) = entry_pattern() else {
        return default_ranges();
    };
    let ranges: Vec<ScanRange> = text
        .split(',')
        .filter_map(|entry| {
            let range = parse_entry(entry_re, entry.trim());
            if range.is_none() {
                tracing::warn!(entry, "ignoring malformed scan range");
            }
            range
        })
        .collect();
    if ranges.is_empty() {
        default_ranges()
    } else {
        ranges
    }
}

fn entry_pattern() -> Option<&'static Regex> {
    static ENTRY: OnceLock<Option<Regex>> = OnceLock::new();
    ENTRY
        .get_or_init(|| match Regex::new(r"^(\d+)(?::(\d+))?(?:\+(\d+))?$") {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::error!(%err, "scan range pattern failed to compile");
                None
            }
        })
        .as_ref()
}

fn parse_entry(entry_re: &Regex, entry: &str) -> Option<ScanRange> {
    let caps = entry_re.captures(entry)?;
    let number = |i: usize| -> Option<Option<usize>> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok().map(Some),
            None => Some(None),
        }
    };
    let start = number(1)??;
    Some(ScanRange::new(start, number(2)?, number(3)?))
}
