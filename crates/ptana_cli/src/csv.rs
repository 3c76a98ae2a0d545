//! Space-delimited export of per-path metrics.

use std::io::{self, Write};

use ptana_timing::{PathMetric, TimeReport};

/// Writes a header of upper-cased column codes and one row per path.
pub fn write_csv(out: &mut impl Write, report: &TimeReport, columns: &[PathMetric]) -> io::Result<()> {
    let header: Vec<String> = columns.iter().map(|c| c.code().to_uppercase()).collect();
    writeln!(out, "{}", header.join(" "))?;
    for path in &report.paths {
        let row: Vec<String> = columns
            .iter()
            .map(|c| c.value(path, report.rules()).to_string())
            .collect();
        writeln!(out, "{}", row.join(" "))?;
    }
    Ok(())
}
