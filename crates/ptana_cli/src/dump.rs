//! Text dump of clock-check traces.

use std::io::{self, Write};

use ptana_timing::check::{ClockCheck, TracePin};
use ptana_timing::TimePath;

fn side(pin: Option<&TracePin>) -> String {
    match pin {
        Some(pin) => {
            let kind = match pin.clock_type {
                Some(true) => "Y",
                Some(false) => "N",
                None => "?",
            };
            let cell = if pin.cell.is_empty() { "port" } else { pin.cell.as_str() };
            format!("{} ({cell}) [{kind}] ln:{}", pin.name, pin.line)
        }
        None => "-".to_string(),
    }
}

/// Writes the lockstep trace of one checked path.
///
/// `*` marks positions where both networks carry the same pin. `[Y]`/`[N]`
/// is the clock-cell type of the cell, `[?]` an unknown one.
pub fn write_trace(out: &mut impl Write, pid: usize, path: &TimePath, check: &ClockCheck) -> io::Result<()> {
    writeln!(
        out,
        "### path {} (ln:{}) {} -> {}",
        pid + 1,
        path.ln,
        path.startpoint,
        path.endpoint
    )?;
    writeln!(
        out,
        "# source: {}  fork level: {}  cell type: {}",
        check.source.status, check.fork.level, check.cell_type.status
    )?;
    let rows = check.trace.as_deref().unwrap_or_default();
    let width = rows
        .iter()
        .map(|row| side(row.launch.as_ref()).len())
        .max()
        .unwrap_or(0);
    for row in rows {
        let mark = if row.shared { '*' } else { ' ' };
        writeln!(
            out,
            "{:>4} {mark} {:<width$} | {}",
            row.level,
            side(row.launch.as_ref()),
            side(row.capture.as_ref())
        )?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptana_config::compile_rules_str;
    use ptana_diagnostics::DiagnosticSink;
    use ptana_timing::{check_clock_paths, Pin};

    fn pin(name: &str, cell: &str, ln: usize) -> Pin {
        Pin {
            name: name.to_string(),
            cell: cell.to_string(),
            ln,
            ..Pin::default()
        }
    }

    #[test]
    fn trace_rows_are_marked() {
        let rules = compile_rules_str("ckt: y CK.*\n", &DiagnosticSink::new()).unwrap();
        let launch = [pin("clk", "", 10), pin("cb/Z", "CKBUFX4", 11), pin("ff1/CK", "DFFX1", 12)];
        let capture = [pin("clk", "", 20), pin("cb/Z", "CKBUFX4", 21)];
        let check = check_clock_paths(&launch, &capture, &rules, true);
        let path = TimePath {
            ln: 8,
            startpoint: "ff1".to_string(),
            endpoint: "ff2".to_string(),
            ..TimePath::default()
        };

        let mut out = Vec::new();
        write_trace(&mut out, 0, &path, &check).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "### path 1 (ln:8) ff1 -> ff2");
        assert!(lines[2].starts_with("   1 * clk (port) [?] ln:10"));
        assert!(lines[3].ends_with("| cb/Z (CKBUFX4) [Y] ln:21"));
        assert!(lines[4].starts_with("   3   ff1/CK (DFFX1) [?] ln:12"));
        assert!(lines[4].ends_with("| -"));
    }
}
