//! Human-readable rendering of diagnostics.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use ptana_source::SourceDb;

/// Formats a diagnostic for an output target.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// Renders diagnostics for a terminal.
///
/// Produces output like:
/// ```text
/// warning[A201]: unknown driving cell 'XBUF'
///   --> timing.rpt:120
///     |
/// 120 |   u1/Z (XBUF)   0.0100   0.3100 r
///     |
///    = help: add a dc rule for the cell
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn severity_label(&self, severity: Severity) -> String {
        if !self.color {
            return severity.to_string();
        }
        let ansi = match severity {
            Severity::Note => "36",
            Severity::Warning => "33",
            Severity::Error => "31",
        };
        format!("\x1b[1;{ansi}m{severity}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = format!(
            "{}[{}]: {}\n",
            self.severity_label(diag.severity),
            diag.code,
            diag.message
        );

        if let Some(place) = source_db.describe(diag.location) {
            out.push_str(&format!("  --> {place}\n"));
            if let Some(text) = source_db.line_text(diag.location) {
                let line_num = diag.location.line.to_string();
                let padding = " ".repeat(line_num.len());
                out.push_str(&format!("{padding} |\n"));
                out.push_str(&format!("{line_num} | {text}\n"));
                out.push_str(&format!("{padding} |\n"));
            }
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use ptana_source::Location;

    #[test]
    fn render_with_report_line() {
        let mut db = SourceDb::new();
        let id = db.add_source("timing.rpt", "header\n  u1/Z (XBUF)  0.01  0.31 r\n".to_string());
        let diag = Diagnostic::warning(
            DiagnosticCode::new(Category::Analysis, 201),
            "unknown driving cell 'XBUF'",
            Location::new(id, 2),
        );

        let output = TerminalRenderer::new(false).render(&diag, &db);
        assert!(output.contains("warning[A201]: unknown driving cell 'XBUF'"));
        assert!(output.contains("--> timing.rpt:2"));
        assert!(output.contains("2 |   u1/Z (XBUF)"));
    }

    #[test]
    fn render_without_location() {
        let db = SourceDb::new();
        let diag = Diagnostic::note(
            DiagnosticCode::new(Category::Config, 101),
            "default group ignored",
            Location::DUMMY,
        )
        .with_help("declare it with pc");

        let output = TerminalRenderer::new(false).render(&diag, &db);
        assert_eq!(
            output,
            "note[C101]: default group ignored\n   = help: declare it with pc\n"
        );
    }

    #[test]
    fn color_wraps_severity() {
        let db = SourceDb::new();
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Report, 1),
            "x",
            Location::DUMMY,
        );
        let output = TerminalRenderer::new(true).render(&diag, &db);
        assert!(output.starts_with("\x1b[1;31merror\x1b[0m[R001]"));
    }
}
