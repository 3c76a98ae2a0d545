//! Thread-safe diagnostic accumulator.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Collects diagnostics emitted while compiling rules and analyzing reports.
///
/// Per-severity counts are kept outside the lock and survive [`take_all`].
///
/// [`take_all`]: DiagnosticSink::take_all
pub struct DiagnosticSink {
    queue: Mutex<Vec<Diagnostic>>,
    counts: [AtomicUsize; 3],
}

fn slot(severity: Severity) -> usize {
    match severity {
        Severity::Note => 0,
        Severity::Warning => 1,
        Severity::Error => 2,
    }
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            counts: [AtomicUsize::new(0), AtomicUsize::new(0), AtomicUsize::new(0)],
        }
    }

    /// Queues a diagnostic and mirrors it to the log at its severity.
    pub fn emit(&self, diag: Diagnostic) {
        self.counts[slot(diag.severity)].fetch_add(1, Ordering::Relaxed);
        let (code, line) = (diag.code, diag.location.line);
        match diag.severity {
            Severity::Error => tracing::error!(%code, line, "{}", diag.message),
            Severity::Warning => tracing::warn!(%code, line, "{}", diag.message),
            Severity::Note => tracing::debug!(%code, line, "{}", diag.message),
        }
        self.queue().push(diag);
    }

    /// Number of diagnostics of `severity` emitted so far.
    pub fn count(&self, severity: Severity) -> usize {
        self.counts[slot(severity)].load(Ordering::Relaxed)
    }

    /// Returns `true` once any error has been emitted.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Number of errors emitted so far.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warnings emitted so far.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Drains the queued diagnostics. Counts are kept.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.queue())
    }

    /// Copies the queued diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.queue().clone()
    }

    fn queue(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use ptana_source::Location;

    fn make_warning() -> Diagnostic {
        Diagnostic::warning(
            DiagnosticCode::new(Category::Report, 201),
            "no timing path in range",
            Location::DUMMY,
        )
    }

    fn make_error() -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::new(Category::Analysis, 301),
            "bad path",
            Location::DUMMY,
        )
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn counts_by_severity() {
        let sink = DiagnosticSink::new();
        sink.emit(make_warning());
        sink.emit(make_warning());
        sink.emit(make_error());
        assert_eq!(sink.warning_count(), 2);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.count(Severity::Note), 0);
        assert!(sink.has_errors());
        assert_eq!(sink.diagnostics().len(), 3);
    }

    #[test]
    fn take_all_drains_but_keeps_counts() {
        let sink = DiagnosticSink::new();
        sink.emit(make_warning());
        assert_eq!(sink.take_all().len(), 1);
        assert!(sink.take_all().is_empty());
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn shared_between_threads() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for _ in 0..25 {
                        sink.emit(make_warning());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.warning_count(), 100);
        assert_eq!(sink.diagnostics().len(), 100);
    }
}
