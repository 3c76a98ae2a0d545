//! Advisory diagnostics for rules compilation and report analysis.
//!
//! Fatal conditions are typed errors in the crates that raise them. Everything
//! that should reach the user without stopping the run is a [`Diagnostic`]: a
//! severity, a category-prefixed [`DiagnosticCode`], a message, and the
//! [`Location`](ptana_source::Location) it refers to. Diagnostics are collected
//! in the thread-safe [`DiagnosticSink`] and formatted by a
//! [`DiagnosticRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
