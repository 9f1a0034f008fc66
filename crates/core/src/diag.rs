//! Re-exports from the diagnostics crate.

pub use pchtxt_diagnostics::{Diagnostic, DiagnosticSink, LineIndex, NullSink, Severity, codes};
