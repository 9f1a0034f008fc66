//! pchtxt toolchain core library.
//!
//! Provides parsing and compilation of Patch Text (pchtxt) files — a
//! line-oriented, human-editable format describing byte-level binary
//! patches — plus an IPS32 serializer for the compiled output. The main
//! entry points are [`parse_str`] for parsing, [`scan_meta`] for reading
//! just the leading metadata block, and [`write_ips`] for serialization.
//!
//! Errors come in two tiers. Structural errors (a patch directive before
//! any build id, an out-of-range offset, an unterminated string literal, a
//! malformed hex value token) are fatal: the parse aborts and the caller
//! receives an empty output. Content-level issues (unrecognized tags or
//! flags, a body line that does not look like a patch entry) are logged as
//! warnings and skipped. Every event is delivered to a
//! [`DiagnosticSink`] with its 1-based source line.

#![warn(missing_docs)]

/// Re-exports from the diagnostics crate.
pub mod diag;
/// JSON serialization helpers for the compiled output.
pub mod dump;
/// IPS32 container serialization.
pub mod ips;
/// Metadata scanner for the leading block.
pub mod meta;
/// Compiled-output data model.
pub mod model;
/// Patch body parser — compiles patch text into the data model.
pub mod parser;
/// Line utilities: comment splitting, escapes, hex decoding.
pub mod text;

// ── Convenience re-exports ──────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Parser
pub use parser::{ParseResult, parse_str, parse_with_sink};

// Metadata scanner
pub use meta::{scan_meta, scan_meta_with_sink};

// Data model
pub use model::{
    Patch, PatchCollection, PatchContent, PatchTextMeta, PatchTextOutput, PatchType, TargetType,
};

// Writer
pub use ips::write_ips;

// Diagnostics (re-exported from the diagnostics crate)
pub use diag::{Diagnostic, DiagnosticSink, NullSink, Severity, codes};

// Serialization helpers
pub use dump::to_pretty_json;
