//! Diagnostics for the pchtxt toolchain.
//!
//! Provides [`Diagnostic`], [`Severity`], [`DiagnosticSink`], and
//! [`LineIndex`] types used to report errors, warnings, and informational
//! events from the metadata scanner, the patch body parser, and their
//! consumers. Diagnostic codes are defined in the [`codes`] module.
//!
//! Parsing in this toolchain is line-oriented, so diagnostics carry a
//! 1-based line number rather than a byte span. [`LineIndex`] converts a
//! line number back into a byte range of the source for renderers that
//! want to underline the offending line.

#![warn(missing_docs)]

/// Diagnostic ID constants and their explanations.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps line numbers in a source string to byte ranges.
///
/// Lines are **0-indexed** internally; diagnostics carry 1-based line
/// numbers, so subtract 1 before lookup. The stored range covers the line's
/// content without its trailing `\n` (or `\r\n`).
///
/// The index is built in O(n) time and each lookup is O(1). This struct is
/// intentionally dependency-free so it can be reused by any renderer.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte range `(start, end)` of each line, newline excluded.
    spans: Vec<(usize, usize)>,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut spans = Vec::new();
        let mut start = 0usize;
        for (i, b) in bytes.iter().enumerate() {
            if *b == b'\n' {
                let mut end = i;
                if end > start && bytes[end - 1] == b'\r' {
                    end -= 1;
                }
                spans.push((start, end));
                start = i + 1;
            }
        }
        spans.push((start, text.len()));
        Self { spans }
    }

    /// Byte range of the given 0-indexed line, newline excluded.
    ///
    /// Returns `None` if `line` is out of bounds.
    pub fn line_span(&self, line: usize) -> Option<(usize, usize)> {
        self.spans.get(line).copied()
    }

    /// Byte offset of the start of the given 0-indexed line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.spans.get(line).map(|(s, _)| *s)
    }

    /// Total number of lines (at least 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.spans.len()
    }
}

// ── Severity ─────────────────────────────────────────────────────────────

/// Severity level for a diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// Hard error — the input is invalid and parsing aborted.
    Error,
    /// Warning — a line or directive was skipped.
    Warn,
    /// Informational progress event.
    Info,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A structured event produced by the metadata scanner or the body parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique diagnostic code (e.g., `"PCH1001"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// 1-based source line the event relates to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Machine-readable context for tooling. Keys and values are free-form
    /// strings. Absent when no context is applicable.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        line: Option<u32>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            line,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        line: Option<u32>,
    ) -> Self {
        Self::new(id, Severity::Error, message, line)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        line: Option<u32>,
    ) -> Self {
        Self::new(id, Severity::Warn, message, line)
    }

    /// Shorthand for an `Info` diagnostic.
    pub fn info(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        line: Option<u32>,
    ) -> Self {
        Self::new(id, Severity::Info, message, line)
    }

    /// Attach machine-readable context metadata (builder pattern).
    ///
    /// Context is a set of key-value string pairs providing structured
    /// details about the diagnostic for tooling, filtering, and
    /// programmatic consumption. Keys are short descriptors like
    /// `"build_id"`, `"flag"`, `"token"`, etc.
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's code,
    /// if available.
    pub fn explain(&self) -> Option<&'static str> {
        codes::explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(n) => write!(f, "{}[{}] L{}: {}", self.severity, self.id, n, self.message),
            None => write!(f, "{}[{}]: {}", self.severity, self.id, self.message),
        }
    }
}

// ── Sink ─────────────────────────────────────────────────────────────────

/// Receives diagnostic events as parsing progresses.
///
/// The parser pushes every event into the sink the moment it occurs, so a
/// sink sees warnings and progress events even for parses that later abort.
/// `Vec<Diagnostic>` implements this for the common collect-then-inspect
/// case; [`NullSink`] discards everything.
pub trait DiagnosticSink {
    /// Deliver one event to the sink.
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// A sink that discards every event, for callers that only want the
/// compiled output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LineIndex ────────────────────────────────────────────────────────

    #[test]
    fn line_index_single_line() {
        let idx = LineIndex::new("hello");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.line_span(0), Some((0, 5)));
    }

    #[test]
    fn line_index_two_lines() {
        let idx = LineIndex::new("ab\ncd");
        assert_eq!(idx.line_count(), 2);
        assert_eq!(idx.line_span(0), Some((0, 2)));
        assert_eq!(idx.line_span(1), Some((3, 5)));
    }

    #[test]
    fn line_index_crlf() {
        let idx = LineIndex::new("ab\r\ncd");
        assert_eq!(idx.line_count(), 2);
        assert_eq!(idx.line_span(0), Some((0, 2)), "span excludes \\r\\n");
        assert_eq!(idx.line_span(1), Some((4, 6)));
    }

    #[test]
    fn line_index_trailing_newline() {
        let idx = LineIndex::new("a\n");
        assert_eq!(idx.line_count(), 2);
        assert_eq!(idx.line_span(1), Some((2, 2)), "empty trailing line");
    }

    #[test]
    fn line_index_empty_input() {
        let idx = LineIndex::new("");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.line_span(0), Some((0, 0)));
    }

    #[test]
    fn line_index_multiple_newlines() {
        let idx = LineIndex::new("a\n\nb\n");
        assert_eq!(idx.line_count(), 4);
        assert_eq!(idx.line_span(1), Some((2, 2)), "empty middle line");
        assert_eq!(idx.line_span(2), Some((3, 4)));
    }

    #[test]
    fn line_index_multibyte_utf8() {
        // '€' is 3 bytes in UTF-8
        let idx = LineIndex::new("€\na");
        assert_eq!(idx.line_span(0), Some((0, 3)));
        assert_eq!(idx.line_span(1), Some((4, 5)));
    }

    #[test]
    fn line_index_line_start() {
        let idx = LineIndex::new("ab\ncd\nef");
        assert_eq!(idx.line_start(0), Some(0));
        assert_eq!(idx.line_start(1), Some(3));
        assert_eq!(idx.line_start(2), Some(6));
        assert_eq!(idx.line_start(3), None);
    }

    #[test]
    fn line_index_out_of_bounds() {
        let idx = LineIndex::new("hi");
        assert_eq!(idx.line_span(5), None);
    }

    // ── Severity Display ────────────────────────────────────────────────

    #[test]
    fn severity_display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warn), "warn");
        assert_eq!(format!("{}", Severity::Info), "info");
    }

    // ── Diagnostic constructors ─────────────────────────────────────────

    #[test]
    fn diagnostic_error_constructor() {
        let d = Diagnostic::error(codes::MISSING_BUILD_ID, "missing build id", Some(3));
        assert_eq!(d.id, "PCH1001");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "missing build id");
        assert_eq!(d.line, Some(3));
    }

    #[test]
    fn diagnostic_warn_constructor() {
        let d = Diagnostic::warn(codes::UNRECOGNIZED_TAG, "bad tag", Some(1));
        assert_eq!(d.severity, Severity::Warn);
        assert_eq!(d.line, Some(1));
    }

    #[test]
    fn diagnostic_info_constructor() {
        let d = Diagnostic::info("CUSTOM", "custom message", None);
        assert_eq!(d.severity, Severity::Info);
        assert_eq!(d.id, "CUSTOM");
        assert!(d.line.is_none());
    }

    // ── Diagnostic Display ──────────────────────────────────────────────

    #[test]
    fn diagnostic_display_with_line() {
        let d = Diagnostic::error(codes::OFFSET_OUT_OF_RANGE, "offset out of range", Some(12));
        assert_eq!(format!("{}", d), "error[PCH1003] L12: offset out of range");
    }

    #[test]
    fn diagnostic_display_without_line() {
        let d = Diagnostic::info(codes::PARSE_PROGRESS, "done parsing patches", None);
        assert_eq!(format!("{}", d), "info[PCH3004]: done parsing patches");
    }

    // ── explain ─────────────────────────────────────────────────────────

    #[test]
    fn diagnostic_explain_known() {
        let d = Diagnostic::error(codes::MISSING_BUILD_ID, "test", None);
        assert!(d.explain().is_some());
        assert!(d.explain().unwrap().contains("build id"));
    }

    #[test]
    fn diagnostic_explain_unknown() {
        let d = Diagnostic::error("UNKNOWN_CODE", "test", None);
        assert!(d.explain().is_none());
    }

    #[test]
    fn all_codes_have_explanations() {
        let all = [
            codes::MISSING_BUILD_ID,
            codes::LEGACY_BUILD_ID_MISSING_VALUE,
            codes::OFFSET_OUT_OF_RANGE,
            codes::UNTERMINATED_STRING,
            codes::ODD_HEX_LENGTH,
            codes::INVALID_HEX_VALUE,
            codes::INVALID_OFFSET_SHIFT,
            codes::UNRECOGNIZED_TAG,
            codes::UNRECOGNIZED_FLAG,
            codes::IGNORED_LINE,
            codes::PATCH_READ,
            codes::ECHO,
            codes::META_FIELD,
            codes::PARSE_PROGRESS,
        ];
        for code in &all {
            assert!(
                codes::explain(code).is_some(),
                "diagnostic code {code} has no explain() entry"
            );
        }
    }

    // ── Sink ────────────────────────────────────────────────────────────

    #[test]
    fn vec_sink_collects_in_order() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.emit(Diagnostic::info("A", "first", Some(1)));
        sink.emit(Diagnostic::warn("B", "second", Some(2)));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].id, "A");
        assert_eq!(sink[1].id, "B");
    }

    #[test]
    fn null_sink_discards() {
        let mut sink = NullSink;
        sink.emit(Diagnostic::error("A", "dropped", None));
        // nothing observable; just make sure it compiles and runs
    }

    // ── Serde round-trip ────────────────────────────────────────────────

    #[test]
    fn diagnostic_serde_roundtrip() {
        let d = Diagnostic::error(codes::UNTERMINATED_STRING, "test message", Some(7));
        let json = serde_json::to_string(&d).unwrap();
        let d2: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, d2);
    }

    #[test]
    fn diagnostic_serde_omits_none_fields() {
        let d = Diagnostic::error(codes::UNTERMINATED_STRING, "test", None);
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("line"), "None line should be omitted: {json}");
        assert!(
            !json.contains("context"),
            "None context should be omitted: {json}"
        );
    }

    // ── Context ─────────────────────────────────────────────────────────

    #[test]
    fn diagnostic_with_context() {
        let d = Diagnostic::warn(codes::UNRECOGNIZED_FLAG, "ignored", Some(4)).with_context(
            BTreeMap::from([("flag".into(), "wide_mode".into())]),
        );
        assert_eq!(d.context.as_ref().unwrap().get("flag").unwrap(), "wide_mode");
    }

    #[test]
    fn diagnostic_context_serde_roundtrip() {
        let d = Diagnostic::error(codes::INVALID_HEX_VALUE, "bad token", Some(9)).with_context(
            BTreeMap::from([("token".into(), "XYZ".into())]),
        );
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("context"), "context should be serialized: {json}");
        let d2: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, d2);
    }
}
