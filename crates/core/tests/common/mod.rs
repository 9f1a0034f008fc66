//! Shared test helpers for `pchtxt_core` integration tests.

#![allow(unreachable_pub)]

use pchtxt_core::diag::{Diagnostic, Severity};
use pchtxt_core::model::PatchCollection;
use pchtxt_core::parser::ParseResult;

// ─── Parse-result helpers ────────────────────────────────────────────────

/// Collect diagnostic codes (in order) from a parse result.
#[allow(dead_code)]
pub fn diag_codes(result: &ParseResult) -> Vec<String> {
    result.diagnostics.iter().map(|d| d.id.to_string()).collect()
}

/// Whether any diagnostic with the given code was emitted.
#[allow(dead_code)]
pub fn has_diag(result: &ParseResult, code: &str) -> bool {
    result.diagnostics.iter().any(|d| &*d.id == code)
}

/// Find the first diagnostic with the given code.
#[allow(dead_code)]
pub fn find_diag<'a>(result: &'a ParseResult, code: &str) -> &'a Diagnostic {
    result
        .diagnostics
        .iter()
        .find(|d| &*d.id == code)
        .unwrap_or_else(|| panic!("expected diagnostic {code}"))
}

/// Whether any error-severity diagnostic was emitted.
#[allow(dead_code)]
pub fn has_error(result: &ParseResult) -> bool {
    result
        .diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error))
}

/// The single collection of a result that is expected to have exactly one.
#[allow(dead_code)]
pub fn only_collection(result: &ParseResult) -> &PatchCollection {
    assert_eq!(
        result.output.collections.len(),
        1,
        "expected exactly one collection, got {:?}",
        result.output.collections
    );
    &result.output.collections[0]
}

/// Find the collection with the given build id.
#[allow(dead_code)]
pub fn find_collection<'a>(result: &'a ParseResult, build_id: &str) -> &'a PatchCollection {
    result
        .output
        .collections
        .iter()
        .find(|c| c.build_id == build_id)
        .unwrap_or_else(|| panic!("expected a collection for build id {build_id}"))
}
