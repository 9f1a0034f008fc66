//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. The numbering is stable: `PCH1xxx` are fatal parse
//! errors, `PCH2xxx` are recoverable warnings, `PCH3xxx` are informational
//! events.

// ── Fatal errors (PCH1xxx) ──────────────────────────────────────────────

/// A patch or cheat directive appeared before any build id was set.
pub const MISSING_BUILD_ID: &str = "PCH1001";
/// A legacy `@nsobid` tag had no value after it.
pub const LEGACY_BUILD_ID_MISSING_VALUE: &str = "PCH1002";
/// A content-line offset exceeded 32 bits (more than 8 hex digits).
pub const OFFSET_OUT_OF_RANGE: &str = "PCH1003";
/// A quoted string value had no closing quote before end of line.
pub const UNTERMINATED_STRING: &str = "PCH1004";
/// A hex value token had an odd number of digits.
pub const ODD_HEX_LENGTH: &str = "PCH1005";
/// A value token contained non-hex characters.
pub const INVALID_HEX_VALUE: &str = "PCH1006";
/// An `offset_shift` flag value could not be parsed as an integer.
pub const INVALID_OFFSET_SHIFT: &str = "PCH1007";

// ── Warnings (PCH2xxx) ──────────────────────────────────────────────────

/// An `@`-tag was not recognized and the line was ignored.
pub const UNRECOGNIZED_TAG: &str = "PCH2001";
/// A `@flag` name was not recognized and the flag was ignored.
pub const UNRECOGNIZED_FLAG: &str = "PCH2002";
/// A content line did not start with a hex offset and was skipped.
pub const IGNORED_LINE: &str = "PCH2003";

// ── Info (PCH3xxx) ──────────────────────────────────────────────────────

/// A patch was sealed into its collection.
pub const PATCH_READ: &str = "PCH3001";
/// An echo (`#`) line was encountered.
pub const ECHO: &str = "PCH3002";
/// A metadata field was read.
pub const META_FIELD: &str = "PCH3003";
/// Parsing progress: collection open/close, debug values, end of input.
pub const PARSE_PROGRESS: &str = "PCH3004";

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    match id {
        MISSING_BUILD_ID => Some(
            "Every patch must belong to a collection keyed by a build id. Add a \
             `@flag nsobid <id>` or `@flag nrobid <id>` line before the first \
             `@enabled`/`@disabled` directive or cheat header.",
        ),
        LEGACY_BUILD_ID_MISSING_VALUE => Some(
            "A legacy `@nsobid` tag must be followed by the target build id on \
             the same line.",
        ),
        OFFSET_OUT_OF_RANGE => Some(
            "Offsets are 32-bit: at most 8 hex digits after leading zeros are \
             stripped.",
        ),
        UNTERMINATED_STRING => Some(
            "A string value opened with `\"` must be closed by an unescaped `\"` \
             before the end of the line.",
        ),
        ODD_HEX_LENGTH => Some(
            "Hex value tokens encode whole bytes, so they need an even number of \
             digits.",
        ),
        INVALID_HEX_VALUE => Some("Hex value tokens may only contain 0-9, a-f, A-F."),
        INVALID_OFFSET_SHIFT => Some(
            "`@flag offset_shift` takes a signed integer, optionally with a `0x` \
             prefix for hex.",
        ),
        UNRECOGNIZED_TAG => Some(
            "Only `@stop`, `@enabled`, `@disabled`, `@flag`, `@nsobid` and the \
             metadata tags are understood; anything else is skipped.",
        ),
        UNRECOGNIZED_FLAG => Some(
            "Known flags: be, le, nsobid, nrobid, offset_shift, debug_info, \
             print_values.",
        ),
        IGNORED_LINE => Some(
            "While a patch is accepting content, a line whose first token is not \
             valid hex is treated as free-form notes and skipped.",
        ),
        PATCH_READ => Some("A patch with at least one content entry was completed."),
        ECHO => Some("Echo lines starting with `#` are reported verbatim."),
        META_FIELD => Some("A metadata tag in the leading block was read."),
        PARSE_PROGRESS => Some(
            "Progress reporting: collections opening and closing, per-line debug \
             values when `debug_info` is on, and end-of-input notices.",
        ),
        _ => None,
    }
}
