//! Metadata scanner for the leading block of a patch text file.
//!
//! Metadata lives at the top of the file and ends at the first blank line
//! or an explicit `@stop`. The scan is non-destructive: it borrows the
//! input, so the body parser simply re-reads from the top afterwards.

use crate::diag::{Diagnostic, DiagnosticSink, NullSink, codes};
use crate::model::PatchTextMeta;
use crate::text::{first_token, split_comment};

// Recognized metadata tags. `@nsobid` is accepted here for backward
// compatibility but carries no meta field; the body pass interprets it.
const TITLE_TAG: &str = "@title";
const PROGRAM_ID_TAG: &str = "@program";
const URL_TAG: &str = "@url";
const NSOBID_TAG: &str = "@nsobid";
const STOP_TAG: &str = "@stop";

/// Scan the metadata block, discarding diagnostic events.
pub fn scan_meta(input: &str) -> PatchTextMeta {
    scan_meta_with_sink(input, &mut NullSink)
}

/// Scan the metadata block, streaming events into `sink`.
///
/// Reads lines until the first blank line or an `@stop` directive. `@`
/// lines are matched against the metadata tag set; `#` lines are echoed
/// and remembered as legacy title candidates (last one wins). If `@title`
/// is never set, the title falls back to the last legacy candidate.
pub fn scan_meta_with_sink(input: &str, sink: &mut dyn DiagnosticSink) -> PatchTextMeta {
    let mut meta = PatchTextMeta::default();
    let mut legacy_title = String::new();
    let mut reached_eof = true;

    let mut line_num: u32 = 1;
    for raw_line in input.lines() {
        let line = raw_line.trim();

        // Meta stops at an empty line.
        if line.is_empty() {
            sink.emit(Diagnostic::info(
                codes::PARSE_PROGRESS,
                "done parsing meta",
                Some(line_num),
            ));
            reached_eof = false;
            break;
        }

        let (code, _) = split_comment(line);
        let code_lower = code.to_ascii_lowercase();

        if code.starts_with('@') {
            let tag = first_token(&code_lower);
            if tag == STOP_TAG {
                sink.emit(Diagnostic::info(
                    codes::PARSE_PROGRESS,
                    "done parsing meta (reached tag @stop)",
                    Some(line_num),
                ));
                reached_eof = false;
                break;
            }

            if let Some(field) = meta_field(&mut meta, tag) {
                let value = unquote(code[tag.len()..].trim());
                sink.emit(Diagnostic::info(
                    codes::META_FIELD,
                    format!("meta: {tag}={value}"),
                    Some(line_num),
                ));
                *field = value.to_string();
            }
        } else if code.starts_with('#') {
            sink.emit(Diagnostic::info(codes::ECHO, code.to_string(), Some(line_num)));
            legacy_title = code[1..].trim_start().to_string();
        }

        line_num += 1;
    }

    if reached_eof {
        sink.emit(Diagnostic::info(
            codes::PARSE_PROGRESS,
            "meta parsing reached end of file",
            None,
        ));
    }

    if meta.title.is_empty() && !legacy_title.is_empty() {
        sink.emit(Diagnostic::info(
            codes::META_FIELD,
            format!("using \"{legacy_title}\" as legacy style title"),
            None,
        ));
        meta.title = legacy_title;
    }

    meta
}

/// The meta field a tag assigns to, or `None` for unrecognized tags and
/// for `@nsobid` (recognized, but it has no field — the body pass reads it).
fn meta_field<'a>(meta: &'a mut PatchTextMeta, tag: &str) -> Option<&'a mut String> {
    match tag {
        TITLE_TAG => Some(&mut meta.title),
        PROGRAM_ID_TAG => Some(&mut meta.program_id),
        URL_TAG => Some(&mut meta.url),
        NSOBID_TAG => None,
        _ => None,
    }
}

/// Strip one layer of surrounding double quotes, if both ends are quoted.
fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
