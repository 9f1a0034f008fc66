//! Tests for the metadata scanner.

use pchtxt_core::meta::scan_meta;
use pchtxt_core::parser::parse_str;

#[test]
fn title_program_url_parsed() {
    let meta = scan_meta(
        "@title \"The Game\"\n\
         @program 0100ABCD12345678\n\
         @url http://example.com/patch.pchtxt\n",
    );
    assert_eq!(meta.title, "The Game");
    assert_eq!(meta.program_id, "0100ABCD12345678");
    assert_eq!(meta.url, "http://example.com/patch.pchtxt");
}

#[test]
fn unquoted_title_kept_verbatim() {
    let meta = scan_meta("@title My Game\n");
    assert_eq!(meta.title, "My Game");
}

#[test]
fn half_quoted_value_not_stripped() {
    let meta = scan_meta("@title \"My Game\n");
    assert_eq!(meta.title, "\"My Game");
}

#[test]
fn tags_are_case_insensitive() {
    let meta = scan_meta("@TITLE \"X\"\n@Program abc\n");
    assert_eq!(meta.title, "X");
    assert_eq!(meta.program_id, "abc");
}

#[test]
fn values_keep_original_case() {
    let meta = scan_meta("@program ABCdef\n");
    assert_eq!(meta.program_id, "ABCdef");
}

#[test]
fn legacy_title_fallback() {
    let meta = scan_meta("#Old School Title\n@program 01\n");
    assert_eq!(meta.title, "Old School Title");
}

#[test]
fn explicit_title_beats_legacy() {
    let meta = scan_meta("#Old\n@title \"New\"\n");
    assert_eq!(meta.title, "New");
}

#[test]
fn last_legacy_title_wins() {
    let meta = scan_meta("#First\n#Second\n");
    assert_eq!(meta.title, "Second");
}

#[test]
fn scan_stops_at_blank_line() {
    let meta = scan_meta("@title \"Top\"\n\n@url http://nope\n");
    assert_eq!(meta.title, "Top");
    assert_eq!(meta.url, "");
}

#[test]
fn scan_stops_at_stop_tag() {
    let meta = scan_meta("@title \"Top\"\n@stop\n@url http://nope\n");
    assert_eq!(meta.title, "Top");
    assert_eq!(meta.url, "");
}

#[test]
fn trailing_comment_stripped_from_meta_line() {
    let meta = scan_meta("@title \"The Game\" / the display name\n");
    assert_eq!(meta.title, "The Game");
}

#[test]
fn legacy_nsobid_has_no_meta_field() {
    let meta = scan_meta("@nsobid ABCDEF\n@title \"T\"\n");
    assert_eq!(meta.title, "T");
    assert_eq!(meta.program_id, "");
    assert_eq!(meta.url, "");
}

#[test]
fn empty_input_yields_default_meta() {
    let meta = scan_meta("");
    assert_eq!(meta.title, "");
    assert_eq!(meta.program_id, "");
    assert_eq!(meta.url, "");
}

#[test]
fn parse_str_carries_the_same_meta() {
    let input = "@title \"The Game\"\n@program 0100\n\n@flag nsobid BID\n@enabled\n00000000 01\n";
    let result = parse_str(input);
    assert_eq!(result.output.meta, scan_meta(input));
    assert_eq!(result.output.meta.title, "The Game");
}
