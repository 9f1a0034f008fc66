//! Patch body parser — a single-pass line scanner that compiles patch text
//! into a [`PatchTextOutput`].
//!
//! The metadata block is pre-scanned non-destructively, then the whole
//! input is walked once. Directives (`@...`) drive an explicit mode state
//! machine; content lines accumulate into the currently open patch.
//! Structural errors abort the parse and yield an empty output; see the
//! crate-level docs for the fatal/recoverable split.

use crate::diag::{Diagnostic, DiagnosticSink, codes};
use crate::meta::scan_meta_with_sink;
use crate::model::{
    Patch, PatchCollection, PatchContent, PatchTextOutput, PatchType, TargetType,
};
use crate::text::{
    decode_escapes, decode_hex_bytes, first_token, hex_to_u32, is_hex_str, parse_int_token,
    split_comment, trim_leading_zeros,
};

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

// ── Directive vocabulary ────────────────────────────────────────────────

const STOP_TAG: &str = "@stop";
const ENABLED_TAG: &str = "@enabled";
const DISABLED_TAG: &str = "@disabled";
const FLAG_TAG: &str = "@flag";
const LEGACY_NSOBID_TAG: &str = "@nsobid";
/// Metadata tags are handled by the pre-scan; the body pass skips them
/// without a warning.
const META_TAGS: [&str; 4] = ["@title", "@program", "@url", "@nsobid"];

// patch type tokens after @enabled/@disabled
const PATCH_TYPE_HEAP: &str = "heap";
const PATCH_TYPE_AMS: &str = "ams";

// flag names
const BIG_ENDIAN_FLAG: &str = "be";
const LITTLE_ENDIAN_FLAG: &str = "le";
const NSOBID_FLAG: &str = "nsobid";
const NROBID_FLAG: &str = "nrobid";
const OFFSET_SHIFT_FLAG: &str = "offset_shift";
const DEBUG_INFO_FLAG: &str = "debug_info";
const ALT_DEBUG_INFO_FLAG: &str = "print_values"; // legacy

/// Result of parsing a patch text input string.
#[derive(Debug, serde::Serialize)]
pub struct ParseResult {
    /// The compiled output. Empty when a fatal error aborted the parse.
    pub output: PatchTextOutput,
    /// Diagnostics (errors, warnings, info) produced during parsing.
    pub diagnostics: Vec<Diagnostic>,
}

// ─── Parser Mode State Machine ──────────────────────────────────────────

/// The parser operates in one of three modes, driven by directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// No patch is accepting content; plain lines are ignored.
    Idle,
    /// A patch directive was seen; content lines accumulate.
    AcceptingPatch,
    /// An `@stop` directive ended the scan.
    Stopped,
}

/// Marker for fatal errors. The diagnostic has already been emitted by the
/// time this is returned; the parse aborts and yields an empty output.
struct FatalError;

// ── Public API ──────────────────────────────────────────────────────────

/// Parse a patch text string, collecting diagnostics alongside the output.
pub fn parse_str(input: &str) -> ParseResult {
    let mut diagnostics = Vec::new();
    let output = parse_with_sink(input, &mut diagnostics);
    ParseResult {
        output,
        diagnostics,
    }
}

/// Parse a patch text string, streaming diagnostics into a caller sink.
///
/// On a fatal error all partially built state is discarded and the default
/// (empty) output is returned; the sink has already received the error.
pub fn parse_with_sink(input: &str, sink: &mut dyn DiagnosticSink) -> PatchTextOutput {
    Parser::new(input, sink).parse()
}

// ── Parser implementation ───────────────────────────────────────────────

struct Parser<'a> {
    input: &'a str,
    sink: &'a mut dyn DiagnosticSink,
    mode: Mode,
    /// 1-based number of the line currently being processed.
    line_num: u32,
    /// Content of the most recent comment line. Read only by patch-start
    /// directives for name/author extraction; written only by comment lines.
    last_comment: String,
    /// The patch currently being built, possibly without content yet.
    patch: Patch,
    /// The collection currently being built, possibly without a build id.
    collection: PatchCollection,
    /// Collections sealed so far, in order.
    collections: Vec<PatchCollection>,
    /// Signed shift added to every parsed offset.
    offset_shift: i32,
    big_endian: bool,
    /// Extra per-line progress events (`debug_info` flag).
    verbose: bool,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            input,
            sink,
            mode: Mode::Idle,
            line_num: 0,
            last_comment: String::new(),
            patch: Patch::default(),
            collection: PatchCollection::default(),
            collections: Vec::new(),
            offset_shift: 0,
            big_endian: false,
            verbose: false,
        }
    }

    // ── Event helpers ───────────────────────────────────────────────────

    fn info(&mut self, id: &'static str, message: String) {
        self.sink
            .emit(Diagnostic::info(id, message, Some(self.line_num)));
    }

    /// Emit a progress event only when `debug_info` is active.
    fn debug(&mut self, message: String) {
        if self.verbose {
            self.info(codes::PARSE_PROGRESS, message);
        }
    }

    // ── Main loop ───────────────────────────────────────────────────────

    fn parse(mut self) -> PatchTextOutput {
        // The metadata pre-scan shares the sink; the body pass then
        // re-reads from the top of the same borrowed input.
        let meta = scan_meta_with_sink(self.input, &mut *self.sink);

        for (idx, raw_line) in self.input.lines().enumerate() {
            if self.mode == Mode::Stopped {
                break;
            }
            self.line_num = idx as u32 + 1;

            let line = raw_line.trim();
            let (code, comment) = split_comment(line);

            let step = match line.chars().next() {
                None => Ok(()),
                Some('@') => self.directive(code),
                Some('#') => {
                    self.info(codes::ECHO, line.to_string());
                    Ok(())
                }
                Some('[') => self.cheat_header(code),
                Some('/') => {
                    self.last_comment = comment.to_string();
                    Ok(())
                }
                Some(_) => self.content_line(code),
            };

            if step.is_err() {
                return PatchTextOutput::default();
            }
        }

        if self.mode != Mode::Stopped {
            self.sink.emit(Diagnostic::info(
                codes::PARSE_PROGRESS,
                "done parsing patches",
                None,
            ));
        }

        // Seal whatever is still open at end of input.
        self.seal_patch();
        self.seal_collection("parsing completed for");

        PatchTextOutput {
            meta,
            collections: self.collections,
        }
    }

    // ── Directive lines ─────────────────────────────────────────────────

    fn directive(&mut self, code: &str) -> Result<(), FatalError> {
        let code_lower = code.to_ascii_lowercase();
        let tag = first_token(&code_lower);

        if tag == STOP_TAG {
            self.info(
                codes::PARSE_PROGRESS,
                "done parsing patches (reached tag @stop)".to_string(),
            );
            self.mode = Mode::Stopped;
        } else if tag == ENABLED_TAG || tag == DISABLED_TAG {
            self.start_patch(tag == ENABLED_TAG, &code_lower, tag.len())?;
        } else if tag == FLAG_TAG {
            self.flag(code, tag.len())?;
        } else if code_lower.starts_with(LEGACY_NSOBID_TAG) {
            self.legacy_build_id(code)?;
        } else if !META_TAGS.contains(&tag) {
            self.sink.emit(
                Diagnostic::warn(
                    codes::UNRECOGNIZED_TAG,
                    format!("ignored unrecognized tag: {tag}"),
                    Some(self.line_num),
                )
                .with_context(ctx!("tag" => tag)),
            );
        }
        Ok(())
    }

    /// Handle `@enabled`/`@disabled`: seal the pending patch and open a new
    /// one, deriving name/author from the most recent comment line.
    fn start_patch(
        &mut self,
        enabled: bool,
        code_lower: &str,
        tag_len: usize,
    ) -> Result<(), FatalError> {
        if self.collection.build_id.is_empty() {
            self.sink.emit(Diagnostic::error(
                codes::MISSING_BUILD_ID,
                "missing build id, abort parsing",
                Some(self.line_num),
            ));
            return Err(FatalError);
        }

        self.seal_patch();

        // A cheat patch names itself in its header, so an enable/disable
        // directive following an empty cheat header keeps that name.
        let keeps_cheat_name = self.patch.kind == PatchType::Cheat;

        self.patch.enabled = enabled;
        self.patch.source_line = self.line_num;

        if !keeps_cheat_name {
            let (name, author) = split_name_author(&self.last_comment);
            self.patch.name = name;
            self.patch.author = author;
        }

        let type_token = first_token(code_lower[tag_len..].trim_start());
        self.patch.kind = match type_token {
            PATCH_TYPE_HEAP => PatchType::Heap,
            PATCH_TYPE_AMS => PatchType::Cheat,
            _ => PatchType::Binary,
        };

        self.mode = Mode::AcceptingPatch;
        self.debug(format!("parsing patch: {}", self.patch.name));
        Ok(())
    }

    /// Handle `@flag <name> [value]`. The flag name is case-insensitive;
    /// the value keeps its original case (build ids are case-sensitive).
    fn flag(&mut self, code: &str, tag_len: usize) -> Result<(), FatalError> {
        let body = code[tag_len..].trim_start();
        let name_token = first_token(body);
        let value = body[name_token.len()..].trim_start();
        let name = name_token.to_ascii_lowercase();

        match name.as_str() {
            BIG_ENDIAN_FLAG => self.big_endian = true,
            LITTLE_ENDIAN_FLAG => self.big_endian = false,
            NSOBID_FLAG => self.open_collection(value, TargetType::SharedObject),
            NROBID_FLAG => self.open_collection(value, TargetType::Executable),
            OFFSET_SHIFT_FLAG => {
                let Some(shift) = parse_int_token(value) else {
                    self.sink.emit(
                        Diagnostic::error(
                            codes::INVALID_OFFSET_SHIFT,
                            format!("bad offset_shift value: {value}"),
                            Some(self.line_num),
                        )
                        .with_context(ctx!("value" => value)),
                    );
                    return Err(FatalError);
                };
                self.offset_shift = shift;
                self.debug(format!("offset shift is now {shift}"));
            }
            DEBUG_INFO_FLAG | ALT_DEBUG_INFO_FLAG => {
                self.verbose = true;
                self.info(
                    codes::PARSE_PROGRESS,
                    "additional debug info enabled".to_string(),
                );
            }
            _ => self.sink.emit(
                Diagnostic::warn(
                    codes::UNRECOGNIZED_FLAG,
                    format!("ignored unrecognized flag type: {name}"),
                    Some(self.line_num),
                )
                .with_context(ctx!("flag" => name.clone())),
            ),
        }
        Ok(())
    }

    /// Handle the legacy `@nsobid` form: same collection switch as
    /// `@flag nsobid`, always targeting a shared object. The tag is
    /// followed by one separator character (historically a dash, as in
    /// `@nsobid-B04254EB...`, or a space), then the build id.
    fn legacy_build_id(&mut self, code: &str) -> Result<(), FatalError> {
        let rest = &code[LEGACY_NSOBID_TAG.len()..];
        let sep = rest.chars().next().map_or(0, char::len_utf8);
        let build_id = rest[sep..].trim();
        if build_id.is_empty() {
            self.sink.emit(Diagnostic::error(
                codes::LEGACY_BUILD_ID_MISSING_VALUE,
                "legacy nsobid tag missing value",
                Some(self.line_num),
            ));
            return Err(FatalError);
        }
        self.open_collection(build_id, TargetType::SharedObject);
        self.debug(format!("parsing started for {build_id} (legacy style bid)"));
        Ok(())
    }

    // ── Cheat headers ───────────────────────────────────────────────────

    /// Handle `[name]`: seal the pending patch and open a cheat patch.
    /// Cheat patches are always enabled.
    fn cheat_header(&mut self, code: &str) -> Result<(), FatalError> {
        if self.collection.build_id.is_empty() {
            self.sink.emit(Diagnostic::error(
                codes::MISSING_BUILD_ID,
                "missing build id, abort parsing",
                Some(self.line_num),
            ));
            return Err(FatalError);
        }

        self.seal_patch();

        let name = match code.rfind(']') {
            Some(pos) => &code[1..pos],
            None => &code[1..],
        };
        self.patch = Patch {
            name: name.trim().to_string(),
            author: String::new(),
            kind: PatchType::Cheat,
            enabled: true,
            source_line: self.line_num,
            contents: Vec::new(),
        };

        self.debug(format!("parsing AMS cheat: {}", self.patch.name));
        Ok(())
    }

    // ── Content lines ───────────────────────────────────────────────────

    fn content_line(&mut self, code: &str) -> Result<(), FatalError> {
        if self.mode != Mode::AcceptingPatch {
            return Ok(());
        }

        // Cheat bodies carry each line as plain text, offset unused.
        if self.patch.kind == PatchType::Cheat {
            self.patch.contents.push(PatchContent {
                offset: 0,
                value: code.as_bytes().to_vec(),
            });
            self.debug(format!("AMS cheat: {code}"));
            return Ok(());
        }

        let code_lower = code.to_ascii_lowercase();
        let offset_token = first_token(&code_lower);

        // A non-hex leading token means the line is free-form notes
        // interleaved with the patch body; skip it.
        if !is_hex_str(offset_token) {
            self.sink.emit(
                Diagnostic::warn(
                    codes::IGNORED_LINE,
                    format!("line ignored: invalid offset: {code}"),
                    Some(self.line_num),
                )
                .with_context(ctx!("token" => offset_token)),
            );
            return Ok(());
        }

        let stripped = trim_leading_zeros(offset_token);
        if stripped.len() > 8 {
            self.sink.emit(Diagnostic::error(
                codes::OFFSET_OUT_OF_RANGE,
                format!("offset: {stripped} out of range"),
                Some(self.line_num),
            ));
            return Err(FatalError);
        }
        let offset = hex_to_u32(stripped).wrapping_add_signed(self.offset_shift);

        // The value region keeps the original case: string literals are
        // stored as written.
        let value_region = code[offset_token.len()..].trim_start();
        let value = if value_region.starts_with('"') {
            self.parse_string_value(value_region)?
        } else {
            self.parse_hex_value(value_region)?
        };

        if self.verbose {
            let rendered: String = value.iter().map(|b| format!("{b:02x}")).collect();
            self.info(
                codes::PARSE_PROGRESS,
                format!("offset: {offset:08x} value: {rendered} len: {}", value.len()),
            );
        }
        self.patch.contents.push(PatchContent { offset, value });
        Ok(())
    }

    /// Parse a quoted string value: the text between the opening quote and
    /// the first unescaped closing quote (a `"` preceded by an even number
    /// of backslashes), with escapes decoded and a NUL terminator
    /// appended. Text after the closing quote is ignored.
    fn parse_string_value(&mut self, region: &str) -> Result<Vec<u8>, FatalError> {
        let bytes = region.as_bytes();
        let mut backslashes = 0usize;
        let mut closing = None;
        for (i, b) in bytes.iter().enumerate().skip(1) {
            match *b {
                b'"' if backslashes % 2 == 0 => {
                    closing = Some(i);
                    break;
                }
                b'\\' => backslashes += 1,
                _ => backslashes = 0,
            }
        }

        let Some(closing) = closing else {
            self.sink.emit(Diagnostic::error(
                codes::UNTERMINATED_STRING,
                format!("cannot find string closing: {region}"),
                Some(self.line_num),
            ));
            return Err(FatalError);
        };

        let mut value = decode_escapes(&region[1..closing]).into_bytes();
        value.push(0);
        Ok(value)
    }

    /// Parse whitespace-separated hex byte tokens, concatenating the
    /// decoded bytes of every token under the current endianness.
    fn parse_hex_value(&mut self, region: &str) -> Result<Vec<u8>, FatalError> {
        let mut value = Vec::new();
        for token in region.split_whitespace() {
            if token.len() % 2 != 0 {
                self.sink.emit(
                    Diagnostic::error(
                        codes::ODD_HEX_LENGTH,
                        format!("bad length for hex values: {token}"),
                        Some(self.line_num),
                    )
                    .with_context(ctx!("token" => token)),
                );
                return Err(FatalError);
            }
            if !is_hex_str(token) {
                self.sink.emit(
                    Diagnostic::error(
                        codes::INVALID_HEX_VALUE,
                        format!("not valid hex values: {token}"),
                        Some(self.line_num),
                    )
                    .with_context(ctx!("token" => token)),
                );
                return Err(FatalError);
            }
            value.extend(decode_hex_bytes(token, self.big_endian));
        }
        Ok(value)
    }

    // ── Sealing ─────────────────────────────────────────────────────────

    /// Seal the current patch into the current collection if it has at
    /// least one content entry. Empty patches are dropped silently.
    fn seal_patch(&mut self) {
        if self.patch.contents.is_empty() {
            return;
        }
        let sealed = std::mem::take(&mut self.patch);
        self.info(codes::PATCH_READ, format!("patch read: {}", sealed.name));
        self.collection.patches.push(sealed);
    }

    /// Seal the current collection into the output list if it has at
    /// least one patch. Empty collections are dropped silently.
    fn seal_collection(&mut self, closing_note: &str) {
        if self.collection.patches.is_empty() {
            return;
        }
        let sealed = std::mem::take(&mut self.collection);
        self.debug(format!("{closing_note} {}", sealed.build_id));
        self.collections.push(sealed);
    }

    /// Seal the current patch and collection, then continue an existing
    /// collection with this build id or start a fresh one.
    ///
    /// Reopening an already-sealed collection keeps its original target
    /// type. Switching build ids always leaves content acceptance off
    /// until the next patch directive.
    fn open_collection(&mut self, build_id: &str, target: TargetType) {
        self.seal_patch();
        self.patch = Patch::default();
        self.seal_collection("parsing stopped for");

        match self
            .collections
            .iter()
            .position(|c| c.build_id == build_id)
        {
            Some(pos) => self.collection = self.collections.remove(pos),
            None => {
                self.collection = PatchCollection {
                    build_id: build_id.to_string(),
                    target,
                    patches: Vec::new(),
                };
            }
        }

        self.mode = Mode::Idle;
        self.debug(format!("parsing started for {build_id}"));
    }
}

// ── Comment name/author extraction ──────────────────────────────────────

/// Derive a patch name and author from the most recent comment line.
///
/// The author is the text between the last `[`...`]` pair (or everything
/// after the last `[` when no matching `]` follows); the name is
/// everything before the `[`, or the whole comment when there is none.
fn split_name_author(comment: &str) -> (String, String) {
    match comment.rfind('[') {
        Some(open) => {
            let author = match comment.rfind(']') {
                Some(close) if close > open => &comment[open + 1..close],
                _ => &comment[open + 1..],
            };
            (
                comment[..open].trim_end().to_string(),
                author.trim().to_string(),
            )
        }
        None => (comment.trim_end().to_string(), String::new()),
    }
}
