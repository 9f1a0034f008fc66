use serde::{Deserialize, Serialize};

/// One contiguous run of bytes to write at an offset.
///
/// For [`PatchType::Cheat`] patches the offset is unused (always 0) and
/// `value` holds the UTF-8 text of one cheat-body line instead of bytes to
/// write.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PatchContent {
    /// The offset to patch at, after any active offset shift.
    pub offset: u32,
    /// The bytes to write, or one line of cheat text.
    pub value: Vec<u8>,
}

/// Kind of a patch, selected by the token after `@enabled`/`@disabled`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatchType {
    /// Ordinary offset/bytes patch against the target image.
    #[default]
    Binary,
    /// Patch applied to the heap rather than the image.
    Heap,
    /// Cheat-style patch whose contents are plain text lines.
    Cheat,
}

/// One patch in the compiled output.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Patch {
    /// Name of the patch, from the preceding comment or cheat header.
    pub name: String,
    /// Author, from the trailing `[...]` of the preceding comment.
    pub author: String,
    /// Kind of the patch.
    pub kind: PatchType,
    /// Whether the patch is currently enabled.
    pub enabled: bool,
    /// 1-based line number of the directive that started the patch.
    pub source_line: u32,
    /// Ordered content entries. Never empty once sealed.
    pub contents: Vec<PatchContent>,
}

/// Kind of target binary a collection addresses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// A shared-object image (`nsobid`).
    #[default]
    SharedObject,
    /// An executable image (`nrobid`).
    Executable,
}

/// Collection of patches for one target binary.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PatchCollection {
    /// Build ID of the target binary, case-sensitive as parsed.
    pub build_id: String,
    /// Kind of the target binary.
    pub target: TargetType,
    /// Ordered patches. Never empty once sealed.
    pub patches: Vec<Patch>,
}

/// Metadata from the leading block of a patch text file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PatchTextMeta {
    /// Title for description purposes, e.g. the target program's name.
    /// Falls back to the last legacy `#` comment title when `@title` is
    /// never set.
    pub title: String,
    /// Program ID of the target.
    pub program_id: String,
    /// A URL the patch text can be updated from.
    pub url: String,
}

/// Compiled output for one patch text. Can hold collections for multiple
/// target binaries.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PatchTextOutput {
    /// Metadata from the leading block.
    pub meta: PatchTextMeta,
    /// Patch collections, each intended for one binary, in seal order.
    pub collections: Vec<PatchCollection>,
}
