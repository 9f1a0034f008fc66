use crate::model::PatchTextOutput;

/// Serialize a compiled output to a pretty-printed JSON string.
pub fn to_pretty_json(output: &PatchTextOutput) -> String {
    serde_json::to_string_pretty(output).expect("PatchTextOutput serialization cannot fail")
}
