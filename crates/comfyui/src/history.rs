//! Parsing of `GET /history/{prompt_id}` responses.
//!
//! A history body looks like
//!
//! ```json
//! { "<prompt_id>": { "outputs": { "9": { "images": [ { "filename": "a.png", "subfolder": "", "type": "output" } ] } } } }
//! ```
//!
//! Output nodes list their files under `images`, `gifs` (animated
//! outputs from VideoHelperSuite / AnimateDiff) or `videos`.

use serde::Deserialize;
use serde_json::Value;

/// Output-kind keys, in the order they are read within one node.
pub const OUTPUT_KINDS: &[&str] = &["images", "gifs", "videos"];

/// One file produced by an output node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactDescriptor {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    /// Storage area: `output`, `temp` or `input`.
    #[serde(rename = "type", default = "default_folder_type")]
    pub folder_type: String,
}

fn default_folder_type() -> String {
    "output".to_string()
}

/// Pull the record for `prompt_id` out of a history body.
pub fn history_entry<'a>(history: &'a Value, prompt_id: &str) -> Option<&'a Value> {
    history.get(prompt_id)
}

/// List every artifact in a history record.
///
/// Nodes are visited in document order; within a node, `images` come
/// before `gifs`, which come before `videos`. Entries that do not look
/// like descriptors are skipped with a warning.
pub fn artifact_descriptors(entry: &Value) -> Vec<ArtifactDescriptor> {
    let Some(outputs) = entry.get("outputs").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for (node_id, node_output) in outputs {
        for kind in OUTPUT_KINDS {
            let Some(items) = node_output.get(*kind).and_then(Value::as_array) else {
                continue;
            };
            for item in items {
                match ArtifactDescriptor::deserialize(item) {
                    Ok(descriptor) => found.push(descriptor),
                    Err(e) => {
                        tracing::warn!(node_id = %node_id, kind, error = %e, "Skipping malformed output entry");
                    }
                }
            }
        }
    }
    found
}
