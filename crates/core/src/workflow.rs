//! Workflow template store and graph patcher.
//!
//! Templates are ComfyUI "API format" documents: a JSON object keyed by
//! node ID, where every node looks like
//!
//! ```json
//! { "class_type": "CLIPTextEncode", "inputs": { "text": "...", "clip": ["4", 1] } }
//! ```
//!
//! A template is read from disk on every request, patched in memory with
//! the request parameters, and discarded once submitted.

use std::path::PathBuf;

use rand::Rng;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::generation::{ImageRequest, VideoRequest};

/// Template used by `/api/image`.
pub const IMAGE_WORKFLOW: &str = "image_workflow_api.json";

/// Template used by `/api/video`.
pub const VIDEO_WORKFLOW: &str = "video_workflow_api.json";

/// Smallest seed handed to the sampler.
pub const SEED_MIN: u64 = 1;

/// Seeds are drawn from `[SEED_MIN, SEED_MAX_EXCLUSIVE)`.
pub const SEED_MAX_EXCLUSIVE: u64 = 10_000_000_000;

/// Width and height forced onto every video latent node.
///
/// Keeps VRAM use inside a 6 GB budget regardless of what the client asks.
pub const VIDEO_DIMENSION: u32 = 384;

// Node IDs of the standard SD 1.5 text-to-image template.
const IMAGE_SAMPLER_NODE: &str = "3";
const IMAGE_LATENT_NODE: &str = "5";
const IMAGE_POSITIVE_NODE: &str = "6";
const IMAGE_NEGATIVE_NODE: &str = "7";

/// Node classes whose `text` input receives the video prompt.
const VIDEO_TEXT_CLASSES: &[&str] = &[
    "CogVideoXEncodePrompt",
    "CLIPTextEncode",
    "CLIPTextEncodeSelect",
];

/// Node classes whose `length`/`width`/`height` inputs size the video.
const VIDEO_LATENT_CLASSES: &[&str] = &["EmptyCogVideoLatent", "EmptyLatentImage"];

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// An in-memory workflow graph: node ID -> node record.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowGraph(Map<String, Value>);

impl WorkflowGraph {
    /// Wrap a parsed JSON document. The top level must be an object.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(nodes) => Ok(Self(nodes)),
            other => Err(CoreError::InvalidWorkflow(format!(
                "expected a JSON object of nodes, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Look up a node record by ID.
    pub fn node(&self, node_id: &str) -> Option<&Value> {
        self.0.get(node_id)
    }

    /// Read one input value of one node.
    pub fn input(&self, node_id: &str, name: &str) -> Option<&Value> {
        self.node(node_id)?.get("inputs")?.get(name)
    }

    /// Consume the graph, returning the JSON document to submit.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Set `inputs.<name>` on node `node_id` if that node exists.
    ///
    /// Returns whether anything was written. A node that exists but has
    /// no `inputs` object is a broken template.
    fn set_input(&mut self, node_id: &str, name: &str, value: Value) -> Result<bool, CoreError> {
        let Some(node) = self.0.get_mut(node_id) else {
            tracing::debug!(node_id, input = name, "Node not in template, skipping");
            return Ok(false);
        };
        let inputs = inputs_of(node_id, node)?;
        inputs.insert(name.to_string(), value);
        Ok(true)
    }
}

fn inputs_of<'a>(node_id: &str, node: &'a mut Value) -> Result<&'a mut Map<String, Value>, CoreError> {
    node.get_mut("inputs")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| CoreError::InvalidWorkflow(format!("node {node_id} has no inputs object")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Template store
// ---------------------------------------------------------------------------

/// Read-only directory of workflow templates.
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    dir: PathBuf,
}

impl WorkflowStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load and parse the template `name` from disk. No caching.
    pub async fn load(&self, name: &str) -> Result<WorkflowGraph, CoreError> {
        let path = self.dir.join(name);

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::NotFound(format!(
                    "Workflow file {name} not found."
                )));
            }
            Err(e) => {
                return Err(CoreError::InvalidWorkflow(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        let value: Value = serde_json::from_slice(&raw)
            .map_err(|e| CoreError::InvalidWorkflow(format!("{name}: {e}")))?;

        let graph = WorkflowGraph::from_value(value)?;
        tracing::debug!(template = name, nodes = graph.0.len(), "Loaded workflow template");
        Ok(graph)
    }
}

// ---------------------------------------------------------------------------
// Patching
// ---------------------------------------------------------------------------

/// Draw a fresh sampler seed in `[SEED_MIN, SEED_MAX_EXCLUSIVE)`.
pub fn random_seed() -> u64 {
    rand::rng().random_range(SEED_MIN..SEED_MAX_EXCLUSIVE)
}

/// Inject image request parameters into the SD 1.5 template.
///
/// Writes the positive prompt, negative prompt, sampler seed and latent
/// size by fixed node ID. Any of those nodes may be absent; missing ones
/// are skipped and the rest are still written. A present node without an
/// `inputs` object fails with [`CoreError::InvalidWorkflow`].
pub fn patch_image_workflow(
    graph: &mut WorkflowGraph,
    req: &ImageRequest,
    seed: u64,
) -> Result<(), CoreError> {
    graph.set_input(IMAGE_POSITIVE_NODE, "text", Value::from(req.prompt.as_str()))?;
    graph.set_input(
        IMAGE_NEGATIVE_NODE,
        "text",
        Value::from(req.negative_prompt.as_str()),
    )?;
    graph.set_input(IMAGE_SAMPLER_NODE, "seed", Value::from(seed))?;
    graph.set_input(IMAGE_LATENT_NODE, "width", Value::from(req.width))?;
    graph.set_input(IMAGE_LATENT_NODE, "height", Value::from(req.height))?;
    Ok(())
}

/// Inject video request parameters into every matching node.
///
/// Unlike the image template, node IDs are not fixed: every node is
/// scanned and matched on `class_type`. Only inputs that already exist
/// are overwritten. Width and height are forced to [`VIDEO_DIMENSION`].
/// Every seeded node gets its own draw from `next_seed`.
pub fn patch_video_workflow(
    graph: &mut WorkflowGraph,
    req: &VideoRequest,
    mut next_seed: impl FnMut() -> u64,
) -> Result<(), CoreError> {
    for (node_id, node) in graph.0.iter_mut() {
        let class_type = node
            .get("class_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let inputs = inputs_of(node_id, node)?;

        if VIDEO_TEXT_CLASSES.contains(&class_type.as_str()) {
            overwrite_existing(inputs, "text", Value::from(req.prompt.as_str()));
        }

        if VIDEO_LATENT_CLASSES.contains(&class_type.as_str()) {
            overwrite_existing(inputs, "length", Value::from(req.frames));
            overwrite_existing(inputs, "width", Value::from(VIDEO_DIMENSION));
            overwrite_existing(inputs, "height", Value::from(VIDEO_DIMENSION));
        }

        if let Some(slot) = inputs.get_mut("seed") {
            let seed = next_seed();
            *slot = Value::from(seed);
            tracing::trace!(node_id = %node_id, seed, "Seeded video node");
        }
    }
    Ok(())
}

fn overwrite_existing(inputs: &mut Map<String, Value>, name: &str, value: Value) {
    if let Some(slot) = inputs.get_mut(name) {
        *slot = value;
    }
}
