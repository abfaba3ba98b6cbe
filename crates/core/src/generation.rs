//! Generation request and response shapes.
//!
//! Every field except `prompt` has a default, so a body of just
//! `{"prompt": "..."}` is a valid request for all three endpoints.

use serde::{Deserialize, Serialize};

/// Model used by `/api/text` when the request omits one.
pub const DEFAULT_TEXT_MODEL: &str = "qwen2.5:latest";

/// Negative prompt used by `/api/image` when the request omits one.
pub const DEFAULT_NEGATIVE_PROMPT: &str = "text, watermark, blurry, low quality";

pub const DEFAULT_IMAGE_WIDTH: u32 = 512;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 512;
pub const DEFAULT_VIDEO_FRAMES: u32 = 16;

/// Format label attached to image responses.
///
/// Not derived from the artifact bytes.
pub const IMAGE_FORMAT: &str = "png";

/// Format label attached to video responses.
pub const VIDEO_FORMAT: &str = "mp4";

/// Body of `POST /api/text`.
#[derive(Debug, Clone, Deserialize)]
pub struct TextRequest {
    pub prompt: String,
    #[serde(default = "default_text_model")]
    pub model: String,
}

/// Body of `POST /api/image`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,
    #[serde(default = "default_image_width")]
    pub width: u32,
    #[serde(default = "default_image_height")]
    pub height: u32,
}

/// Body of `POST /api/video`.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoRequest {
    pub prompt: String,
    #[serde(default = "default_video_frames")]
    pub frames: u32,
}

/// Response of `POST /api/image`.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image_base64: String,
    pub format: &'static str,
}

/// Response of `POST /api/video`.
#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub video_base64: String,
    pub format: &'static str,
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_negative_prompt() -> String {
    DEFAULT_NEGATIVE_PROMPT.to_string()
}

fn default_image_width() -> u32 {
    DEFAULT_IMAGE_WIDTH
}

fn default_image_height() -> u32 {
    DEFAULT_IMAGE_HEIGHT
}

fn default_video_frames() -> u32 {
    DEFAULT_VIDEO_FRAMES
}
