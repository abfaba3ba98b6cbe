//! ComfyUI WebSocket and REST client library.
//!
//! Provides typed message parsing, the WebSocket connection, HTTP API
//! wrappers, history parsing, and the blocking [`executor::Executor`]
//! that drives one workflow from submission to downloaded artifacts.

pub mod api;
pub mod client;
pub mod executor;
pub mod history;
pub mod messages;
pub mod processor;
