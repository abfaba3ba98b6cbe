//! `kepler-supervisor` library crate.
//!
//! Starts the Python model services (ComfyUI, CogVideo) as child
//! processes, watches them, and stops them on shutdown. The binaries
//! live in `main.rs` (supervised, foreground) and `bin/launch.rs`
//! (fire-and-forget).

pub mod config;
pub mod error;
pub mod launcher;
pub mod liveness;
pub mod manager;
pub mod service;
pub mod signal;
