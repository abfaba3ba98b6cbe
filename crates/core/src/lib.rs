//! Domain layer for the Kepler generation backend.
//!
//! Holds the request parameter types, the workflow template store, the
//! graph patcher, and the closed error enum shared by every other crate.

pub mod error;
pub mod generation;
pub mod workflow;
