//! Request handlers for the generation endpoints.
//!
//! Handlers validate nothing beyond what the `Json` extractor enforces,
//! delegate to the downstream clients, and map failures via [`crate::error::AppError`].

pub mod media;
pub mod text;
