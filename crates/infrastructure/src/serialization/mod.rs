//! Deterministic JSON for the session and configuration files.

mod json;

pub use json::*;
