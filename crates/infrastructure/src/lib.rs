//! Tokenwarden Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading and
//! logging setup for binaries.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod persistence;
pub mod serialization;

pub use adapters::{ReqwestTransport, SystemClock};
pub use config::{ConfigError, load_config, session_path};
pub use logging::{LogFormat, init_logging};
pub use persistence::{FileSessionRepository, default_session_path};
pub use serialization::{
    SerializationError, from_json, from_json_bytes, to_json_stable, to_json_stable_bytes,
};
