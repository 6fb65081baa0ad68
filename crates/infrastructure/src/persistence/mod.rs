//! File persistence adapters.

mod session_repository;

pub use session_repository::{FileSessionRepository, SESSION_FILE_NAME, default_session_path};
